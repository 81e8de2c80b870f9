// src/warmer/tool.rs

//! External fetch-tool invocation
//!
//! Runs a coursier-style dependency fetch tool once per coordinate, passing
//! the repository list and forced-version pins as flags. The child's exit
//! status is the sole success signal observed; its output is captured and
//! only surfaced at debug level (or in the failure reason).
//!
//! All process-level state the tool sees is explicit in `FetchConfig`:
//! working directory and credential variables are configured, never inherited
//! ambiently from the warmer's own environment by this module.

use crate::coordinate::ArtifactCoordinate;
use crate::error::{Error, Result};
use crate::overrides::OverrideSet;
use crate::repository::RepositorySource;
use crate::warmer::{FetchOutcome, Fetcher};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Explicit configuration for the external fetch tool
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Tool executable (e.g. `coursier`)
    pub tool: PathBuf,
    /// Arguments placed before the coordinate (e.g. `["fetch"]`)
    pub base_args: Vec<String>,
    /// Ordered repository sources, passed as repeated `--repository` flags
    pub repositories: Vec<RepositorySource>,
    /// Forced pins, passed as repeated `--force-version` flags
    pub overrides: OverrideSet,
    /// Working directory for the child process
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables (credentials) set on the child
    pub env: Vec<(String, String)>,
}

impl FetchConfig {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            base_args: vec!["fetch".to_string()],
            repositories: Vec::new(),
            overrides: OverrideSet::default(),
            working_dir: None,
            env: Vec::new(),
        }
    }
}

/// Fetcher that shells out to the configured tool
pub struct ToolFetcher {
    config: FetchConfig,
}

impl ToolFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, coordinate: &ArtifactCoordinate) -> Command {
        let mut cmd = Command::new(&self.config.tool);
        cmd.args(&self.config.base_args);

        for repo in &self.config.repositories {
            cmd.arg("--repository").arg(repo.as_flag_value());
        }
        for (module, version) in self.config.overrides.iter() {
            cmd.arg("--force-version")
                .arg(format!("{}:{}", module, version));
        }
        cmd.arg(coordinate.to_string());

        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl Fetcher for ToolFetcher {
    fn fetch(&self, coordinate: &ArtifactCoordinate) -> Result<FetchOutcome> {
        let mut cmd = self.build_command(coordinate);
        debug!("Running {:?}", cmd);

        let output = cmd.output().map_err(|e| Error::FetchFailure {
            coordinate: coordinate.to_string(),
            reason: format!("Failed to run {}: {}", self.config.tool.display(), e),
        })?;

        debug!(
            "{} exited with {} ({} bytes stdout, {} bytes stderr)",
            self.config.tool.display(),
            output.status,
            output.stdout.len(),
            output.stderr.len()
        );

        if output.status.success() {
            // The tool owns the cache location; nothing more to report
            Ok(FetchOutcome::default())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().last().unwrap_or("").trim().to_string();
            Err(Error::FetchFailure {
                coordinate: coordinate.to_string(),
                reason: if detail.is_empty() {
                    format!("{} exited with {}", self.config.tool.display(), output.status)
                } else {
                    format!(
                        "{} exited with {}: {}",
                        self.config.tool.display(),
                        output.status,
                        detail
                    )
                },
            })
        }
    }
}
