// src/warmer/direct.rs

//! Built-in fetcher
//!
//! Resolves artifacts without an external tool by searching the configured
//! repository sources in order: local Maven-layout directories are copied,
//! remote mirrors downloaded. The cache mirrors the same layout, and every
//! fetched artifact gets a `.sha256` sidecar so a rerun can verify the cache
//! and no-op instead of fetching again.

use crate::coordinate::{ArtifactCoordinate, Packaging};
use crate::error::{Error, Result};
use crate::repository::{self, RepositoryClient, RepositorySource};
use crate::warmer::{FetchOutcome, Fetcher};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fetcher backed by the ordered source list
pub struct DirectFetcher {
    sources: Vec<RepositorySource>,
    cache_dir: PathBuf,
    client: RepositoryClient,
}

impl DirectFetcher {
    pub fn new(sources: Vec<RepositorySource>, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::InitError(
                "At least one repository source is required".to_string(),
            ));
        }
        Ok(Self {
            sources,
            cache_dir: cache_dir.into(),
            client: RepositoryClient::new()?,
        })
    }

    fn sidecar_path(dest: &Path) -> PathBuf {
        let mut name = dest.file_name().unwrap_or_default().to_os_string();
        name.push(".sha256");
        dest.with_file_name(name)
    }

    /// Verify an already-cached artifact against its checksum sidecar
    ///
    /// Returns true when the artifact is present and matches; a missing or
    /// mismatching sidecar means the artifact must be fetched again.
    fn verify_cached(dest: &Path) -> bool {
        if !dest.is_file() {
            return false;
        }
        let sidecar = Self::sidecar_path(dest);
        let Ok(expected) = fs::read_to_string(&sidecar) else {
            return false;
        };
        match repository::verify_checksum(dest, expected.trim()) {
            Ok(()) => true,
            Err(e) => {
                warn!("Stale cache entry {}: {}", dest.display(), e);
                false
            }
        }
    }

    /// Copy or download one file from a single source into the cache
    fn fetch_from_source(
        &self,
        source: &RepositorySource,
        relative: &Path,
        dest: &Path,
    ) -> Result<()> {
        match source {
            RepositorySource::Local(dir) => {
                let candidate = dir.join(relative);
                if !candidate.is_file() {
                    return Err(Error::NotFoundError(format!(
                        "{} not present in {}",
                        relative.display(),
                        dir.display()
                    )));
                }
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&candidate, dest).map_err(|e| {
                    Error::IoError(format!(
                        "Failed to copy {} to {}: {}",
                        candidate.display(),
                        dest.display(),
                        e
                    ))
                })?;
                Ok(())
            }
            RepositorySource::Remote(base) => {
                let url = format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    relative.display()
                );
                self.client.download_file(&url, dest)
            }
        }
    }

    /// Try every source in order; first hit wins
    fn fetch_file(&self, relative: &Path, dest: &Path) -> Result<()> {
        let mut last_err = None;
        for source in &self.sources {
            debug!("Trying {} for {}", source, relative.display());
            match self.fetch_from_source(source, relative, dest) {
                Ok(()) => return Ok(()),
                Err(e @ Error::NotFoundError(_)) => {
                    debug!("{}", e);
                    last_err = Some(e);
                }
                Err(e) => {
                    warn!("Source {} failed for {}: {}", source, relative.display(), e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            Error::NotFoundError(format!("{} not found in any source", relative.display()))
        }))
    }

    /// Fetch the companion POM for a non-POM artifact
    ///
    /// POMs feed later offline resolution (and override patching), but a
    /// repository without one is common enough that absence is not fatal.
    fn fetch_companion_pom(&self, coord: &ArtifactCoordinate) {
        if coord.packaging == Packaging::Pom {
            return;
        }
        let mut pom_coord = coord.clone();
        pom_coord.packaging = Packaging::Pom;
        let relative = pom_coord.repository_path();
        let dest = self.cache_dir.join(&relative);
        if Self::verify_cached(&dest) {
            return;
        }
        match self.fetch_file(&relative, &dest) {
            Ok(()) => {
                if let Err(e) = self.write_sidecar(&dest) {
                    warn!("Failed to write checksum for {}: {}", dest.display(), e);
                }
            }
            Err(e) => debug!("No POM for {}: {}", coord, e),
        }
    }

    fn write_sidecar(&self, dest: &Path) -> Result<String> {
        let digest = repository::sha256_file(dest)?;
        fs::write(Self::sidecar_path(dest), format!("{}\n", digest))?;
        Ok(digest)
    }
}

impl Fetcher for DirectFetcher {
    fn fetch(&self, coordinate: &ArtifactCoordinate) -> Result<FetchOutcome> {
        let relative = coordinate.repository_path();
        let dest = self.cache_dir.join(&relative);

        if Self::verify_cached(&dest) {
            debug!("Cache hit for {}", coordinate);
            let digest = repository::sha256_file(&dest)?;
            return Ok(FetchOutcome {
                cached_path: Some(dest),
                sha256: Some(digest),
                already_cached: true,
            });
        }

        self.fetch_file(&relative, &dest)
            .map_err(|e| Error::FetchFailure {
                coordinate: coordinate.to_string(),
                reason: e.to_string(),
            })?;
        let digest = self.write_sidecar(&dest)?;

        self.fetch_companion_pom(coordinate);

        Ok(FetchOutcome {
            cached_path: Some(dest),
            sha256: Some(digest),
            already_cached: false,
        })
    }
}
