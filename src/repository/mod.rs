// src/repository/mod.rs

//! Repository sources and artifact downloading
//!
//! This module provides functionality for:
//! - Describing the ordered list of places an artifact may be found
//! - Downloading artifacts from remote mirrors with retry and timeout
//! - Computing and verifying artifact checksums
//!
//! Source order is significant: local filesystem caches come before remote
//! mirrors so that a warm machine never touches the network.

use crate::coordinate::ArtifactCoordinate;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for failed downloads
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// One place artifacts may be found
///
/// Local sources are plain Maven-layout directories; remote sources are
/// repository base URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySource {
    Local(PathBuf),
    Remote(String),
}

impl RepositorySource {
    pub fn is_local(&self) -> bool {
        matches!(self, RepositorySource::Local(_))
    }

    /// Full location of an artifact within this source
    pub fn artifact_location(&self, coord: &ArtifactCoordinate) -> String {
        let relative = coord.repository_path();
        match self {
            RepositorySource::Local(dir) => dir.join(&relative).display().to_string(),
            RepositorySource::Remote(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                relative.display()
            ),
        }
    }

    /// CLI flag form of this source, as a fetch tool expects it
    pub fn as_flag_value(&self) -> String {
        match self {
            RepositorySource::Local(dir) => dir.display().to_string(),
            RepositorySource::Remote(url) => url.clone(),
        }
    }
}

impl FromStr for RepositorySource {
    type Err = Error;

    /// Anything that looks like a URL is remote; everything else is a local path
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::ParseError("Empty repository source".to_string()));
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(RepositorySource::Remote(s.to_string()))
        } else if s.starts_with("file://") {
            Ok(RepositorySource::Local(PathBuf::from(
                s.trim_start_matches("file://"),
            )))
        } else {
            Ok(RepositorySource::Local(PathBuf::from(s)))
        }
    }
}

impl std::fmt::Display for RepositorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositorySource::Local(dir) => write!(f, "{}", dir.display()),
            RepositorySource::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// HTTP client wrapper with retry support
pub struct RepositoryClient {
    client: Client,
    max_retries: u32,
}

impl RepositoryClient {
    /// Create a new repository client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Download a file to the specified path with retry support
    ///
    /// Writes to a temporary sibling first and renames into place, so a
    /// half-written artifact never lands in the cache.
    pub fn download_file(&self, url: &str, dest_path: &Path) -> Result<()> {
        info!("Downloading {} to {}", url, dest_path.display());

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::IoError(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(mut response) => {
                    if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Err(Error::NotFoundError(format!("HTTP 404 from {}", url)));
                    }
                    if !response.status().is_success() {
                        return Err(Error::DownloadError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }

                    let temp_path = dest_path.with_extension("tmp");
                    let mut file = File::create(&temp_path).map_err(|e| {
                        Error::IoError(format!(
                            "Failed to create file {}: {}",
                            temp_path.display(),
                            e
                        ))
                    })?;

                    io::copy(&mut response, &mut file).map_err(|e| {
                        Error::IoError(format!("Failed to write downloaded data: {}", e))
                    })?;

                    fs::rename(&temp_path, dest_path).map_err(|e| {
                        Error::IoError(format!(
                            "Failed to move {} to {}: {}",
                            temp_path.display(),
                            dest_path.display(),
                            e
                        ))
                    })?;

                    debug!("Successfully downloaded to {}", dest_path.display());
                    return Ok(());
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::DownloadError(format!(
                            "Failed to download after {} attempts: {}",
                            attempt, e
                        )));
                    }
                    warn!("Download attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }
}

impl Default for RepositoryClient {
    fn default() -> Self {
        Self::new().expect("Failed to create default repository client")
    }
}

/// Compute the SHA-256 digest of a file as a lowercase hex string
pub fn sha256_file(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};

    let mut file = File::open(path)
        .map_err(|e| Error::IoError(format!("Failed to open file for checksum: {}", e)))?;

    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| Error::IoError(format!("Failed to read file for checksum: {}", e)))?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify file checksum matches expected value
pub fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    debug!("Verifying checksum for {}", path.display());

    let actual = sha256_file(path)?;
    if actual != expected {
        return Err(Error::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        });
    }

    debug!("Checksum verified: {}", expected);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parsing() {
        assert_eq!(
            "https://maven.google.com".parse::<RepositorySource>().unwrap(),
            RepositorySource::Remote("https://maven.google.com".to_string())
        );
        assert_eq!(
            "/home/user/.m2/repository".parse::<RepositorySource>().unwrap(),
            RepositorySource::Local(PathBuf::from("/home/user/.m2/repository"))
        );
        assert_eq!(
            "file:///opt/mirror".parse::<RepositorySource>().unwrap(),
            RepositorySource::Local(PathBuf::from("/opt/mirror"))
        );
        assert!("".parse::<RepositorySource>().is_err());
    }

    #[test]
    fn test_remote_artifact_location() {
        let source = RepositorySource::Remote("https://maven.google.com/".to_string());
        let coord: ArtifactCoordinate = "androidx.collection:collection:1.5.0".parse().unwrap();
        assert_eq!(
            source.artifact_location(&coord),
            "https://maven.google.com/androidx/collection/collection/1.5.0/collection-1.5.0.jar"
        );
    }

    #[test]
    fn test_local_artifact_location() {
        let source = RepositorySource::Local(PathBuf::from("/mirror"));
        let coord: ArtifactCoordinate = "a.b:c:1.0".parse().unwrap();
        assert_eq!(
            source.artifact_location(&coord),
            "/mirror/a/b/c/1.0/c-1.0.jar"
        );
    }

    #[test]
    fn test_sha256_and_verify() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.jar");
        fs::write(&path, b"artifact bytes").unwrap();

        let digest = sha256_file(&path).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(verify_checksum(&path, &digest).is_ok());

        let result = verify_checksum(&path, "deadbeef");
        assert!(matches!(result, Err(Error::ChecksumMismatch { .. })));
    }
}
