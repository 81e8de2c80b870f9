// src/error.rs

use thiserror::Error;

/// Core error types for Prewarm
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O failure with context
    #[error("I/O error: {0}")]
    IoError(String),

    /// Initialization failure (ledger, HTTP client)
    #[error("Failed to initialize: {0}")]
    InitError(String),

    /// Ledger database not found
    #[error("Ledger database not found at path: {0}")]
    DatabaseNotFound(String),

    /// Malformed input (coordinate string, catalog, deps file, timestamp)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Two different pinned versions for one coordinate with no override
    #[error(
        "Version conflict for {coordinate}: declared as {versions:?} (suggested pin: {suggested})"
    )]
    VersionConflict {
        coordinate: String,
        versions: Vec<String>,
        suggested: String,
    },

    /// The fetch of a single coordinate failed; aborts the whole run
    #[error("Failed to fetch {coordinate}: {reason}")]
    FetchFailure { coordinate: String, reason: String },

    /// Remote download failure
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Artifact not found in any configured repository source
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Downloaded artifact checksum does not match
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Precondition violation (missing BUCK file, lib dir outside project)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias using Prewarm's Error type
pub type Result<T> = std::result::Result<T, Error>;
