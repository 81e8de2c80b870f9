// src/warmer/mod.rs

//! Sequential cache warming
//!
//! The warmer walks an ordered coordinate list and asks a `Fetcher` to
//! materialize each artifact in the local cache, one at a time, in input
//! order. The first failure aborts the whole run: remaining entries are
//! never attempted. A partially warmed cache is acceptable to abandon;
//! silently continuing with gaps is not.
//!
//! Per-entry state machine: `Pending -> {Cached, Aborted}`. Aborted is
//! terminal for the run, not just for the entry.

pub mod direct;
pub mod tool;

use crate::coordinate::ArtifactCoordinate;
use crate::error::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

/// What a fetcher can report about a single materialized artifact
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Where the artifact landed, when the fetcher knows
    pub cached_path: Option<PathBuf>,
    /// SHA-256 of the cached artifact, when the fetcher computes it
    pub sha256: Option<String>,
    /// The artifact was already present and verified; nothing was fetched
    pub already_cached: bool,
}

/// One fetch attempt per coordinate; exit signal is success or error
pub trait Fetcher {
    fn fetch(&self, coordinate: &ArtifactCoordinate) -> Result<FetchOutcome>;
}

/// State of one warm entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    /// Not yet attempted (terminal only when an earlier entry aborted the run)
    Pending,
    /// Fetched (or verified already present) in the cache
    Cached,
    /// The fetch failed; the run stopped here
    Aborted,
}

/// Per-coordinate record in a warm report
#[derive(Debug, Clone, Serialize)]
pub struct WarmEntry {
    pub coordinate: String,
    pub state: EntryState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub already_cached: bool,
}

/// Run-level outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WarmStatus {
    /// Every coordinate is cached
    Completed,
    /// The run stopped at `coordinate`
    Aborted { coordinate: String, reason: String },
}

/// Ordered log of a warm run
#[derive(Debug, Serialize)]
pub struct WarmReport {
    pub entries: Vec<WarmEntry>,
    #[serde(flatten)]
    pub status: WarmStatus,
}

impl WarmReport {
    /// Coordinates that reached the cache, in input order
    pub fn fetched(&self) -> impl Iterator<Item = &WarmEntry> {
        self.entries
            .iter()
            .filter(|e| e.state == EntryState::Cached)
    }

    pub fn fetched_count(&self) -> usize {
        self.fetched().count()
    }

    pub fn is_completed(&self) -> bool {
        self.status == WarmStatus::Completed
    }

    /// Map the run outcome to a process-level result
    pub fn into_result(self) -> Result<Self> {
        match &self.status {
            WarmStatus::Completed => Ok(self),
            WarmStatus::Aborted { coordinate, reason } => Err(Error::FetchFailure {
                coordinate: coordinate.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Sequential fail-fast warm loop over a fetcher
pub struct CacheWarmer<'a> {
    fetcher: &'a dyn Fetcher,
}

impl<'a> CacheWarmer<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self { fetcher }
    }

    /// Warm the cache for every coordinate, in order, stopping at the first
    /// failure
    pub fn run(&self, coordinates: &[ArtifactCoordinate]) -> WarmReport {
        let mut entries: Vec<WarmEntry> = coordinates
            .iter()
            .map(|coord| WarmEntry {
                coordinate: coord.to_string(),
                state: EntryState::Pending,
                cached_path: None,
                sha256: None,
                already_cached: false,
            })
            .collect();

        let total = coordinates.len();
        for (idx, coord) in coordinates.iter().enumerate() {
            info!("[{}/{}] Fetching {}", idx + 1, total, coord);

            match self.fetcher.fetch(coord) {
                Ok(outcome) => {
                    let entry = &mut entries[idx];
                    entry.state = EntryState::Cached;
                    entry.cached_path = outcome.cached_path;
                    entry.sha256 = outcome.sha256;
                    entry.already_cached = outcome.already_cached;
                    if outcome.already_cached {
                        info!("[{}/{}] Already cached: {}", idx + 1, total, coord);
                    } else {
                        info!("[{}/{}] Fetched {}", idx + 1, total, coord);
                    }
                }
                Err(e) => {
                    let reason = e.to_string();
                    error!("Fetch failed for {}: {}", coord, reason);
                    entries[idx].state = EntryState::Aborted;
                    return WarmReport {
                        entries,
                        status: WarmStatus::Aborted {
                            coordinate: coord.to_string(),
                            reason,
                        },
                    };
                }
            }
        }

        info!("All {} artifacts fetched", total);
        WarmReport {
            entries,
            status: WarmStatus::Completed,
        }
    }
}
