// src/db/models.rs

//! Data models for ledger entities
//!
//! Rust structs corresponding to the ledger tables, with methods for
//! creating, reading, and updating records.

use crate::error::Result;
use crate::warmer::{EntryState, WarmReport, WarmStatus};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::str::FromStr;

/// Get current timestamp as RFC 3339 string
pub fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Outcome of a recorded run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Aborted,
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Aborted => "aborted",
        }
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "aborted" => Ok(RunStatus::Aborted),
            _ => Err(format!("Invalid run status: {}", s)),
        }
    }
}

/// One warm invocation
#[derive(Debug, Clone)]
pub struct Run {
    pub id: Option<i64>,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub total: i64,
    pub fetched: i64,
}

impl Run {
    /// Create a new in-progress run over `total` coordinates
    pub fn new(total: i64) -> Self {
        Self {
            id: None,
            started_at: current_timestamp(),
            finished_at: None,
            status: RunStatus::Running,
            total,
            fetched: 0,
        }
    }

    /// Insert this run into the ledger
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO runs (started_at, finished_at, status, total, fetched)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &self.started_at,
                &self.finished_at,
                self.status.as_str(),
                self.total,
                self.fetched,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Mark the run finished and persist the final counters
    pub fn finish(&mut self, conn: &Connection, status: RunStatus, fetched: i64) -> Result<()> {
        self.finished_at = Some(current_timestamp());
        self.status = status;
        self.fetched = fetched;
        conn.execute(
            "UPDATE runs SET finished_at = ?1, status = ?2, fetched = ?3 WHERE id = ?4",
            params![
                &self.finished_at,
                self.status.as_str(),
                self.fetched,
                self.id,
            ],
        )?;
        Ok(())
    }

    /// Find a run by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, started_at, finished_at, status, total, fetched FROM runs WHERE id = ?1",
        )?;
        let run = stmt.query_row([id], Self::from_row).optional()?;
        Ok(run)
    }

    /// List runs, most recent first
    pub fn list_recent(conn: &Connection, limit: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, started_at, finished_at, status, total, fetched
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;
        let runs = stmt
            .query_map([limit], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status_str: String = row.get(3)?;
        Ok(Self {
            id: Some(row.get(0)?),
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            status: status_str.parse().map_err(|e: String| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    e.into(),
                )
            })?,
            total: row.get(4)?,
            fetched: row.get(5)?,
        })
    }
}

/// One attempted coordinate within a run
#[derive(Debug, Clone)]
pub struct FetchRecord {
    pub id: Option<i64>,
    pub run_id: i64,
    pub coordinate: String,
    pub status: String,
    pub sha256: Option<String>,
    pub cached_path: Option<String>,
    pub fetched_at: String,
}

impl FetchRecord {
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO fetch_records (run_id, coordinate, status, sha256, cached_path, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.run_id,
                &self.coordinate,
                &self.status,
                &self.sha256,
                &self.cached_path,
                &self.fetched_at,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Records for one run, in insertion (input) order
    pub fn find_by_run(conn: &Connection, run_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, run_id, coordinate, status, sha256, cached_path, fetched_at
             FROM fetch_records WHERE run_id = ?1 ORDER BY id",
        )?;
        let records = stmt
            .query_map([run_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            run_id: row.get(1)?,
            coordinate: row.get(2)?,
            status: row.get(3)?,
            sha256: row.get(4)?,
            cached_path: row.get(5)?,
            fetched_at: row.get(6)?,
        })
    }
}

/// Persist a finished warm report under an already-inserted run
///
/// Writes one record per attempted entry (cached or aborted); entries never
/// attempted stay out of the ledger, mirroring the fail-fast semantics.
pub fn record_report(conn: &Connection, run: &mut Run, report: &WarmReport) -> Result<()> {
    let run_id = run.id.expect("run must be inserted before recording");

    for entry in &report.entries {
        let status = match entry.state {
            EntryState::Pending => continue,
            EntryState::Cached => "cached",
            EntryState::Aborted => "aborted",
        };
        let mut record = FetchRecord {
            id: None,
            run_id,
            coordinate: entry.coordinate.clone(),
            status: status.to_string(),
            sha256: entry.sha256.clone(),
            cached_path: entry
                .cached_path
                .as_ref()
                .map(|p| p.display().to_string()),
            fetched_at: current_timestamp(),
        };
        record.insert(conn)?;
    }

    let status = match report.status {
        WarmStatus::Completed => RunStatus::Completed,
        WarmStatus::Aborted { .. } => RunStatus::Aborted,
    };
    run.finish(conn, status, report.fetched_count() as i64)
}
