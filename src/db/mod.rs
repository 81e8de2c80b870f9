// src/db/mod.rs

//! Fetch ledger database
//!
//! This module handles all SQLite operations for the warm-run ledger:
//! - Database initialization and schema creation
//! - Connection management
//! - Transaction handling
//! - CRUD operations for runs and per-coordinate fetch records
//!
//! The ledger is opt-in: warming without one never touches SQLite.

pub mod models;
pub mod schema;

use crate::error::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

/// Initialize a ledger database at the specified path
///
/// Creates the database file and sets up the schema. This is idempotent;
/// calling it on an existing ledger is safe.
pub fn init(db_path: &str) -> Result<()> {
    debug!("Initializing ledger at: {}", db_path);

    if let Some(parent) = Path::new(db_path).parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::InitError(format!("Failed to create ledger directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )?;

    schema::migrate(&conn)?;

    info!("Ledger initialized at {}", db_path);
    Ok(())
}

/// Open an existing ledger database
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        return Err(Error::DatabaseNotFound(db_path.to_string()));
    }

    let conn = Connection::open(db_path)?;

    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )?;

    Ok(conn)
}

/// Open the ledger, initializing it first when missing
pub fn open_or_init(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        init(db_path)?;
    } else {
        // Schema may lag behind after an upgrade
        let conn = open(db_path)?;
        schema::migrate(&conn)?;
        return Ok(conn);
    }
    open(db_path)
}

/// Run a closure inside a transaction, committing on success
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&rusqlite::Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let result = f(&tx)?;
    tx.commit()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_init_creates_database() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();

        // Remove the temp file so init can create it
        drop(temp_file);

        let result = init(&db_path);
        assert!(result.is_ok());
        assert!(Path::new(&db_path).exists());
    }

    #[test]
    fn test_init_creates_parent_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir
            .path()
            .join("nested/path/ledger.db")
            .to_str()
            .unwrap()
            .to_string();

        assert!(init(&db_path).is_ok());
        assert!(Path::new(&db_path).exists());
    }

    #[test]
    fn test_open_nonexistent_database() {
        let result = open("/nonexistent/path/ledger.db");
        assert!(matches!(result, Err(Error::DatabaseNotFound(_))));
    }

    #[test]
    fn test_open_or_init_twice() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("ledger.db").to_str().unwrap().to_string();

        drop(open_or_init(&db_path).unwrap());
        let conn = open_or_init(&db_path).unwrap();
        let result: i32 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(result, 1);
    }

    #[test]
    fn test_transaction_commits() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("ledger.db").to_str().unwrap().to_string();
        init(&db_path).unwrap();

        let mut conn = open(&db_path).unwrap();
        transaction(&mut conn, |tx| {
            tx.execute(
                "INSERT INTO runs (started_at, status, total, fetched) VALUES ('now', 'completed', 0, 0)",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
