//! Database connection setup
//!
//! Each collection owns a pool, so the source and destination collections
//! may live in separate database files. The source database belongs to
//! someone else and is only ever opened read-only.

use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Busy timeout set on every pooled connection. This is the only timeout
/// policy in the service; store calls that wait longer fail with a database error.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Open (or create) the database file at `db_path` for reading and writing
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // WAL lets the query endpoint read while a transfer is writing
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    Ok(pool)
}

/// Open an existing database file read-only.
///
/// Never creates the file: a wrong path fails here instead of showing up
/// later as an empty store.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.is_file() {
        return Err(Error::Config(format!(
            "Database not found: {}",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .read_only(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    info!("Opened database (read-only): {}", db_path.display());
    Ok(pool)
}

/// Open a private in-memory database.
///
/// Limited to a single connection that is never recycled: every SQLite
/// in-memory connection is its own database, and it vanishes when that
/// connection closes.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}
