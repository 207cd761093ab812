//! SQLite ticket store utilities.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so readers never block the single writer
//! - `busy_timeout` from `[store]` config (5s default) to ride out lock waits
//! - `foreign_keys = ON` so tickets and messages always reference real actors

pub mod actors;
pub mod migrations;
pub mod schema;
pub mod tickets;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

use crate::error::DeskError;

/// Busy timeout used when no configuration overrides it.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the ticket store, apply runtime pragmas, and migrate the
/// schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_store(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open ticket store {}", path.display()))?;

    configure_connection(&conn, busy_timeout).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;

    Ok(conn)
}

/// Private in-memory store, fully migrated.
///
/// # Errors
///
/// Returns an error if configuring or migrating the database fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory store")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;
    Ok(conn)
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}

/// Timestamps are stored as microseconds since the Unix epoch.
pub(crate) const fn to_us(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

pub(crate) fn from_us(field: &'static str, us: i64) -> Result<DateTime<Utc>, DeskError> {
    DateTime::from_timestamp_micros(us).ok_or_else(|| DeskError::CorruptRecord {
        field,
        value: us.to_string(),
    })
}

pub(crate) fn opt_from_us(
    field: &'static str,
    us: Option<i64>,
) -> Result<Option<DateTime<Utc>>, DeskError> {
    us.map(|us| from_us(field, us)).transpose()
}

/// Parse a stored enum value, reporting unreadable text as corruption.
pub(crate) fn parse_stored<T: std::str::FromStr>(
    field: &'static str,
    raw: String,
) -> Result<T, DeskError> {
    raw.parse()
        .map_err(|_| DeskError::CorruptRecord { field, value: raw })
}

/// Counters are stored as SQLite integers.
pub(crate) fn to_count(field: &'static str, raw: i64) -> Result<u32, DeskError> {
    u32::try_from(raw).map_err(|_| DeskError::CorruptRecord {
        field,
        value: raw.to_string(),
    })
}
