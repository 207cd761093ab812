//! Forward-only schema upgrades for the ticket store.
//!
//! `PRAGMA user_version` is the source of truth; `store_meta.schema_version`
//! mirrors it for anything that reads the store with plain SQL.

use super::schema;
use rusqlite::{Connection, types::Type};

/// Schema version a freshly migrated store ends up at.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

const MIGRATIONS: &[(u32, &str)] = &[(1, schema::MIGRATION_V1_SQL), (2, schema::MIGRATION_V2_SQL)];

/// Schema version the store is currently at. Zero means an empty file.
///
/// # Errors
///
/// Fails on a query error or a negative `user_version`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(version).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(error))
    })
}

/// Bring the store up to [`LATEST_SCHEMA_VERSION`] and return the version
/// reached.
///
/// Every step commits together with its version bump, so a failure leaves
/// the store at the last completed step.
///
/// # Errors
///
/// Fails if a step's DDL or bookkeeping write fails.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let from = current_schema_version(conn)?;
    let pending = MIGRATIONS.iter().filter(|(version, _)| *version > from);

    let mut reached = from;
    for &(version, sql) in pending {
        let step = i64::from(version);
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", step)?;
        tx.execute("UPDATE store_meta SET schema_version = ?1 WHERE id = 1", [step])?;
        tx.commit()?;
        tracing::debug!(from, version, "ticket store migrated");
        reached = version;
    }

    Ok(reached)
}
