use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("incompatible schema for {name}: stored version {found}, expected {expected}")]
    VersionMismatch {
        name: String,
        found: u32,
        expected: u32,
    },
}

pub fn stored_version(conn: &Connection, key: &str) -> Result<Option<u32>> {
    conn.query_row(
        "SELECT version FROM _version WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("Failed to read stored version for {key}"))
}

pub fn stamp_version(conn: &Connection, key: &str, version: u32) -> Result<()> {
    conn.execute(
        "INSERT INTO _version (key, version) VALUES (?1, ?2)
         ON CONFLICT(key)
         DO UPDATE SET version=excluded.version",
        params![key, version],
    )
    .with_context(|| format!("Failed to record version for {key}"))?;

    Ok(())
}

pub fn check_version(conn: &Connection, key: &str, expected: u32) -> Result<()> {
    match stored_version(conn, key)? {
        None => stamp_version(conn, key, expected),
        Some(found) if found == expected => Ok(()),
        Some(found) => Err(SchemaError::VersionMismatch {
            name: key.to_string(),
            found,
            expected,
        }
        .into()),
    }
}
