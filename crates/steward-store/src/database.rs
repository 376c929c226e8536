// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle and SQLite error classification.
//!
//! The worker owns the only read-write connection. It is opened here, tuned
//! with PRAGMAs, migrated, and on shutdown checkpointed and closed.

use std::path::Path;
use std::time::Duration;

use rusqlite::ErrorCode;
use steward_core::{StewardError, UniqueField};
use tracing::{debug, warn};

use crate::migrations;

/// SQLite expression producing the current UTC time in the stored text format.
pub(crate) const SQL_NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// Open (creating if needed) the database at `path` and bring the schema up to date.
pub async fn open(path: &Path, wal_mode: bool) -> Result<tokio_rusqlite::Connection, StewardError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StewardError::StoreUnavailable {
            reason: format!("cannot create {}: {e}", parent.display()),
        })?;
    }

    let conn = tokio_rusqlite::Connection::open(path)
        .await
        .map_err(|e| StewardError::StoreUnavailable {
            reason: format!("cannot open {}: {e}", path.display()),
        })?;

    conn.call(move |conn| -> Result<(), StewardError> {
        configure(conn, wal_mode).map_err(classify)?;
        migrations::run_migrations(conn)
    })
    .await
    .map_err(map_tr_err)?;

    debug!(path = %path.display(), wal_mode, "database opened");
    Ok(conn)
}

fn configure(conn: &mut rusqlite::Connection, wal_mode: bool) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    if wal_mode {
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            warn!(mode = %mode, "database refused WAL journal mode");
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
    }
    Ok(())
}

/// Flush the WAL into the main file and close the connection.
pub async fn close(conn: tokio_rusqlite::Connection) -> Result<(), StewardError> {
    conn.call(|conn| -> Result<(), StewardError> {
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            .map_err(classify)
    })
    .await
    .map_err(map_tr_err)?;
    debug!("WAL checkpoint complete");

    conn.close().await.map_err(|e| StewardError::Storage {
        source: Box::new(e),
    })
}

/// Flatten a tokio-rusqlite error whose payload is already a `StewardError`.
///
/// Anything other than an application error means the background thread is
/// gone and the store cannot serve further commands.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<StewardError>) -> StewardError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        tokio_rusqlite::Error::ConnectionClosed => StewardError::StoreUnavailable {
            reason: "database connection closed".into(),
        },
        other => StewardError::StoreUnavailable {
            reason: format!("database connection failed: {other}"),
        },
    }
}

/// Map a SQLite error onto the crate error taxonomy.
///
/// Unique-constraint failures on `users` become [`StewardError::Conflict`]
/// naming the column. Corruption and I/O failures mean the connection is no
/// longer usable and become [`StewardError::StoreUnavailable`].
pub fn classify(err: rusqlite::Error) -> StewardError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        match failure.code {
            ErrorCode::ConstraintViolation => {
                if let Some(field) = message.as_deref().and_then(unique_field) {
                    return StewardError::Conflict { field };
                }
            }
            ErrorCode::DatabaseCorrupt
            | ErrorCode::NotADatabase
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure => {
                return StewardError::StoreUnavailable {
                    reason: err.to_string(),
                };
            }
            _ => {}
        }
    }
    StewardError::Storage {
        source: Box::new(err),
    }
}

/// Parse `UNIQUE constraint failed: users.phone` into the offending field.
fn unique_field(message: &str) -> Option<UniqueField> {
    let columns = message.strip_prefix("UNIQUE constraint failed: ")?;
    columns.split(',').find_map(|column| match column.trim() {
        "users.login" => Some(UniqueField::Login),
        "users.phone" => Some(UniqueField::Phone),
        "users.iin" => Some(UniqueField::Iin),
        _ => None,
    })
}
