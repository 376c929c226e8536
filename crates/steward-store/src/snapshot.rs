// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only listing over a separate connection.
//!
//! WAL mode lets readers proceed while the worker writes. A listing reflects
//! the last committed state and may trail commands still in the queue.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use steward_core::{StewardError, User};

use crate::database::classify;
use crate::handlers::{USER_COLUMNS, user_from_row};

/// All active accounts ordered by creation time.
pub fn list_active_users(db_path: &Path) -> Result<Vec<User>, StewardError> {
    if !db_path.exists() {
        return Err(StewardError::StoreUnavailable {
            reason: format!("database not found: {}", db_path.display()),
        });
    }
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(classify)?;

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_deleted = 0 ORDER BY created_at, login"
        ))
        .map_err(classify)?;
    let users = stmt
        .query_map([], user_from_row)
        .map_err(classify)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(classify)?;
    Ok(users)
}

/// [`list_active_users`] on the blocking pool.
pub async fn list_active_users_async(db_path: PathBuf) -> Result<Vec<User>, StewardError> {
    tokio::task::spawn_blocking(move || list_active_users(&db_path))
        .await
        .map_err(|e| StewardError::Internal(format!("listing task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_database_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_active_users(&dir.path().join("absent.db")).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn lists_only_active_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");
        let mut conn = Connection::open(&path).unwrap();
        crate::migrations::run_migrations(&mut conn).unwrap();
        conn.execute_batch(
            "INSERT INTO users (login, password_hash, phone) VALUES ('a', 'h', '1');
             INSERT INTO users (login, password_hash, phone, is_deleted) VALUES ('b', 'h', '2', 1);
             INSERT INTO users (login, password_hash, phone) VALUES ('c', 'h', '3');",
        )
        .unwrap();
        drop(conn);

        let logins: Vec<String> = list_active_users(&path)
            .unwrap()
            .into_iter()
            .map(|u| u.login)
            .collect();
        assert_eq!(logins, ["a", "c"]);
    }
}
