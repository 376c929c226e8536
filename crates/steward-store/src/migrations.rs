// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! The SQL files under `migrations/` are compiled in with `embed_migrations!`
//! and applied every time the store opens. Every statement is idempotent, so
//! opening a database created by an older build is safe.

use steward_core::StewardError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply all pending migrations, recording them in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), StewardError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| StewardError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        tracing::debug!(name = migration.name(), version = migration.version(), "migration applied");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &rusqlite::Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn creates_users_and_reset_tokens() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        let tables = table_names(&conn);
        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"reset_tokens".to_string()));
    }

    #[test]
    fn rerunning_is_a_no_op() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM refinery_schema_history", [], |r| r.get(0))
            .unwrap();
        assert_eq!(applied, 2);
    }

    #[test]
    fn created_at_defaults_to_utc_millis() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO users (login, password_hash, phone) VALUES ('a', 'h', '1')",
            [],
        )
        .unwrap();
        let created: String = conn
            .query_row("SELECT created_at FROM users", [], |r| r.get(0))
            .unwrap();
        // 2026-01-01T00:00:00.000Z
        assert_eq!(created.len(), 24);
        assert!(created.ends_with('Z'));
    }
}
