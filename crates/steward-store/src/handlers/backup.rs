// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Online backup of the live database.
//!
//! The copy is taken through the worker's own connection with SQLite's
//! backup API. Because the worker runs one command at a time, the snapshot
//! reflects exactly the commands dequeued before it.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use steward_core::StewardError;
use tracing::info;

use super::HandlerError;
use crate::command::{CommandKind, Reply, Request};
use crate::dispatch::HandlerContext;

const PAGES_PER_STEP: std::os::raw::c_int = 100;
const MAX_NOTE_LEN: usize = 64;

pub(super) fn backup(
    conn: &mut Connection,
    ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::Backup { note } = request else {
        return Err(HandlerError::mismatch(CommandKind::Backup));
    };

    std::fs::create_dir_all(&ctx.backup_dir).map_err(|e| StewardError::Storage {
        source: Box::new(e),
    })?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut attempt = 1;
    let dest = loop {
        let candidate = ctx
            .backup_dir
            .join(backup_file_name(&stamp, note.as_deref(), attempt));
        if !candidate.exists() {
            break candidate;
        }
        attempt += 1;
    };

    if let Err(e) = copy_into(conn, &dest) {
        let _ = std::fs::remove_file(&dest);
        return Err(StewardError::Storage {
            source: Box::new(e),
        }
        .into());
    }

    let bytes = std::fs::metadata(&dest).map(|m| m.len()).unwrap_or(0);
    info!(path = %dest.display(), bytes, "backup written");
    Ok(Reply::Backup(dest))
}

fn copy_into(src: &Connection, dest: &Path) -> rusqlite::Result<()> {
    let mut dst = Connection::open(dest)?;
    let backup = rusqlite::backup::Backup::new(src, &mut dst)?;
    backup.run_to_completion(PAGES_PER_STEP, Duration::ZERO, None)
}

/// Build `<stamp>_<note>.db`, with `_<attempt>` appended after the first try.
///
/// The note is reduced to `[A-Za-z0-9_-]`; anything else becomes `_`. A
/// missing or blank note is written as `auto`.
pub fn backup_file_name(stamp: &str, note: Option<&str>, attempt: u32) -> String {
    let note = note.map(str::trim).filter(|n| !n.is_empty());
    let label: String = match note {
        Some(note) => note
            .chars()
            .take(MAX_NOTE_LEN)
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
        None => "auto".to_string(),
    };
    if attempt <= 1 {
        format!("{stamp}_{label}.db")
    } else {
        format!("{stamp}_{label}_{attempt}.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{add_request, connection, context};

    #[test]
    fn file_name_defaults_to_auto() {
        assert_eq!(backup_file_name("20260101_120000", None, 1), "20260101_120000_auto.db");
        assert_eq!(backup_file_name("20260101_120000", Some("  "), 1), "20260101_120000_auto.db");
    }

    #[test]
    fn file_name_sanitizes_note() {
        assert_eq!(
            backup_file_name("20260101_120000", Some("before ../upgrade!"), 1),
            "20260101_120000_before____upgrade_.db"
        );
        assert_eq!(
            backup_file_name("20260101_120000", Some("pre-migration_2"), 1),
            "20260101_120000_pre-migration_2.db"
        );
    }

    #[test]
    fn file_name_appends_attempt() {
        assert_eq!(backup_file_name("s", Some("x"), 3), "s_x_3.db");
    }

    #[test]
    fn backup_copies_current_rows() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir.path().join("backups"));
        let mut conn = connection();
        crate::handlers::handler_for(CommandKind::Add)(&mut conn, &ctx, add_request("alice", "1", None))
            .unwrap();

        let path = match backup(&mut conn, &ctx, Request::Backup { note: Some("unit".into()) }).unwrap() {
            Reply::Backup(path) => path,
            other => panic!("expected Backup, got {other:?}"),
        };
        assert!(path.starts_with(dir.path().join("backups")));
        assert!(path.to_string_lossy().ends_with("_unit.db"));

        let copy = Connection::open(&path).unwrap();
        let count: i64 = copy
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn same_second_backups_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut conn = connection();
        let mut paths = Vec::new();
        for _ in 0..3 {
            match backup(&mut conn, &ctx, Request::Backup { note: None }).unwrap() {
                Reply::Backup(path) => paths.push(path),
                other => panic!("expected Backup, got {other:?}"),
            }
        }
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 3);
    }
}
