// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential check with failed-attempt counting and lockout.

use rusqlite::{Connection, OptionalExtension, params};
use secrecy::ExposeSecret;
use steward_core::{AuthOutcome, StewardError};
use tracing::info;

use super::{HandlerError, find_active};
use crate::command::{CommandKind, Reply, Request};
use crate::database::SQL_NOW;
use crate::dispatch::HandlerContext;

/// Verify a password against the stored hash.
///
/// A match clears the failure counter and stamps `last_login_at`. A miss
/// bumps the counter and blocks the account once it reaches the configured
/// limit. Blocked accounts are refused without checking the password.
pub(super) fn authenticate(
    conn: &mut Connection,
    ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::Auth { login, password } = request else {
        return Err(HandlerError::mismatch(CommandKind::Auth));
    };
    if password.expose_secret().is_empty() {
        return Err(StewardError::Validation("password must not be empty".into()).into());
    }

    let tx = conn.transaction()?;
    let state: Option<(String, bool, u32)> = tx
        .query_row(
            "SELECT password_hash, is_blocked, failed_logins
             FROM users WHERE login = ?1 AND is_deleted = 0",
            [&login],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let Some((hash, blocked, failed)) = state else {
        return Ok(Reply::Auth(AuthOutcome::Unknown));
    };
    if blocked {
        return Ok(Reply::Auth(AuthOutcome::Locked));
    }

    if ctx.hasher.verify(&password, &hash)? {
        tx.execute(
            &format!("UPDATE users SET failed_logins = 0, last_login_at = {SQL_NOW} WHERE login = ?1"),
            [&login],
        )?;
        let user = find_active(&tx, &login)?.ok_or_else(|| StewardError::Internal(
            format!("user `{login}` vanished inside its own transaction"),
        ))?;
        tx.commit()?;
        return Ok(Reply::Auth(AuthOutcome::Granted(user)));
    }

    let failed = failed.saturating_add(1);
    let lock = failed >= ctx.max_failed_logins;
    tx.execute(
        "UPDATE users SET failed_logins = ?2, is_blocked = ?3 WHERE login = ?1",
        params![login, failed, lock],
    )?;
    tx.commit()?;

    if lock {
        info!(login = %login, failed, "account locked after repeated failures");
        Ok(Reply::Auth(AuthOutcome::Locked))
    } else {
        Ok(Reply::Auth(AuthOutcome::Rejected {
            remaining_attempts: ctx.max_failed_logins - failed,
        }))
    }
}
