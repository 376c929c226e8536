// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password reset tokens: issue and redeem.

use rusqlite::{Connection, OptionalExtension, params};
use steward_core::{ResetToken, StewardError};
use tracing::debug;

use super::HandlerError;
use crate::command::{CommandKind, Reply, Request};
use crate::database::SQL_NOW;
use crate::dispatch::HandlerContext;

/// Issue a fresh token for a live account, replacing any earlier one.
pub(super) fn request_reset(
    conn: &mut Connection,
    ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::RequestPasswordReset { login } = request else {
        return Err(HandlerError::mismatch(CommandKind::RequestPwdReset));
    };

    let tx = conn.transaction()?;
    let purged = tx.execute(&format!("DELETE FROM reset_tokens WHERE expires_at <= {SQL_NOW}"), [])?;
    if purged > 0 {
        debug!(purged, "expired reset tokens removed");
    }

    let live: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE login = ?1 AND is_deleted = 0)",
        [&login],
        |row| row.get(0),
    )?;
    if !live {
        tx.commit()?;
        return Ok(Reply::ResetToken(None));
    }

    tx.execute("DELETE FROM reset_tokens WHERE login = ?1", [&login])?;
    let token = steward_auth::generate_token()?;
    let lifetime = format!("+{} seconds", ctx.reset_token_ttl.as_secs());
    let expires_at: Option<String> = tx.query_row(
        "SELECT strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?1)",
        [&lifetime],
        |row| row.get(0),
    )?;
    let Some(expires_at) = expires_at else {
        return Err(StewardError::Validation(format!(
            "reset token lifetime of {}s is out of range",
            ctx.reset_token_ttl.as_secs()
        ))
        .into());
    };
    tx.execute(
        "INSERT INTO reset_tokens (token, login, expires_at) VALUES (?1, ?2, ?3)",
        params![token, login, expires_at],
    )?;
    tx.commit()?;

    Ok(Reply::ResetToken(Some(ResetToken {
        token,
        login,
        expires_at,
    })))
}

/// Redeem a token. Any token that is looked up is consumed, valid or not.
pub(super) fn reset_password(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::ResetPassword {
        token,
        password_hash,
    } = request
    else {
        return Err(HandlerError::mismatch(CommandKind::ResetPassword));
    };

    let tx = conn.transaction()?;
    let found: Option<(String, bool)> = tx
        .query_row(
            &format!("SELECT login, expires_at > {SQL_NOW} FROM reset_tokens WHERE token = ?1"),
            [&token],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((login, unexpired)) = found else {
        return Ok(Reply::Done(false));
    };

    tx.execute("DELETE FROM reset_tokens WHERE token = ?1", [&token])?;
    let changed = if unexpired {
        tx.execute(
            "UPDATE users SET password_hash = ?2, failed_logins = 0
             WHERE login = ?1 AND is_deleted = 0",
            params![login, password_hash],
        )?
    } else {
        debug!(login = %login, "expired reset token presented");
        0
    };
    tx.commit()?;
    Ok(Reply::Done(changed > 0))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::handlers::testing::{add_request, connection, context, flag};

    fn issue(conn: &mut Connection, ctx: &HandlerContext, login: &str) -> Option<ResetToken> {
        let request = Request::RequestPasswordReset { login: login.into() };
        match request_reset(conn, ctx, request).unwrap() {
            Reply::ResetToken(token) => token,
            other => panic!("expected ResetToken, got {other:?}"),
        }
    }

    fn redeem(conn: &mut Connection, ctx: &HandlerContext, token: &str, hash: &str) -> bool {
        let request = Request::ResetPassword {
            token: token.into(),
            password_hash: hash.into(),
        };
        flag(reset_password(conn, ctx, request).unwrap())
    }

    fn stored_hash(conn: &Connection, login: &str) -> String {
        conn.query_row("SELECT password_hash FROM users WHERE login = ?1", [login], |r| r.get(0))
            .unwrap()
    }

    fn seed(conn: &mut Connection, ctx: &HandlerContext) {
        crate::handlers::handler_for(CommandKind::Add)(conn, ctx, add_request("alice", "100", None))
            .unwrap();
    }

    #[test]
    fn token_is_single_use() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut conn = connection();
        seed(&mut conn, &ctx);

        let token = issue(&mut conn, &ctx, "alice").unwrap();
        assert_eq!(token.login, "alice");
        assert!(redeem(&mut conn, &ctx, &token.token, "new-hash"));
        assert_eq!(stored_hash(&conn, "alice"), "new-hash");
        assert!(!redeem(&mut conn, &ctx, &token.token, "other-hash"));
        assert_eq!(stored_hash(&conn, "alice"), "new-hash");
    }

    #[test]
    fn unknown_login_gets_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut conn = connection();
        assert!(issue(&mut conn, &ctx, "ghost").is_none());
    }

    #[test]
    fn new_request_invalidates_the_previous_token() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut conn = connection();
        seed(&mut conn, &ctx);

        let first = issue(&mut conn, &ctx, "alice").unwrap();
        let second = issue(&mut conn, &ctx, "alice").unwrap();
        assert_ne!(first.token, second.token);
        assert!(!redeem(&mut conn, &ctx, &first.token, "h1"));
        assert!(redeem(&mut conn, &ctx, &second.token, "h2"));
    }

    #[test]
    fn expired_token_is_rejected_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        ctx.reset_token_ttl = Duration::ZERO;
        let mut conn = connection();
        seed(&mut conn, &ctx);

        let token = issue(&mut conn, &ctx, "alice").unwrap();
        assert!(!redeem(&mut conn, &ctx, &token.token, "new-hash"));
        assert_eq!(stored_hash(&conn, "alice"), "unused");
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM reset_tokens", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn unrepresentable_expiry_is_rejected_and_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let mut conn = connection();
        seed(&mut conn, &ctx);
        let earlier = issue(&mut conn, &ctx, "alice").unwrap();

        // Far past the year 9999, where strftime yields NULL.
        ctx.reset_token_ttl = Duration::from_secs(1_000_000_000_000_000);
        let request = Request::RequestPasswordReset { login: "alice".into() };
        let err = request_reset(&mut conn, &ctx, request).unwrap_err().into_inner();
        assert!(matches!(err, StewardError::Validation(_)), "got {err:?}");

        ctx.reset_token_ttl = Duration::from_secs(1800);
        assert!(redeem(&mut conn, &ctx, &earlier.token, "new-hash"));
    }

    #[test]
    fn reset_clears_failed_logins() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut conn = connection();
        seed(&mut conn, &ctx);
        conn.execute("UPDATE users SET failed_logins = 2", []).unwrap();

        let token = issue(&mut conn, &ctx, "alice").unwrap();
        assert!(redeem(&mut conn, &ctx, &token.token, "new-hash"));
        let failed: u32 = conn
            .query_row("SELECT failed_logins FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(failed, 0);
    }
}
