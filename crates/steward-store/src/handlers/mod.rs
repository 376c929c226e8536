// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handlers: one synchronous function per command kind.
//!
//! Handlers run on the worker's database thread with exclusive use of the
//! connection, so a handler that spans several statements observes no
//! interleaving from other commands. Handlers that write more than one row
//! still open a transaction so a failure midway leaves nothing behind.

mod auth;
mod backup;
mod reset;
mod users;

use rusqlite::{OptionalExtension, Row};
use steward_core::{StewardError, User};
use thiserror::Error;

use crate::command::CommandKind;
use crate::database::classify;
use crate::dispatch::Handler;

pub use backup::backup_file_name;

/// Failure inside a handler. SQLite errors are classified on conversion, so
/// `?` works uniformly on rusqlite calls and on crate errors.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct HandlerError(#[from] StewardError);

impl From<rusqlite::Error> for HandlerError {
    fn from(err: rusqlite::Error) -> Self {
        Self(classify(err))
    }
}

impl HandlerError {
    pub fn into_inner(self) -> StewardError {
        self.0
    }

    /// The dispatch table routed a request to a handler for another kind.
    pub(crate) fn mismatch(expected: CommandKind) -> Self {
        Self(StewardError::Handler {
            kind: expected.to_string(),
            message: "payload does not match command kind".into(),
        })
    }
}

/// The built-in handler for `kind`.
pub fn handler_for(kind: CommandKind) -> Handler {
    match kind {
        CommandKind::Add => users::add,
        CommandKind::Get => users::get,
        CommandKind::Del => users::delete,
        CommandKind::RestoreUser => users::restore,
        CommandKind::SetRole => users::set_role,
        CommandKind::UpdPwd => users::update_password,
        CommandKind::UpdContacts => users::update_contacts,
        CommandKind::Check => users::check,
        CommandKind::Auth => auth::authenticate,
        CommandKind::ConfirmEmail => users::confirm_email,
        CommandKind::ConfirmPhone => users::confirm_phone,
        CommandKind::RequestPwdReset => reset::request_reset,
        CommandKind::ResetPassword => reset::reset_password,
        CommandKind::Unblock => users::unblock,
        CommandKind::Backup => backup::backup,
    }
}

pub(crate) const USER_COLUMNS: &str = "login, full_name, iin, password_hash, phone, role, \
     created_at, last_login_at, email_confirmed, phone_confirmed, failed_logins, \
     is_blocked, is_deleted";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        login: row.get("login")?,
        full_name: row.get("full_name")?,
        iin: row.get("iin")?,
        password_hash: row.get("password_hash")?,
        phone: row.get("phone")?,
        role: row.get("role")?,
        created_at: row.get("created_at")?,
        last_login_at: row.get("last_login_at")?,
        email_confirmed: row.get("email_confirmed")?,
        phone_confirmed: row.get("phone_confirmed")?,
        failed_logins: row.get("failed_logins")?,
        is_blocked: row.get("is_blocked")?,
        is_deleted: row.get("is_deleted")?,
    })
}

/// Fetch a live (not soft-deleted) user.
pub(crate) fn find_active(
    conn: &rusqlite::Connection,
    login: &str,
) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE login = ?1 AND is_deleted = 0"),
        [login],
        user_from_row,
    )
    .optional()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use steward_auth::Argon2Hasher;
    use steward_core::PasswordHasher;

    use crate::command::{AddUser, Reply, Request};
    use crate::dispatch::HandlerContext;

    /// Cheap Argon2 parameters keep handler tests fast.
    pub fn hasher() -> Arc<dyn PasswordHasher> {
        Arc::new(Argon2Hasher::new(8, 1, 1).unwrap())
    }

    pub fn context(backup_dir: &Path) -> HandlerContext {
        HandlerContext {
            hasher: hasher(),
            max_failed_logins: 3,
            reset_token_ttl: Duration::from_secs(1800),
            backup_dir: backup_dir.to_path_buf(),
        }
    }

    pub fn connection() -> rusqlite::Connection {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        crate::migrations::run_migrations(&mut conn).unwrap();
        conn
    }

    pub fn add_request(login: &str, phone: &str, iin: Option<&str>) -> Request {
        Request::Add(AddUser {
            login: login.into(),
            password_hash: "unused".into(),
            full_name: format!("{login} test"),
            phone: phone.into(),
            role: "operator".into(),
            iin: iin.map(String::from),
        })
    }

    pub fn flag(reply: Reply) -> bool {
        match reply {
            Reply::Done(flag) => flag,
            other => panic!("expected Done, got {other:?}"),
        }
    }
}
