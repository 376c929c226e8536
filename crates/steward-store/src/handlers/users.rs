// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account record handlers: insert, lookup, soft delete, field updates.

use rusqlite::{Connection, ToSql, params};
use steward_core::{BusyReport, StewardError};

use super::{HandlerError, find_active};
use crate::command::{CommandKind, Reply, Request};
use crate::dispatch::HandlerContext;

pub(super) fn add(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::Add(user) = request else {
        return Err(HandlerError::mismatch(CommandKind::Add));
    };
    conn.execute(
        "INSERT INTO users (login, password_hash, full_name, phone, role, iin)
         VALUES (?1, ?2, ?3, ?4, ?5, NULLIF(?6, ''))",
        params![
            user.login,
            user.password_hash,
            user.full_name,
            user.phone,
            user.role,
            user.iin,
        ],
    )?;
    Ok(Reply::Done(true))
}

pub(super) fn get(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::Get { login } = request else {
        return Err(HandlerError::mismatch(CommandKind::Get));
    };
    Ok(Reply::User(find_active(conn, &login)?))
}

pub(super) fn delete(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::Delete { login } = request else {
        return Err(HandlerError::mismatch(CommandKind::Del));
    };
    set_deleted(conn, &login, true)
}

pub(super) fn restore(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::Restore { login } = request else {
        return Err(HandlerError::mismatch(CommandKind::RestoreUser));
    };
    set_deleted(conn, &login, false)
}

fn set_deleted(conn: &Connection, login: &str, deleted: bool) -> Result<Reply, HandlerError> {
    let changed = conn.execute(
        "UPDATE users SET is_deleted = ?2 WHERE login = ?1",
        params![login, deleted],
    )?;
    Ok(Reply::Done(changed > 0))
}

pub(super) fn set_role(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::SetRole { login, role } = request else {
        return Err(HandlerError::mismatch(CommandKind::SetRole));
    };
    let changed = conn.execute(
        "UPDATE users SET role = ?2 WHERE login = ?1",
        params![login, role],
    )?;
    Ok(Reply::Done(changed > 0))
}

pub(super) fn update_password(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::UpdatePassword {
        login,
        password_hash,
    } = request
    else {
        return Err(HandlerError::mismatch(CommandKind::UpdPwd));
    };
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?2 WHERE login = ?1",
        params![login, password_hash],
    )?;
    Ok(Reply::Done(changed > 0))
}

/// Write only the contact fields that are present. An empty `iin` clears it.
pub(super) fn update_contacts(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::UpdateContacts { login, update } = request else {
        return Err(HandlerError::mismatch(CommandKind::UpdContacts));
    };
    if update.phone.as_deref().is_some_and(str::is_empty) {
        return Err(StewardError::Validation("phone must not be empty".into()).into());
    }
    if update.is_empty() {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE login = ?1)",
            [&login],
            |row| row.get(0),
        )?;
        return Ok(Reply::Done(exists));
    }

    let mut assignments: Vec<&str> = Vec::new();
    let mut values: Vec<&dyn ToSql> = Vec::new();
    if let Some(phone) = &update.phone {
        assignments.push("phone = ?");
        values.push(phone);
    }
    if let Some(iin) = &update.iin {
        assignments.push("iin = NULLIF(?, '')");
        values.push(iin);
    }
    if let Some(full_name) = &update.full_name {
        assignments.push("full_name = ?");
        values.push(full_name);
    }

    values.push(&login);
    let sql = format!("UPDATE users SET {} WHERE login = ?", assignments.join(", "));
    let changed = conn.execute(&sql, values.as_slice())?;
    Ok(Reply::Done(changed > 0))
}

/// Report, per field, whether any row (deleted or not) already holds the value.
pub(super) fn check(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::Check(query) = request else {
        return Err(HandlerError::mismatch(CommandKind::Check));
    };
    Ok(Reply::Busy(BusyReport {
        login: taken(conn, "login", query.login.as_deref())?,
        phone: taken(conn, "phone", query.phone.as_deref())?,
        iin: taken(conn, "iin", query.iin.as_deref())?,
    }))
}

fn taken(conn: &Connection, column: &'static str, value: Option<&str>) -> rusqlite::Result<bool> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(false);
    };
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM users WHERE {column} = ?1)"),
        [value],
        |row| row.get(0),
    )
}

pub(super) fn confirm_email(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::ConfirmEmail { login } = request else {
        return Err(HandlerError::mismatch(CommandKind::ConfirmEmail));
    };
    let changed = conn.execute(
        "UPDATE users SET email_confirmed = 1 WHERE login = ?1 AND is_deleted = 0",
        [&login],
    )?;
    Ok(Reply::Done(changed > 0))
}

pub(super) fn confirm_phone(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::ConfirmPhone { login } = request else {
        return Err(HandlerError::mismatch(CommandKind::ConfirmPhone));
    };
    let changed = conn.execute(
        "UPDATE users SET phone_confirmed = 1 WHERE login = ?1 AND is_deleted = 0",
        [&login],
    )?;
    Ok(Reply::Done(changed > 0))
}

/// Lift a lockout and forget past failures.
pub(super) fn unblock(
    conn: &mut Connection,
    _ctx: &HandlerContext,
    request: Request,
) -> Result<Reply, HandlerError> {
    let Request::Unblock { login } = request else {
        return Err(HandlerError::mismatch(CommandKind::Unblock));
    };
    let changed = conn.execute(
        "UPDATE users SET is_blocked = 0, failed_logins = 0 WHERE login = ?1",
        [&login],
    )?;
    Ok(Reply::Done(changed > 0))
}
