// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store facade, the worker, and the CLI.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// A user account row.
///
/// Timestamps are UTC strings in `YYYY-MM-DDTHH:MM:SS.sssZ` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub full_name: String,
    /// National identification number. `None` when not provided.
    pub iin: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: String,
    pub role: String,
    pub created_at: String,
    pub last_login_at: Option<String>,
    pub email_confirmed: bool,
    pub phone_confirmed: bool,
    pub failed_logins: u32,
    pub is_blocked: bool,
    pub is_deleted: bool,
}

/// An issued password reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetToken {
    pub token: String,
    pub login: String,
    pub expires_at: String,
}

/// Input for creating a user. The password is plaintext here and is hashed
/// by the facade before it is enqueued.
#[derive(Debug)]
pub struct NewUser {
    pub login: String,
    pub password: SecretString,
    pub full_name: String,
    pub phone: String,
    pub role: String,
    pub iin: Option<String>,
}

/// Partial contact update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactUpdate {
    pub phone: Option<String>,
    pub iin: Option<String>,
    pub full_name: Option<String>,
}

impl ContactUpdate {
    /// True when no field would be written.
    pub fn is_empty(&self) -> bool {
        self.phone.is_none() && self.iin.is_none() && self.full_name.is_none()
    }
}

/// Candidate values for a busy-check. Only supplied fields are checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyQuery {
    pub login: Option<String>,
    pub phone: Option<String>,
    pub iin: Option<String>,
}

/// Per-field result of a busy-check. Unsupplied fields are always `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyReport {
    pub login: bool,
    pub phone: bool,
    pub iin: bool,
}

impl BusyReport {
    /// True when at least one supplied value is already taken.
    pub fn any(&self) -> bool {
        self.login || self.phone || self.iin
    }
}

/// Result of a credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Password matched; the counter was reset and `last_login_at` stamped.
    Granted(User),
    /// Password did not match; the account is still usable.
    Rejected { remaining_attempts: u32 },
    /// The account is blocked, either already or by this attempt.
    Locked,
    /// No active account with this login.
    Unknown,
}
