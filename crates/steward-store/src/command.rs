// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commands: a typed request plus the one-shot handle its caller awaits.
//!
//! Every mutation or read the worker performs travels as a [`Command`]. The
//! caller keeps the [`Pending`] half and is woken exactly once, with either
//! the handler's [`Reply`] or the error that stopped it.

use std::path::PathBuf;

use secrecy::SecretString;
use steward_core::{AuthOutcome, BusyQuery, BusyReport, ContactUpdate, ResetToken, StewardError, User};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};
use tokio::sync::oneshot;
use tracing::debug;

/// Operation names understood by the dispatch table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, EnumCount, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum CommandKind {
    Add,
    Get,
    Del,
    RestoreUser,
    SetRole,
    UpdPwd,
    UpdContacts,
    Check,
    Auth,
    ConfirmEmail,
    ConfirmPhone,
    RequestPwdReset,
    ResetPassword,
    Unblock,
    Backup,
}

/// Insert payload. The password is already hashed by the time it is queued.
#[derive(Debug, Clone)]
pub struct AddUser {
    pub login: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub role: String,
    pub iin: Option<String>,
}

/// A request for the worker, one variant per [`CommandKind`].
#[derive(Debug)]
pub enum Request {
    Add(AddUser),
    Get { login: String },
    Delete { login: String },
    Restore { login: String },
    SetRole { login: String, role: String },
    UpdatePassword { login: String, password_hash: String },
    UpdateContacts { login: String, update: ContactUpdate },
    Check(BusyQuery),
    Auth { login: String, password: SecretString },
    ConfirmEmail { login: String },
    ConfirmPhone { login: String },
    RequestPasswordReset { login: String },
    ResetPassword { token: String, password_hash: String },
    Unblock { login: String },
    Backup { note: Option<String> },
}

impl Request {
    /// The dispatch key for this request.
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Add(_) => CommandKind::Add,
            Self::Get { .. } => CommandKind::Get,
            Self::Delete { .. } => CommandKind::Del,
            Self::Restore { .. } => CommandKind::RestoreUser,
            Self::SetRole { .. } => CommandKind::SetRole,
            Self::UpdatePassword { .. } => CommandKind::UpdPwd,
            Self::UpdateContacts { .. } => CommandKind::UpdContacts,
            Self::Check(_) => CommandKind::Check,
            Self::Auth { .. } => CommandKind::Auth,
            Self::ConfirmEmail { .. } => CommandKind::ConfirmEmail,
            Self::ConfirmPhone { .. } => CommandKind::ConfirmPhone,
            Self::RequestPasswordReset { .. } => CommandKind::RequestPwdReset,
            Self::ResetPassword { .. } => CommandKind::ResetPassword,
            Self::Unblock { .. } => CommandKind::Unblock,
            Self::Backup { .. } => CommandKind::Backup,
        }
    }
}

/// What a handler hands back to its caller.
#[derive(Debug)]
pub enum Reply {
    /// `true` when a row matched the login (or token).
    Done(bool),
    User(Option<User>),
    Busy(BusyReport),
    Auth(AuthOutcome),
    ResetToken(Option<ResetToken>),
    Backup(PathBuf),
}

impl Reply {
    fn unexpected(self, kind: CommandKind) -> StewardError {
        StewardError::Handler {
            kind: kind.to_string(),
            message: format!("unexpected reply {self:?}"),
        }
    }

    pub fn into_flag(self, kind: CommandKind) -> Result<bool, StewardError> {
        match self {
            Self::Done(flag) => Ok(flag),
            other => Err(other.unexpected(kind)),
        }
    }

    pub fn into_user(self, kind: CommandKind) -> Result<Option<User>, StewardError> {
        match self {
            Self::User(user) => Ok(user),
            other => Err(other.unexpected(kind)),
        }
    }

    pub fn into_busy(self, kind: CommandKind) -> Result<BusyReport, StewardError> {
        match self {
            Self::Busy(report) => Ok(report),
            other => Err(other.unexpected(kind)),
        }
    }

    pub fn into_auth(self, kind: CommandKind) -> Result<AuthOutcome, StewardError> {
        match self {
            Self::Auth(outcome) => Ok(outcome),
            other => Err(other.unexpected(kind)),
        }
    }

    pub fn into_reset_token(self, kind: CommandKind) -> Result<Option<ResetToken>, StewardError> {
        match self {
            Self::ResetToken(token) => Ok(token),
            other => Err(other.unexpected(kind)),
        }
    }

    pub fn into_backup(self, kind: CommandKind) -> Result<PathBuf, StewardError> {
        match self {
            Self::Backup(path) => Ok(path),
            other => Err(other.unexpected(kind)),
        }
    }
}

/// Write half of a command's result slot. Consumed on resolve, so a command
/// can be completed at most once.
#[derive(Debug)]
pub struct Completion {
    kind: CommandKind,
    tx: oneshot::Sender<Result<Reply, StewardError>>,
}

impl Completion {
    pub fn resolve(self, result: Result<Reply, StewardError>) {
        if self.tx.send(result).is_err() {
            debug!(kind = %self.kind, "caller went away before the command completed");
        }
    }
}

/// Read half of a command's result slot.
#[derive(Debug)]
pub struct Pending {
    kind: CommandKind,
    rx: oneshot::Receiver<Result<Reply, StewardError>>,
}

impl Pending {
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Wait for the worker to resolve the command.
    ///
    /// If the worker drops the command without resolving it, the caller sees
    /// [`StewardError::StoreUnavailable`] rather than hanging.
    pub async fn wait(self) -> Result<Reply, StewardError> {
        self.rx.await.map_err(|_| StewardError::StoreUnavailable {
            reason: format!("worker stopped before completing `{}`", self.kind),
        })?
    }
}

/// A unit of work on the channel.
#[derive(Debug)]
pub struct Command {
    pub request: Request,
    pub completion: Completion,
}

impl Command {
    /// Pair a request with a fresh completion handle.
    pub fn new(request: Request) -> (Self, Pending) {
        let kind = request.kind();
        let (tx, rx) = oneshot::channel();
        (
            Self {
                request,
                completion: Completion { kind, tx },
            },
            Pending { kind, rx },
        )
    }

    pub fn kind(&self) -> CommandKind {
        self.completion.kind
    }
}
