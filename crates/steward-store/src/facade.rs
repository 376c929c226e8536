// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async client facade: the only supported way to reach the store.
//!
//! Each method validates its input, hashes any plaintext password off the
//! async runtime, enqueues one command, and awaits its result. The facade
//! never touches the database itself.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use steward_core::{
    AuthOutcome, BusyQuery, BusyReport, ContactUpdate, NewUser, PasswordHasher, ResetToken,
    StewardError, User,
};

use crate::channel::CommandSender;
use crate::command::{AddUser, Command, CommandKind, Pending, Reply, Request};

/// Cloneable handle to a running store.
#[derive(Clone)]
pub struct UserStore {
    sender: CommandSender,
    hasher: Arc<dyn PasswordHasher>,
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("closed", &self.sender.is_closed())
            .finish_non_exhaustive()
    }
}

impl UserStore {
    pub fn new(sender: CommandSender, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { sender, hasher }
    }

    /// Enqueue a raw request now and return its result slot.
    ///
    /// The command takes its place in the queue before this returns, so a
    /// sequence of `enqueue` calls from one task executes in call order.
    pub fn enqueue(&self, request: Request) -> Result<Pending, StewardError> {
        let (command, pending) = Command::new(request);
        self.sender.send(command)?;
        Ok(pending)
    }

    async fn submit(&self, request: Request) -> Result<Reply, StewardError> {
        self.enqueue(request)?.wait().await
    }

    async fn hash(&self, password: SecretString) -> Result<String, StewardError> {
        if password.expose_secret().is_empty() {
            return Err(StewardError::Validation("password must not be empty".into()));
        }
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| StewardError::Internal(format!("password hashing task failed: {e}")))?
    }

    /// Create an account. Fails with [`StewardError::Conflict`] when the
    /// login, phone, or IIN already belongs to any account, deleted or not.
    pub async fn add_user(&self, user: NewUser) -> Result<(), StewardError> {
        let login = required("login", &user.login)?;
        let phone = required("phone", &user.phone)?;
        let password_hash = self.hash(user.password).await?;
        let request = Request::Add(AddUser {
            login,
            password_hash,
            full_name: user.full_name.trim().to_string(),
            phone,
            role: user.role.trim().to_string(),
            iin: optional(user.iin),
        });
        self.submit(request).await?.into_flag(CommandKind::Add).map(drop)
    }

    /// Fetch an active account. Soft-deleted accounts read as `None`.
    pub async fn get_user(&self, login: &str) -> Result<Option<User>, StewardError> {
        let login = required("login", login)?;
        self.submit(Request::Get { login })
            .await?
            .into_user(CommandKind::Get)
    }

    pub async fn delete_user(&self, login: &str) -> Result<bool, StewardError> {
        let login = required("login", login)?;
        self.submit(Request::Delete { login })
            .await?
            .into_flag(CommandKind::Del)
    }

    pub async fn restore_user(&self, login: &str) -> Result<bool, StewardError> {
        let login = required("login", login)?;
        self.submit(Request::Restore { login })
            .await?
            .into_flag(CommandKind::RestoreUser)
    }

    pub async fn set_role(&self, login: &str, role: &str) -> Result<bool, StewardError> {
        let login = required("login", login)?;
        let role = role.trim().to_string();
        self.submit(Request::SetRole { login, role })
            .await?
            .into_flag(CommandKind::SetRole)
    }

    pub async fn update_password(
        &self,
        login: &str,
        password: SecretString,
    ) -> Result<bool, StewardError> {
        let login = required("login", login)?;
        let password_hash = self.hash(password).await?;
        self.submit(Request::UpdatePassword {
            login,
            password_hash,
        })
        .await?
        .into_flag(CommandKind::UpdPwd)
    }

    /// Overwrite the supplied contact fields. An empty `iin` clears it; an
    /// empty `phone` is rejected.
    pub async fn update_contacts(
        &self,
        login: &str,
        update: ContactUpdate,
    ) -> Result<bool, StewardError> {
        let login = required("login", login)?;
        let update = ContactUpdate {
            phone: update.phone.map(|p| p.trim().to_string()),
            iin: update.iin.map(|i| i.trim().to_string()),
            full_name: update.full_name.map(|n| n.trim().to_string()),
        };
        if update.phone.as_deref().is_some_and(str::is_empty) {
            return Err(StewardError::Validation("phone must not be empty".into()));
        }
        self.submit(Request::UpdateContacts { login, update })
            .await?
            .into_flag(CommandKind::UpdContacts)
    }

    /// Report which of the supplied values are already taken.
    pub async fn check_busy(&self, query: BusyQuery) -> Result<BusyReport, StewardError> {
        let query = BusyQuery {
            login: optional(query.login),
            phone: optional(query.phone),
            iin: optional(query.iin),
        };
        self.submit(Request::Check(query))
            .await?
            .into_busy(CommandKind::Check)
    }

    pub async fn authenticate(
        &self,
        login: &str,
        password: SecretString,
    ) -> Result<AuthOutcome, StewardError> {
        let login = required("login", login)?;
        self.submit(Request::Auth { login, password })
            .await?
            .into_auth(CommandKind::Auth)
    }

    pub async fn confirm_email(&self, login: &str) -> Result<bool, StewardError> {
        let login = required("login", login)?;
        self.submit(Request::ConfirmEmail { login })
            .await?
            .into_flag(CommandKind::ConfirmEmail)
    }

    pub async fn confirm_phone(&self, login: &str) -> Result<bool, StewardError> {
        let login = required("login", login)?;
        self.submit(Request::ConfirmPhone { login })
            .await?
            .into_flag(CommandKind::ConfirmPhone)
    }

    /// Issue a reset token, or `None` if there is no active account.
    pub async fn request_password_reset(
        &self,
        login: &str,
    ) -> Result<Option<ResetToken>, StewardError> {
        let login = required("login", login)?;
        self.submit(Request::RequestPasswordReset { login })
            .await?
            .into_reset_token(CommandKind::RequestPwdReset)
    }

    /// Redeem a reset token. `false` when the token is unknown, used, or expired.
    pub async fn reset_password(
        &self,
        token: &str,
        password: SecretString,
    ) -> Result<bool, StewardError> {
        let token = required("token", token)?;
        let password_hash = self.hash(password).await?;
        self.submit(Request::ResetPassword {
            token,
            password_hash,
        })
        .await?
        .into_flag(CommandKind::ResetPassword)
    }

    pub async fn unblock(&self, login: &str) -> Result<bool, StewardError> {
        let login = required("login", login)?;
        self.submit(Request::Unblock { login })
            .await?
            .into_flag(CommandKind::Unblock)
    }

    /// Snapshot the database into the backup directory, in queue order.
    pub async fn backup(&self, note: Option<&str>) -> Result<PathBuf, StewardError> {
        let note = note.map(String::from);
        self.submit(Request::Backup { note })
            .await?
            .into_backup(CommandKind::Backup)
    }
}

fn required(field: &str, value: &str) -> Result<String, StewardError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StewardError::Validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::channel;
    use crate::handlers::testing::hasher;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("login", "  alice ").unwrap(), "alice");
        assert!(matches!(
            required("login", "   "),
            Err(StewardError::Validation(_))
        ));
    }

    #[test]
    fn optional_drops_blank_values() {
        assert_eq!(optional(Some(" ".into())), None);
        assert_eq!(optional(Some(" 42 ".into())), Some("42".into()));
        assert_eq!(optional(None), None);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_queue() {
        let (tx, rx) = channel();
        // The receiver is dropped, so anything enqueued would fail as unavailable.
        drop(rx);
        let store = UserStore::new(tx, hasher());
        let err = store.get_user("").await.unwrap_err();
        assert!(matches!(err, StewardError::Validation(_)));
        let err = store
            .update_password("alice", SecretString::from(String::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, StewardError::Validation(_)));
    }

    #[tokio::test]
    async fn stopped_worker_reports_unavailable() {
        let (tx, rx) = channel();
        drop(rx);
        let store = UserStore::new(tx, hasher());
        let err = store.get_user("alice").await.unwrap_err();
        assert!(err.is_fatal());
    }
}
