// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `steward user ...` subcommands.
//!
//! Every subcommand except `list` goes through the store facade. Each returns
//! `Ok(true)` on a positive outcome and `Ok(false)` when the target was not
//! found or the request was refused, which the binary maps to its exit code.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Subcommand;
use steward_config::StewardConfig;
use steward_core::{AuthOutcome, BusyQuery, ContactUpdate, NewUser, StewardError, User};
use steward_store::UserStore;

use crate::prompt::read_password;

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create an account. The password is read from STEWARD_PASSWORD or prompted.
    Add {
        login: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "")]
        full_name: String,
        #[arg(long, default_value = "user")]
        role: String,
        #[arg(long)]
        iin: Option<String>,
    },
    /// Show one active account.
    Show {
        login: String,
        #[arg(long)]
        json: bool,
    },
    /// List active accounts from a read-only connection.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Soft-delete an account.
    Delete { login: String },
    /// Undo a soft delete.
    Restore { login: String },
    /// Change an account's role.
    SetRole { login: String, role: String },
    /// Set a new password.
    Passwd { login: String },
    /// Update phone, IIN, or full name. Pass an empty --iin to clear it.
    Contacts {
        login: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        iin: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Report whether a login, phone, or IIN is already taken.
    Check {
        #[arg(long)]
        login: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        iin: Option<String>,
    },
    /// Clear a lockout and the failed-login counter.
    Unblock { login: String },
    /// Mark the email address as confirmed.
    ConfirmEmail { login: String },
    /// Mark the phone number as confirmed.
    ConfirmPhone { login: String },
    /// Check a password, counting failures toward lockout.
    Auth { login: String },
    /// Issue a password reset token.
    ResetRequest { login: String },
    /// Redeem a reset token with a new password.
    Reset { token: String },
}

/// Run a subcommand against a running store.
pub async fn run(
    store: &UserStore,
    config: &StewardConfig,
    command: UserCommand,
) -> Result<bool, StewardError> {
    match command {
        UserCommand::Add {
            login,
            phone,
            full_name,
            role,
            iin,
        } => {
            let password = read_password("Password", true)?;
            store
                .add_user(NewUser {
                    login: login.clone(),
                    password,
                    full_name,
                    phone,
                    role,
                    iin,
                })
                .await?;
            println!("created {login}");
            Ok(true)
        }
        UserCommand::Show { login, json } => match store.get_user(&login).await? {
            Some(user) => {
                print_users(std::slice::from_ref(&user), json)?;
                Ok(true)
            }
            None => {
                eprintln!("no active user `{login}`");
                Ok(false)
            }
        },
        UserCommand::List { json } => list(config, json).await,
        UserCommand::Delete { login } => {
            report(store.delete_user(&login).await?, "deleted", &login)
        }
        UserCommand::Restore { login } => {
            report(store.restore_user(&login).await?, "restored", &login)
        }
        UserCommand::SetRole { login, role } => report(
            store.set_role(&login, &role).await?,
            "role updated for",
            &login,
        ),
        UserCommand::Passwd { login } => {
            let password = read_password("New password", true)?;
            report(
                store.update_password(&login, password).await?,
                "password updated for",
                &login,
            )
        }
        UserCommand::Contacts {
            login,
            phone,
            iin,
            full_name,
        } => {
            let update = ContactUpdate {
                phone,
                iin,
                full_name,
            };
            report(
                store.update_contacts(&login, update).await?,
                "contacts updated for",
                &login,
            )
        }
        UserCommand::Check { login, phone, iin } => {
            let queried = (login.is_some(), phone.is_some(), iin.is_some());
            let busy = store.check_busy(BusyQuery { login, phone, iin }).await?;
            for (name, asked, taken) in [
                ("login", queried.0, busy.login),
                ("phone", queried.1, busy.phone),
                ("iin", queried.2, busy.iin),
            ] {
                if asked {
                    println!("{name}: {}", if taken { "taken" } else { "free" });
                }
            }
            Ok(!busy.any())
        }
        UserCommand::Unblock { login } => {
            report(store.unblock(&login).await?, "unblocked", &login)
        }
        UserCommand::ConfirmEmail { login } => report(
            store.confirm_email(&login).await?,
            "email confirmed for",
            &login,
        ),
        UserCommand::ConfirmPhone { login } => report(
            store.confirm_phone(&login).await?,
            "phone confirmed for",
            &login,
        ),
        UserCommand::Auth { login } => {
            let password = read_password("Password", false)?;
            let outcome = store.authenticate(&login, password).await?;
            println!("{}", describe_outcome(&outcome));
            Ok(matches!(outcome, AuthOutcome::Granted(_)))
        }
        UserCommand::ResetRequest { login } => {
            match store.request_password_reset(&login).await? {
                Some(token) => {
                    println!("{}", token.token);
                    eprintln!("expires at {}", token.expires_at);
                    Ok(true)
                }
                None => {
                    eprintln!("no active user `{login}`");
                    Ok(false)
                }
            }
        }
        UserCommand::Reset { token } => {
            let password = read_password("New password", true)?;
            let done = store.reset_password(&token, password).await?;
            if done {
                println!("password reset");
            } else {
                eprintln!("token is invalid or expired");
            }
            Ok(done)
        }
    }
}

/// `steward user list`: reads the database file directly.
pub async fn list(config: &StewardConfig, json: bool) -> Result<bool, StewardError> {
    let path = PathBuf::from(&config.storage.database_path);
    let users = steward_store::list_active_users_async(path).await?;
    print_users(&users, json)?;
    Ok(true)
}

fn report(matched: bool, verb: &str, login: &str) -> Result<bool, StewardError> {
    if matched {
        println!("{verb} {login}");
    } else {
        eprintln!("no user `{login}`");
    }
    Ok(matched)
}

fn print_users(users: &[User], json: bool) -> Result<(), StewardError> {
    if json {
        let text = serde_json::to_string_pretty(users)
            .map_err(|e| StewardError::Internal(format!("failed to encode users: {e}")))?;
        println!("{text}");
    } else {
        for user in users {
            println!("{}", describe_user(user));
        }
    }
    Ok(())
}

fn describe_user(user: &User) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", user.login);
    let _ = writeln!(out, "  full name:  {}", user.full_name);
    let _ = writeln!(out, "  role:       {}", user.role);
    let _ = writeln!(out, "  phone:      {}{}", user.phone, confirmed(user.phone_confirmed));
    let _ = writeln!(out, "  iin:        {}", user.iin.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "  email:      {}", confirmed(user.email_confirmed).trim());
    let _ = writeln!(out, "  created:    {}", user.created_at);
    let _ = writeln!(
        out,
        "  last login: {}",
        user.last_login_at.as_deref().unwrap_or("never")
    );
    let _ = write!(
        out,
        "  status:     {} ({} failed logins)",
        if user.is_blocked { "blocked" } else { "active" },
        user.failed_logins
    );
    out
}

fn confirmed(flag: bool) -> &'static str {
    if flag { " (confirmed)" } else { " (unconfirmed)" }
}

fn describe_outcome(outcome: &AuthOutcome) -> String {
    match outcome {
        AuthOutcome::Granted(user) => format!("access granted to {} ({})", user.login, user.role),
        AuthOutcome::Rejected { remaining_attempts } => {
            format!("wrong password, {remaining_attempts} attempt(s) left before lockout")
        }
        AuthOutcome::Locked => "account is locked".to_string(),
        AuthOutcome::Unknown => "no active account with that login".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            login: "alice".into(),
            full_name: "Alice A.".into(),
            iin: None,
            password_hash: "$argon2id$secret".into(),
            phone: "+7701".into(),
            role: "admin".into(),
            created_at: "2026-01-01T00:00:00.000Z".into(),
            last_login_at: None,
            email_confirmed: true,
            phone_confirmed: false,
            failed_logins: 2,
            is_blocked: false,
            is_deleted: false,
        }
    }

    #[test]
    fn describe_user_lists_fields_without_hash() {
        let text = describe_user(&sample());
        assert!(text.starts_with("alice\n"));
        assert!(text.contains("+7701 (unconfirmed)"));
        assert!(text.contains("email:      (confirmed)"));
        assert!(text.contains("last login: never"));
        assert!(text.contains("2 failed logins"));
        assert!(!text.contains("argon2id"));
    }

    #[test]
    fn json_output_omits_password_hash() {
        let json = serde_json::to_string(&[sample()]).unwrap();
        assert!(json.contains("\"login\":\"alice\""));
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn outcome_messages() {
        assert!(describe_outcome(&AuthOutcome::Rejected { remaining_attempts: 3 }).contains('3'));
        assert_eq!(describe_outcome(&AuthOutcome::Locked), "account is locked");
    }
}
