// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Steward - user-account store administration.
//!
//! This is the binary entry point. Each invocation opens the store, runs one
//! command through the serialized worker, and shuts the worker down.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod backup;
mod prompt;
mod user;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use steward_auth::Argon2Hasher;
use steward_config::StewardConfig;
use steward_core::{PasswordHasher, StewardError};
use tracing::{error, warn};

use crate::user::UserCommand;

/// Steward - administer the user-account store.
#[derive(Parser, Debug)]
#[command(name = "steward", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage user accounts.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
    /// Write a consistent copy of the database to the backup directory.
    Backup {
        /// Label appended to the backup file name.
        #[arg(long)]
        note: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => steward_config::load_and_validate_path(path),
        None => steward_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            steward_config::render_errors(&errors);
            return ExitCode::from(1);
        }
    };

    init_tracing(&config.log.level);

    match run(cli.command, &config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(command: Commands, config: &StewardConfig) -> Result<bool, StewardError> {
    // Listing reads the file directly and never needs the writer.
    if let Commands::User {
        action: UserCommand::List { json },
    } = command
    {
        return user::list(config, json).await;
    }

    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::from_config(&config.auth)?);
    let (store, handle) = steward_store::spawn_store(config, hasher).await?;
    let shutdown = handle.shutdown_token();

    let work = async {
        match command {
            Commands::User { action } => user::run(&store, config, action).await,
            Commands::Backup { note } => backup::run(&store, note.as_deref()).await,
        }
    };

    let outcome = tokio::select! {
        outcome = work => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, stopping store");
            shutdown.cancel();
            Err(StewardError::StoreUnavailable { reason: "interrupted".into() })
        }
    };

    handle.shutdown().await?;
    outcome
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "steward={log_level},steward_store={log_level},steward_auth={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn parses_user_add() {
        let cli = Cli::try_parse_from([
            "steward", "user", "add", "alice", "--phone", "+7701", "--iin", "900101",
        ])
        .unwrap();
        match cli.command {
            Commands::User {
                action: UserCommand::Add {
                    login, phone, role, iin, ..
                },
            } => {
                assert_eq!(login, "alice");
                assert_eq!(phone, "+7701");
                assert_eq!(role, "user");
                assert_eq!(iin.as_deref(), Some("900101"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_backup_with_note_and_global_config() {
        let cli = Cli::try_parse_from([
            "steward", "backup", "--note", "nightly", "--config", "/tmp/s.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.toml")));
        assert!(matches!(cli.command, Commands::Backup { note: Some(ref n) } if n == "nightly"));
    }

    #[test]
    fn add_requires_phone() {
        assert!(Cli::try_parse_from(["steward", "user", "add", "alice"]).is_err());
    }

    fn temp_config(dir: &std::path::Path) -> StewardConfig {
        let mut config = StewardConfig::default();
        config.storage.database_path = dir.join("users.db").display().to_string();
        config.storage.backup_dir = dir.join("backups").display().to_string();
        config.auth.kdf_memory_cost = 8;
        config.auth.kdf_iterations = 1;
        config
    }

    #[tokio::test]
    async fn backup_command_writes_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(dir.path());
        let ok = run(
            Commands::Backup {
                note: Some("test".into()),
            },
            &config,
        )
        .await
        .unwrap();
        assert!(ok);
        let written = std::fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert_eq!(written, 1);
    }

    #[tokio::test]
    async fn missing_user_exits_unsuccessfully() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(dir.path());
        let command = Commands::User {
            action: UserCommand::Delete {
                login: "ghost".into(),
            },
        };
        assert!(!run(command, &config).await.unwrap());

        let list = Commands::User {
            action: UserCommand::List { json: true },
        };
        assert!(run(list, &config).await.unwrap());
    }
}
