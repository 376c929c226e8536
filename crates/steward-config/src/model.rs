// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Steward account store.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Steward configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StewardConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Credential and lockout settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory receiving backup artifacts. Created on first backup.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            backup_dir: default_backup_dir(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn steward_data_dir() -> std::path::PathBuf {
    dirs::data_dir()
        .map(|p| p.join("steward"))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
}

fn default_database_path() -> String {
    steward_data_dir()
        .join("users.db")
        .to_string_lossy()
        .into_owned()
}

fn default_backup_dir() -> String {
    steward_data_dir()
        .join("backups")
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Credential hashing, lockout, and reset-token configuration.
///
/// Argon2id defaults follow the OWASP password storage recommendations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Consecutive failed logins after which an account is blocked.
    #[serde(default = "default_max_failed_logins")]
    pub max_failed_logins: u32,

    /// Lifetime of a password reset token in seconds.
    #[serde(default = "default_reset_token_ttl_secs")]
    pub reset_token_ttl_secs: u64,

    /// Argon2id memory cost in KiB (default: 19456 = 19 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count (default: 2).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism lanes (default: 1).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_failed_logins: default_max_failed_logins(),
            reset_token_ttl_secs: default_reset_token_ttl_secs(),
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_max_failed_logins() -> u32 {
    5
}

fn default_reset_token_ttl_secs() -> u64 {
    30 * 60
}

fn default_kdf_memory_cost() -> u32 {
    19456
}

fn default_kdf_iterations() -> u32 {
    2
}

fn default_kdf_parallelism() -> u32 {
    1
}
