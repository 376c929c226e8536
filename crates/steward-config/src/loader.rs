// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./steward.toml` > `~/.config/steward/steward.toml` > `/etc/steward/steward.toml`
//! with environment variable overrides via `STEWARD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::StewardConfig;

/// System-wide config file location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/steward/steward.toml";

/// Config file name looked up in the working directory and the XDG config dir.
pub const CONFIG_FILE_NAME: &str = "steward.toml";

/// Top-level sections reachable through `STEWARD_<SECTION>_<KEY>`.
const SECTIONS: [&str; 3] = ["log", "storage", "auth"];

/// Path of the per-user config file, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("steward").join(CONFIG_FILE_NAME))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/steward/steward.toml` (system-wide)
/// 3. `~/.config/steward/steward.toml` (user XDG config)
/// 4. `./steward.toml` (local directory)
/// 5. `STEWARD_*` environment variables
pub fn load_config() -> Result<StewardConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<StewardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StewardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<StewardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StewardConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchical config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(StewardConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `STEWARD_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`. Variables outside the
/// known sections (such as `STEWARD_PASSWORD`, read by the CLI) are skipped.
fn env_provider() -> Env {
    Env::prefixed("STEWARD_")
        .filter(|key| {
            let key = key.as_str();
            SECTIONS.iter().any(|section| {
                key.strip_prefix(section)
                    .is_some_and(|rest| rest.starts_with('_'))
            })
        })
        .map(|key| {
            let mapped = key
                .as_str()
                .replacen("log_", "log.", 1)
                .replacen("storage_", "storage.", 1)
                .replacen("auth_", "auth.", 1);
            mapped.into()
        })
}
