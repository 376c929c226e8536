// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, known log levels, and sane Argon2id parameters.

use crate::diagnostic::ConfigError;
use crate::model::StewardConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Longest reset-token lifetime accepted: one day.
pub const MAX_RESET_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &StewardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let level = config.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "log.level `{}` is not one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.storage.backup_dir.trim().is_empty() {
        fail("storage.backup_dir must not be empty".to_string());
    }

    if config.auth.max_failed_logins == 0 {
        fail("auth.max_failed_logins must be at least 1".to_string());
    }

    if config.auth.reset_token_ttl_secs == 0 {
        fail("auth.reset_token_ttl_secs must be at least 1".to_string());
    } else if config.auth.reset_token_ttl_secs > MAX_RESET_TOKEN_TTL_SECS {
        fail(format!(
            "auth.reset_token_ttl_secs must be at most {MAX_RESET_TOKEN_TTL_SECS}, got {}",
            config.auth.reset_token_ttl_secs
        ));
    }

    if config.auth.kdf_parallelism < 1 {
        fail(format!(
            "auth.kdf_parallelism must be at least 1, got {}",
            config.auth.kdf_parallelism
        ));
    }

    // Argon2 requires at least 8 KiB per lane.
    let min_memory = config.auth.kdf_parallelism.max(1).saturating_mul(8);
    if config.auth.kdf_memory_cost < min_memory {
        fail(format!(
            "auth.kdf_memory_cost must be at least {min_memory} KiB, got {}",
            config.auth.kdf_memory_cost
        ));
    }

    if config.auth.kdf_iterations < 1 {
        fail(format!(
            "auth.kdf_iterations must be at least 1, got {}",
            config.auth.kdf_iterations
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = StewardConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = StewardConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = StewardConfig::default();
        config.log.level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "log.level"));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = StewardConfig::default();
        config.log.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_lockout_threshold_fails_validation() {
        let mut config = StewardConfig::default();
        config.auth.max_failed_logins = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "max_failed_logins"));
    }

    #[test]
    fn reset_token_ttl_is_capped_at_one_day() {
        let mut config = StewardConfig::default();
        config.auth.reset_token_ttl_secs = MAX_RESET_TOKEN_TTL_SECS;
        assert!(validate_config(&config).is_ok());

        config.auth.reset_token_ttl_secs = u64::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "reset_token_ttl_secs"));
    }

    #[test]
    fn undersized_kdf_memory_fails_validation() {
        let mut config = StewardConfig::default();
        config.auth.kdf_parallelism = 4;
        config.auth.kdf_memory_cost = 16;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "kdf_memory_cost"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = StewardConfig::default();
        config.storage.database_path = " ".to_string();
        config.storage.backup_dir = "".to_string();
        config.auth.reset_token_ttl_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
