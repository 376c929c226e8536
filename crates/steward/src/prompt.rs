// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password input from `STEWARD_PASSWORD` or an interactive prompt.

use secrecy::{ExposeSecret, SecretString};
use steward_core::StewardError;

/// Environment variable consulted before prompting.
pub const PASSWORD_ENV_VAR: &str = "STEWARD_PASSWORD";

/// Read a password, asking twice when `confirm` is set and a TTY is attached.
///
/// A non-empty `STEWARD_PASSWORD` wins and is never confirmed. Without it,
/// stdin must be a terminal.
pub fn read_password(label: &str, confirm: bool) -> Result<SecretString, StewardError> {
    if let Ok(value) = std::env::var(PASSWORD_ENV_VAR)
        && !value.is_empty()
    {
        return Ok(SecretString::from(value));
    }

    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(StewardError::Credential(format!(
            "no password provided; set {PASSWORD_ENV_VAR} or run interactively"
        )));
    }

    let first = prompt(&format!("{label}: "))?;
    if first.expose_secret().is_empty() {
        return Err(StewardError::Credential("empty password not allowed".into()));
    }
    if confirm {
        let second = prompt(&format!("Confirm {}: ", label.to_lowercase()))?;
        if first.expose_secret() != second.expose_secret() {
            return Err(StewardError::Credential("passwords do not match".into()));
        }
    }
    Ok(first)
}

fn prompt(text: &str) -> Result<SecretString, StewardError> {
    eprint!("{text}");
    rpassword::read_password()
        .map(SecretString::from)
        .map_err(|e| StewardError::Credential(format!("failed to read password: {e}")))
}
