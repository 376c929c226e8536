// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Steward account store.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// A user column that carries a uniqueness constraint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UniqueField {
    Login,
    Phone,
    Iin,
}

/// The primary error type used across the facade, the worker, and the CLI.
///
/// Not-found is never an error: lookups return `Option` instead.
#[derive(Debug, Error)]
pub enum StewardError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Input rejected by the facade before a command was enqueued.
    #[error("invalid input: {0}")]
    Validation(String),

    /// An add or update would violate a unique constraint.
    #[error("{field} is already taken")]
    Conflict { field: UniqueField },

    /// Per-command storage failure (query error, I/O during backup).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The store connection is gone or unusable, or the worker has stopped.
    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    /// A handler panicked or produced a result it was not expected to produce.
    #[error("handler fault in `{kind}`: {message}")]
    Handler { kind: String, message: String },

    /// The credential hashing collaborator failed.
    #[error("credential error: {0}")]
    Credential(String),

    /// A dispatch table was assembled without a handler for every command kind.
    #[error("dispatch table is missing handlers for: {}", missing.join(", "))]
    Dispatch { missing: Vec<String> },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StewardError {
    /// Whether this error means the worker can no longer serve commands.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}
