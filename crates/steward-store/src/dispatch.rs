// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command kind to handler lookup.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use steward_config::StewardConfig;
use steward_core::{PasswordHasher, StewardError};
use strum::IntoEnumIterator;

use crate::command::{CommandKind, Reply, Request};
use crate::handlers::{self, HandlerError};

/// Synchronous handler run on the worker's database thread.
pub type Handler =
    fn(&mut rusqlite::Connection, &HandlerContext, Request) -> Result<Reply, HandlerError>;

/// Collaborators and limits shared by every handler invocation.
pub struct HandlerContext {
    pub hasher: Arc<dyn PasswordHasher>,
    pub max_failed_logins: u32,
    pub reset_token_ttl: Duration,
    pub backup_dir: PathBuf,
}

impl HandlerContext {
    pub fn from_config(config: &StewardConfig, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            hasher,
            max_failed_logins: config.auth.max_failed_logins,
            reset_token_ttl: Duration::from_secs(config.auth.reset_token_ttl_secs),
            backup_dir: PathBuf::from(&config.storage.backup_dir),
        }
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("max_failed_logins", &self.max_failed_logins)
            .field("reset_token_ttl", &self.reset_token_ttl)
            .field("backup_dir", &self.backup_dir)
            .finish_non_exhaustive()
    }
}

/// Total mapping from [`CommandKind`] to [`Handler`], fixed at startup.
#[derive(Clone)]
pub struct DispatchTable {
    handlers: HashMap<CommandKind, Handler>,
}

impl DispatchTable {
    /// The built-in handler set.
    pub fn standard() -> Self {
        Self {
            handlers: CommandKind::iter()
                .map(|kind| (kind, handlers::handler_for(kind)))
                .collect(),
        }
    }

    /// Build a table from explicit entries, rejecting it unless every kind
    /// has a handler. Later entries for the same kind replace earlier ones.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (CommandKind, Handler)>,
    ) -> Result<Self, StewardError> {
        let handlers: HashMap<_, _> = entries.into_iter().collect();
        let missing: Vec<String> = CommandKind::iter()
            .filter(|kind| !handlers.contains_key(kind))
            .map(|kind| kind.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(StewardError::Dispatch { missing });
        }
        Ok(Self { handlers })
    }

    pub fn handler(&self, kind: CommandKind) -> Result<Handler, StewardError> {
        self.handlers
            .get(&kind)
            .copied()
            .ok_or_else(|| StewardError::Dispatch {
                missing: vec![kind.to_string()],
            })
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
