// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures: an isolated store on a temp directory.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use steward_auth::Argon2Hasher;
use steward_config::StewardConfig;
use steward_core::{NewUser, PasswordHasher};
use steward_store::{DispatchTable, UserStore, WorkerHandle, spawn_store_with};
use tempfile::TempDir;

pub struct Harness {
    pub store: UserStore,
    pub config: StewardConfig,
    pub handle: WorkerHandle,
    dir: TempDir,
}

impl Harness {
    pub async fn start() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(tweak: impl FnOnce(&mut StewardConfig)) -> Self {
        Self::build(tweak, DispatchTable::standard()).await
    }

    pub async fn build(tweak: impl FnOnce(&mut StewardConfig), table: DispatchTable) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StewardConfig::default();
        config.storage.database_path = dir.path().join("users.db").display().to_string();
        config.storage.backup_dir = dir.path().join("backups").display().to_string();
        tweak(&mut config);
        let (store, handle) = spawn_store_with(&config, hasher(), table).await.unwrap();
        Self {
            store,
            config,
            handle,
            dir,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.database_path)
    }

    pub fn backup_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.backup_dir)
    }

    /// Stop the worker and hand back the directory so the files outlive it.
    pub async fn stop(self) -> (TempDir, StewardConfig) {
        self.handle.shutdown().await.unwrap();
        (self.dir, self.config)
    }
}

pub fn hasher() -> Arc<dyn PasswordHasher> {
    Arc::new(Argon2Hasher::new(8, 1, 1).unwrap())
}

pub fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

pub fn new_user(login: &str, phone: &str, iin: Option<&str>) -> NewUser {
    NewUser {
        login: login.to_string(),
        password: secret("correct horse"),
        full_name: format!("{login} fullname"),
        phone: phone.to_string(),
        role: "operator".to_string(),
        iin: iin.map(String::from),
    }
}
