// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id password hashing.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so
//! the parameters used at hashing time travel with the hash and verification
//! keeps working after the configured costs change.

use argon2::password_hash::{PasswordHash, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use steward_config::model::AuthConfig;
use steward_core::{PasswordHasher, StewardError};

/// Argon2id implementation of [`PasswordHasher`].
pub struct Argon2Hasher {
    params: Params,
    rng: SystemRandom,
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

impl Argon2Hasher {
    /// Create a hasher with explicit Argon2id costs.
    pub fn new(memory_cost: u32, iterations: u32, parallelism: u32) -> Result<Self, StewardError> {
        let params = Params::new(memory_cost, iterations, parallelism, None)
            .map_err(|e| StewardError::Credential(format!("invalid Argon2id parameters: {e}")))?;
        tracing::debug!(memory_cost, iterations, parallelism, "argon2id hasher configured");
        Ok(Self {
            params,
            rng: SystemRandom::new(),
        })
    }

    /// Create a hasher from the `[auth]` config section.
    pub fn from_config(config: &AuthConfig) -> Result<Self, StewardError> {
        Self::new(
            config.kdf_memory_cost,
            config.kdf_iterations,
            config.kdf_parallelism,
        )
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn salt(&self) -> Result<SaltString, StewardError> {
        let mut bytes = [0u8; 16];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| StewardError::Credential("failed to generate random salt".to_string()))?;
        SaltString::encode_b64(&bytes)
            .map_err(|e| StewardError::Credential(format!("failed to encode salt: {e}")))
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &SecretString) -> Result<String, StewardError> {
        let salt = self.salt()?;
        let hash = argon2::PasswordHasher::hash_password(
            &self.argon2(),
            password.expose_secret().as_bytes(),
            &salt,
        )
        .map_err(|e| StewardError::Credential(format!("Argon2id hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &SecretString, hash: &str) -> Result<bool, StewardError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| StewardError::Credential(format!("malformed password hash: {e}")))?;
        match self
            .argon2()
            .verify_password(password.expose_secret().as_bytes(), &parsed)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(StewardError::Credential(format!(
                "Argon2id verification failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost for fast tests.
    fn cheap() -> Argon2Hasher {
        Argon2Hasher::new(8, 1, 1).unwrap()
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn hash_then_verify_accepts_same_password() {
        let hasher = cheap();
        let hash = hasher.hash(&secret("correct horse")).unwrap();
        assert!(hasher.verify(&secret("correct horse"), &hash).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hasher = cheap();
        let hash = hasher.hash(&secret("correct horse")).unwrap();
        assert!(!hasher.verify(&secret("battery staple"), &hash).unwrap());
    }

    #[test]
    fn hash_is_phc_string_without_plaintext() {
        let hash = cheap().hash(&secret("hunter2")).unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=8,t=1,p=1$"));
        assert!(!hash.contains("hunter2"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = cheap();
        let a = hasher.hash(&secret("same")).unwrap();
        let b = hasher.hash(&secret("same")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_uses_parameters_embedded_in_hash() {
        let hash = Argon2Hasher::new(16, 2, 1)
            .unwrap()
            .hash(&secret("pw"))
            .unwrap();
        assert!(cheap().verify(&secret("pw"), &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let result = cheap().verify(&secret("pw"), "not-a-phc-string");
        assert!(matches!(result, Err(StewardError::Credential(_))));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(Argon2Hasher::new(1, 1, 1).is_err());
    }

    #[test]
    fn from_default_config() {
        let hasher = Argon2Hasher::from_config(&AuthConfig::default()).unwrap();
        assert_eq!(hasher.params.m_cost(), 19456);
    }
}
