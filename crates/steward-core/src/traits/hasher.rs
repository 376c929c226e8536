// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential hashing collaborator consumed by the store.

use secrecy::SecretString;

use crate::error::StewardError;

/// Turns plaintext passwords into stored hashes and verifies them.
///
/// Implementations are synchronous and CPU-bound. The facade calls
/// [`hash`](Self::hash) on the blocking pool; the worker calls
/// [`verify`](Self::verify) on its own database thread.
pub trait PasswordHasher: Send + Sync + 'static {
    /// Hash a plaintext password into a self-describing string.
    fn hash(&self, password: &SecretString) -> Result<String, StewardError>;

    /// Check a plaintext password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`; `Err` is reserved for malformed hashes.
    fn verify(&self, password: &SecretString, hash: &str) -> Result<bool, StewardError>;
}
