// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opaque password reset tokens.

use ring::rand::{SecureRandom, SystemRandom};
use steward_core::StewardError;
use zeroize::Zeroizing;

/// Number of random bytes in a reset token (hex-encoded to twice this length).
pub const TOKEN_BYTES: usize = 32;

/// Generate a random, URL-safe reset token.
pub fn generate_token() -> Result<String, StewardError> {
    let mut bytes = Zeroizing::new([0u8; TOKEN_BYTES]);
    SystemRandom::new()
        .fill(&mut bytes[..])
        .map_err(|_| StewardError::Credential("failed to generate reset token".to_string()))?;
    Ok(hex::encode(&bytes[..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_hex_of_expected_length() {
        let token = generate_token().unwrap();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_token().unwrap(), generate_token().unwrap());
    }
}
