// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential collaborators for the Steward account store.
//!
//! [`Argon2Hasher`] implements [`steward_core::PasswordHasher`] with Argon2id
//! PHC strings, and [`generate_token`] produces opaque reset tokens from the
//! system CSPRNG.

pub mod hasher;
pub mod token;

pub use hasher::Argon2Hasher;
pub use token::generate_token;
