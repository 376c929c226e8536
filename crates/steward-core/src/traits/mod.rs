// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the Steward store.

pub mod hasher;

pub use hasher::PasswordHasher;
