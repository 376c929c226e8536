// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Steward account store.
//!
//! This crate provides the error type, the domain types shared between the
//! store facade and its worker, and the collaborator traits (credential
//! hashing) that the store consumes.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{StewardError, UniqueField};
pub use traits::PasswordHasher;
pub use types::{
    AuthOutcome, BusyQuery, BusyReport, ContactUpdate, NewUser, ResetToken, User,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steward_error_has_all_variants() {
        let _config = StewardError::Config("test".into());
        let _validation = StewardError::Validation("test".into());
        let _conflict = StewardError::Conflict {
            field: UniqueField::Login,
        };
        let _storage = StewardError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _unavailable = StewardError::StoreUnavailable {
            reason: "test".into(),
        };
        let _handler = StewardError::Handler {
            kind: "add".into(),
            message: "test".into(),
        };
        let _credential = StewardError::Credential("test".into());
        let _dispatch = StewardError::Dispatch {
            missing: vec!["auth".into()],
        };
        let _internal = StewardError::Internal("test".into());
    }

    #[test]
    fn only_store_unavailable_is_fatal() {
        assert!(
            StewardError::StoreUnavailable {
                reason: "gone".into()
            }
            .is_fatal()
        );
        assert!(
            !StewardError::Conflict {
                field: UniqueField::Phone
            }
            .is_fatal()
        );
        assert!(!StewardError::Internal("x".into()).is_fatal());
    }

    #[test]
    fn unique_field_display_matches_column_names() {
        assert_eq!(UniqueField::Login.to_string(), "login");
        assert_eq!(UniqueField::Phone.to_string(), "phone");
        assert_eq!(UniqueField::Iin.to_string(), "iin");
    }

    #[test]
    fn busy_report_any() {
        let mut report = BusyReport::default();
        assert!(!report.any());
        report.iin = true;
        assert!(report.any());
    }
}
