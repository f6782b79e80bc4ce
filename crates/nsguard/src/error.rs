//! Error types for nsguard
//!
//! This module defines the error hierarchy for the nsguard crate using `thiserror`.
//! Rule mutation and rule loading return `Result<T, GuardError>`. Permission
//! queries never fail: a namespace without a matching rule resolves to
//! [`Flags::DENY`](crate::flags::Flags::DENY).
//!
//! # Error Variants
//!
//! - [`GuardError::NotFound`]: Deleting a namespace that has no registered rule
//! - [`GuardError::InvalidFlags`]: Flag input that is neither an integer nor a letter string
//! - [`GuardError::InvalidRule`]: Rule document entry with an unusable value
//! - [`GuardError::JsonDecode`]: Rule document parsing errors (auto-converts from `serde_json::Error`)
//!
//! # Example
//!
//! ```rust
//! use nsguard::error::GuardError;
//! use nsguard::PermissionSet;
//!
//! fn example() -> Result<(), GuardError> {
//!     let mut pset = PermissionSet::new();
//!     // Deleting an unknown namespace is a lookup failure
//!     pset.delete("a.b")?;
//!     Ok(())
//! }
//!
//! assert!(matches!(example(), Err(GuardError::NotFound { .. })));
//! ```

use thiserror::Error;

/// The main error type for all nsguard operations
#[derive(Error, Debug)]
pub enum GuardError {
    /// No rule is registered under the namespace
    ///
    /// Returned by [`PermissionSet::delete`](crate::PermissionSet::delete).
    /// The set is left unchanged.
    #[error("No permission registered under namespace '{namespace}'")]
    NotFound {
        /// The namespace that was looked up
        namespace: String,
    },

    /// Flag input was neither an integer mask nor a string of flag letters
    #[error("Permission flags need to be a string or integer, found {found}")]
    InvalidFlags {
        /// Rendering of the rejected input
        found: String,
    },

    /// A rule entry could not be turned into a permission
    #[error("Invalid rule for namespace '{namespace}': {reason}")]
    InvalidRule {
        /// Namespace of the offending rule
        namespace: String,
        /// What was wrong with it
        reason: String,
    },

    /// Failed to parse a JSON rule document
    #[error("Failed to parse rule document: {0}")]
    JsonDecode(#[from] serde_json::Error),
}
