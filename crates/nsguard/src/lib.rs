//! nsguard - hierarchical namespace permissions
//!
//! This crate evaluates permission rules keyed by dotted namespaces such as
//! `org.42.billing` and uses them to redact nested data.
//!
//! # Overview
//!
//! nsguard provides:
//! - Dotted namespaces with `*` wildcards and `?` placeholders
//! - CRUD permission masks parsed from flag letters
//! - Rule sets with inheritance, wildcard resolution and explicit checks
//! - Expansion of placeholder namespaces into concrete registered paths
//! - Redaction of nested documents down to their readable entries
//!
//! # Architecture
//!
//! - `namespace`: Namespace parsing, matching and container building
//! - `flags`: Permission masks and flag-letter parsing
//! - `permission`: A single rule binding a namespace to a mask
//! - `index`: The token tree built from a rule set and its read-access map
//! - `permission_set`: Rule storage, resolution, checks and expansion
//! - `data`: The nested value the applicators walk
//! - `applicator`: Redaction engines and per-path handlers
//! - `error`: Error types and handling
//!
//! # Example
//!
//! ```rust
//! use nsguard::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), GuardError> {
//! let pset = PermissionSet::from_json(&json!({
//!     "": "r",
//!     "billing": "crud",
//!     "billing.cards": 0,
//! }))?;
//!
//! assert!(pset.check("profile.name", Flags::READ, false));
//! assert!(pset.check("billing.invoices", Flags::UPDATE, false));
//! assert!(!pset.check("billing.cards.4", Flags::READ, false));
//!
//! let data = Data::from(json!({
//!     "profile": {"name": "Ada"},
//!     "billing": {"invoices": [1, 2], "cards": {"visa": "4111"}},
//! }));
//! let filtered = pset.apply(data);
//! assert_eq!(
//!     serde_json::Value::from(filtered),
//!     json!({"profile": {"name": "Ada"}, "billing": {"invoices": [1, 2]}})
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # License
//!
//! Licensed under MIT. See LICENSE file for details.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod applicator;
pub mod data;
pub mod error;
pub mod flags;
pub mod index;
pub mod namespace;
pub mod permission;
pub mod permission_set;

// Public API re-exports
pub use applicator::Applicator;
pub use data::Data;
pub use error::GuardError;
pub use flags::{parse_flags, Flags};
pub use namespace::Namespace;
pub use permission::Permission;
pub use permission_set::PermissionSet;

// Prelude module for common imports
pub mod prelude {
    //! Common imports for nsguard users
    //!
    //! Use `use nsguard::prelude::*;` to import commonly used types.

    pub use crate::applicator::{
        Applicator, DefaultKeyHandler, Handler, KeyHandler, NamespaceKeyApplicator,
    };
    pub use crate::data::Data;
    pub use crate::error::GuardError;
    pub use crate::flags::{parse_flags, Flags};
    pub use crate::namespace::Namespace;
    pub use crate::permission::Permission;
    pub use crate::permission_set::PermissionSet;
}
