//! A single permission rule.

use crate::flags::Flags;
use crate::namespace::Namespace;

/// A namespace paired with a permission mask.
///
/// The mask may be unset, which is distinct from [`Flags::DENY`]: an unset
/// rule grants nothing but also carries no value.
///
/// # Example
///
/// ```
/// use nsguard::{Flags, Permission};
///
/// let perm = Permission::new("a.b.c", Flags::RW);
/// assert!(perm.check(Flags::READ));
/// assert!(perm.has_value());
///
/// let unset = Permission::unset("a.b.c");
/// assert!(!unset.has_value());
/// assert!(!unset.check(Flags::READ));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    namespace: Namespace,
    value: Option<Flags>,
}

impl Permission {
    /// Creates a rule granting `mask` on `namespace`.
    pub fn new(namespace: impl Into<Namespace>, mask: impl Into<Flags>) -> Self {
        Self {
            namespace: namespace.into(),
            value: Some(mask.into()),
        }
    }

    /// Creates a rule with no mask assigned.
    pub fn unset(namespace: impl Into<Namespace>) -> Self {
        Self {
            namespace: namespace.into(),
            value: None,
        }
    }

    /// The namespace this rule applies to.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The mask, if one has been assigned.
    pub fn value(&self) -> Option<Flags> {
        self.value
    }

    /// Returns `true` if a mask has been assigned.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Returns `true` if the mask contains any bit of `level`.
    pub fn check(&self, level: Flags) -> bool {
        self.value.is_some_and(|mask| mask.allows(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        let ns = Namespace::new("a.b.c");
        let perm = Permission::new(ns.clone(), Flags::RW);
        assert_eq!(perm.value(), Some(Flags::RW));
        assert_eq!(perm.namespace(), &ns);

        let perm = Permission::new("a.b.c", Flags::RW);
        assert_eq!(perm.namespace().as_str(), "a.b.c");
    }

    #[test]
    fn test_has_value() {
        assert!(Permission::new("a.b.c", Flags::RW).has_value());
        assert!(Permission::new("a.b.c", Flags::DENY).has_value());
        assert!(!Permission::unset("a.b.c").has_value());
    }

    #[test]
    fn test_check() {
        let perm = Permission::new("a.b.c", Flags::RW);
        assert!(perm.check(Flags::READ));
        assert!(perm.check(Flags::WRITE));

        let perm = Permission::new("a.b.c", Flags::READ);
        assert!(perm.check(Flags::READ));
        assert!(!perm.check(Flags::WRITE));

        let perm = Permission::new("a.b.c", Flags::DENY);
        assert!(!perm.check(Flags::READ));
        assert!(!perm.check(Flags::WRITE));
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            Permission::new("a.*", Flags::READ),
            Permission::new("a", Flags::READ)
        );
        assert_ne!(
            Permission::new("a", Flags::READ),
            Permission::new("a", Flags::RW)
        );
    }

    #[test]
    fn test_integer_mask() {
        let perm = Permission::new("a", 0x01u32);
        assert_eq!(perm.value(), Some(Flags::READ));
    }
}
