//! Rule sets and permission resolution.
//!
//! A [`PermissionSet`] owns its rules together with two derived structures,
//! the [index](crate::index::IndexNode) and the
//! [read-access map](crate::index::ReadAccessNode). Every mutation rebuilds
//! both from scratch.
//!
//! # Resolution
//!
//! A query walks the index along the queried tokens. At each position two
//! branches may apply: the child under the literal token and the child
//! under `*`. Both are explored and the deeper, more specific result wins,
//! with two refinements:
//!
//! - a wildcard result only overrides the literal branch when the current
//!   node is itself a routing (implicit) node, or the query is explicit;
//! - a literal result that merely routes toward another rule does not
//!   replace a value already inherited from an explicit ancestor.
//!
//! Explicit queries additionally require the walk to end on a registered
//! rule covering every queried token.
//!
//! # Example
//!
//! ```
//! use nsguard::{Flags, PermissionSet};
//!
//! let pset = PermissionSet::from_iter([
//!     ("a", Flags::READ),
//!     ("a.b.c", Flags::RW),
//!     ("a.b.*.d", Flags::DENY),
//! ]);
//!
//! assert!(pset.check("a.b", Flags::READ, false));
//! assert!(pset.check("a.b.c", Flags::WRITE, false));
//! assert!(!pset.check("a.b.x.d", Flags::READ, false));
//! assert!(!pset.check("a.b", Flags::READ, true));
//! ```

use crate::applicator::Applicator;
use crate::data::Data;
use crate::error::GuardError;
use crate::flags::Flags;
use crate::index::{IndexNode, ReadAccessNode};
use crate::namespace::{Namespace, PLACEHOLDER, WILDCARD};
use crate::permission::Permission;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// A set of namespace rules with a resolution index.
///
/// Rules are keyed by canonical namespace string; registering the same
/// namespace twice replaces the earlier rule.
///
/// The set performs no internal locking. Share it behind an
/// `Arc<RwLock<_>>` when rules are mutated while other threads query.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    permissions: BTreeMap<String, Permission>,
    index: IndexNode,
    read_access_map: ReadAccessNode,
}

/// Outcome of walking one branch of the index.
#[derive(Debug, Clone, Copy)]
struct Resolution {
    mask: Option<Flags>,
    depth: usize,
    implicit: bool,
}

impl Resolution {
    /// A branch that could not be followed.
    const UNREACHED: Resolution = Resolution {
        mask: None,
        depth: 0,
        implicit: true,
    };
}

impl PermissionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set from rules.
    pub fn from_rules<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        let mut pset = Self::new();
        for rule in rules {
            pset.permissions
                .insert(rule.namespace().to_string(), rule);
        }
        pset.update_index();
        pset
    }

    /// Creates a set from a JSON object of namespace to mask.
    ///
    /// Masks are integers or flag-letter strings. `null` registers a rule
    /// without a mask.
    ///
    /// ```
    /// use nsguard::{Flags, PermissionSet};
    /// use serde_json::json;
    ///
    /// let pset = PermissionSet::from_json(&json!({"a": "r", "a.b": 15})).unwrap();
    /// assert!(pset.check("a.b", Flags::DELETE, false));
    ///
    /// assert!(PermissionSet::from_json(&json!({"a": [1]})).is_err());
    /// ```
    pub fn from_json(rules: &Value) -> Result<Self, GuardError> {
        let Value::Object(entries) = rules else {
            return Err(GuardError::InvalidRule {
                namespace: String::new(),
                reason: format!("expected an object of namespace rules, found {rules}"),
            });
        };
        let mut parsed = Vec::with_capacity(entries.len());
        for (namespace, mask) in entries {
            parsed.push(rule_from_value(namespace, mask)?);
        }
        Ok(Self::from_rules(parsed))
    }

    /// Parses a JSON rule document.
    pub fn from_json_str(text: &str) -> Result<Self, GuardError> {
        let rules: Value = serde_json::from_str(text)?;
        Self::from_json(&rules)
    }

    /// Registers a rule, replacing any rule at the same namespace.
    pub fn add(&mut self, rule: Permission) {
        debug!(namespace = %rule.namespace(), "adding permission rule");
        self.permissions
            .insert(rule.namespace().to_string(), rule);
        self.update_index();
    }

    /// Registers `mask` at `namespace`, replacing any existing rule.
    pub fn set(&mut self, namespace: impl Into<Namespace>, mask: impl Into<Flags>) {
        self.add(Permission::new(namespace, mask));
    }

    /// Registers an untyped mask at `namespace`.
    ///
    /// Fails without touching the set when `mask` is neither an integer nor
    /// a flag-letter string. `null` registers the rule without a mask.
    pub fn set_value(&mut self, namespace: impl Into<Namespace>, mask: &Value) -> Result<(), GuardError> {
        let namespace = namespace.into();
        let rule = rule_from_value(namespace.as_str(), mask)?;
        self.add(rule);
        Ok(())
    }

    /// Removes the rule at `namespace`.
    ///
    /// Returns [`GuardError::NotFound`] when no rule is registered there.
    pub fn delete(&mut self, namespace: impl Into<Namespace>) -> Result<Permission, GuardError> {
        let namespace = namespace.into();
        let removed = self
            .permissions
            .remove(namespace.as_str())
            .ok_or_else(|| GuardError::NotFound {
                namespace: namespace.to_string(),
            })?;
        debug!(namespace = %namespace, "removed permission rule");
        self.update_index();
        Ok(removed)
    }

    /// Registers several rules with a single rebuild.
    ///
    /// With `override_existing` unset, namespaces that already have a rule
    /// keep it.
    pub fn update<I>(&mut self, rules: I, override_existing: bool)
    where
        I: IntoIterator<Item = Permission>,
    {
        for rule in rules {
            let key = rule.namespace().to_string();
            if !override_existing && self.permissions.contains_key(&key) {
                trace!(namespace = %key, "keeping existing rule");
                continue;
            }
            self.permissions.insert(key, rule);
        }
        self.update_index();
    }

    /// Rebuilds the index and read-access map from the registered rules.
    pub fn update_index(&mut self) -> &IndexNode {
        self.index = IndexNode::build(self.permissions.values());
        self.read_access_map = ReadAccessNode::project(&self.index);
        debug!(rules = self.permissions.len(), "rebuilt permission index");
        &self.index
    }

    /// Namespaces with a registered rule, in ascending order.
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.permissions.values().map(Permission::namespace)
    }

    /// Registered rules, in ascending namespace order.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.values()
    }

    /// Returns `true` if a rule is registered at exactly `namespace`.
    pub fn contains(&self, namespace: impl Into<Namespace>) -> bool {
        self.permissions.contains_key(namespace.into().as_str())
    }

    /// Rule registered at exactly `namespace`.
    pub fn get(&self, namespace: impl Into<Namespace>) -> Option<&Permission> {
        self.permissions.get(namespace.into().as_str())
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Returns `true` if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// The resolution index.
    pub fn index(&self) -> &IndexNode {
        &self.index
    }

    /// The read-access map consumed by [`Applicator`].
    pub fn read_access_map(&self) -> &ReadAccessNode {
        &self.read_access_map
    }

    /// Read-access map for the current rules plus deny rules at `denies`.
    ///
    /// The set itself is not modified.
    pub fn read_access_overlay<I>(&self, denies: I) -> ReadAccessNode
    where
        I: IntoIterator<Item = Namespace>,
    {
        let mut rules = self.permissions.clone();
        for namespace in denies {
            trace!(namespace = %namespace, "overlay deny");
            rules.insert(
                namespace.to_string(),
                Permission::new(namespace, Flags::DENY),
            );
        }
        ReadAccessNode::project(&IndexNode::build(rules.values()))
    }

    /// Resolves the effective mask for `namespace`.
    ///
    /// With `explicit` set, only a rule registered at the full namespace
    /// counts; inherited and routing values resolve to [`Flags::DENY`].
    pub fn get_permissions(&self, namespace: impl Into<Namespace>, explicit: bool) -> Flags {
        let namespace = namespace.into();
        let resolution = resolve(
            namespace.tokens(),
            &self.index,
            self.index.value,
            0,
            explicit,
        );
        let mask = match resolution.mask {
            Some(mask)
                if !(explicit
                    && (resolution.implicit || resolution.depth != namespace.len())) =>
            {
                mask
            }
            _ => Flags::DENY,
        };
        trace!(namespace = %namespace, explicit, mask = mask.bits(), "resolved permissions");
        mask
    }

    /// Checks whether `namespace` grants any bit of `level`.
    ///
    /// Namespaces containing `?` are expanded against the index and the
    /// check succeeds if any expansion grants `level`.
    pub fn check(&self, namespace: impl Into<Namespace>, level: Flags, explicit: bool) -> bool {
        let namespace = namespace.into();
        if namespace.is_expandable() {
            return self
                .expand(&namespace, false, false)
                .iter()
                .any(|candidate| self.get_permissions(candidate, explicit).allows(level));
        }
        self.get_permissions(namespace, explicit).allows(level)
    }

    /// Returns `true` if `namespace` contains a `?` placeholder.
    pub fn expandable(&self, namespace: impl Into<Namespace>) -> bool {
        namespace.into().is_expandable()
    }

    /// Expands `?` placeholders into the namespaces known to the index.
    ///
    /// A `?` matches every child token. A `*` in the index matches any
    /// queried token and is replaced by that token in the output, unless the
    /// queried token is `?`. With `exact` set only expansions of the full
    /// queried length are returned; with `explicit` set only nodes carrying
    /// a mask are returned. Results are deduplicated and sorted.
    ///
    /// ```
    /// use nsguard::{Flags, Namespace, PermissionSet};
    ///
    /// let pset = PermissionSet::from_iter([("x.y.z", Flags::READ), ("x.w.z", Flags::READ)]);
    /// let expanded = pset.expand("x.?.z", false, true);
    /// assert_eq!(expanded, vec![Namespace::new("x.w.z"), Namespace::new("x.y.z")]);
    /// ```
    pub fn expand(&self, namespace: impl Into<Namespace>, explicit: bool, exact: bool) -> Vec<Namespace> {
        let namespace = namespace.into();
        let mut found = BTreeSet::new();
        let mut path = Vec::with_capacity(namespace.len());
        expand_into(
            &self.index,
            namespace.tokens(),
            namespace.len(),
            &mut path,
            Expansion { explicit, exact },
            &mut found,
        );
        found.into_iter().collect()
    }

    /// Removes every entry of `data` the set does not permit reading.
    ///
    /// Shorthand for running a default [`Applicator`].
    pub fn apply(&self, data: Data) -> Data {
        Applicator::new().apply(self, data)
    }
}

fn rule_from_value(namespace: &str, mask: &Value) -> Result<Permission, GuardError> {
    if mask.is_null() {
        return Ok(Permission::unset(namespace));
    }
    let flags = Flags::from_value(mask).map_err(|err| GuardError::InvalidRule {
        namespace: namespace.to_string(),
        reason: err.to_string(),
    })?;
    Ok(Permission::new(namespace, flags))
}

/// Walks the index from `node` along `tokens[position..]`.
fn resolve(
    tokens: &[String],
    node: &IndexNode,
    inherited: Option<Flags>,
    position: usize,
    explicit: bool,
) -> Resolution {
    let here = Resolution {
        mask: inherited,
        depth: position,
        implicit: node.implicit,
    };
    let Some(token) = tokens.get(position) else {
        return here;
    };
    let last = position + 1 >= tokens.len();

    let follow = |child: Option<&IndexNode>| match child {
        // an explicit query cannot end on a routing node
        Some(child) if explicit && child.implicit && last => Resolution::UNREACHED,
        Some(child) => resolve(tokens, child, child.value, position + 1, explicit),
        None => Resolution::UNREACHED,
    };
    let exact = follow(node.child(token));
    let wild = follow(node.wildcard());

    if explicit && exact.depth == 0 && wild.depth == 0 {
        return Resolution { mask: None, ..here };
    }

    let routing = node.implicit || explicit;
    if wild.mask.is_some() && (!explicit || !wild.implicit) && routing {
        if exact.depth < wild.depth && (!wild.implicit || exact.implicit) {
            return wild;
        }
        if exact.mask.is_none() {
            return wild;
        }
    }
    if exact.mask.is_some()
        && (!explicit || !exact.implicit)
        && position < exact.depth
        && (!exact.implicit || node.implicit || inherited.is_none())
    {
        return exact;
    }
    here
}

#[derive(Debug, Clone, Copy)]
struct Expansion {
    explicit: bool,
    exact: bool,
}

fn expand_into(
    node: &IndexNode,
    tokens: &[String],
    length: usize,
    path: &mut Vec<String>,
    opts: Expansion,
    found: &mut BTreeSet<Namespace>,
) {
    let Some((token, rest)) = tokens.split_first() else {
        return;
    };
    for (key, child) in &node.children {
        if token != key && token != PLACEHOLDER && key != WILDCARD {
            continue;
        }
        let segment = if key == WILDCARD && token != PLACEHOLDER {
            token
        } else {
            key
        };
        path.push(segment.clone());
        if (path.len() == length || !opts.exact) && (child.value.is_some() || !opts.explicit) {
            let candidate = Namespace::from_tokens(path.iter());
            if !candidate.is_empty() {
                found.insert(candidate);
            }
        }
        expand_into(child, rest, length, path, opts, found);
        path.pop();
    }
}

impl PartialEq for PermissionSet {
    fn eq(&self, other: &Self) -> bool {
        self.permissions == other.permissions
    }
}

impl Eq for PermissionSet {}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(rules: I) -> Self {
        Self::from_rules(rules)
    }
}

impl<N, M> FromIterator<(N, M)> for PermissionSet
where
    N: Into<Namespace>,
    M: Into<Flags>,
{
    fn from_iter<I: IntoIterator<Item = (N, M)>>(rules: I) -> Self {
        Self::from_rules(
            rules
                .into_iter()
                .map(|(namespace, mask)| Permission::new(namespace, mask)),
        )
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.permissions.len()))?;
        for (namespace, rule) in &self.permissions {
            map.serialize_entry(namespace, &rule.value().map(|mask| mask.bits()))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rules = Value::deserialize(deserializer)?;
        Self::from_json(&rules).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pdict() -> PermissionSet {
        PermissionSet::from_iter([
            ("a", Flags::READ),
            ("a.b.c", Flags::RW),
            ("a.b.*.d", Flags::DENY),
            ("a.c", Flags::WRITE),
            ("b.c", Flags::READ),
            ("k", Flags::READ),
            ("k.x.y", Flags::DENY),
            ("l", Flags::READ),
            ("l.*.y", Flags::DENY),
        ])
    }

    fn pdict2() -> PermissionSet {
        PermissionSet::from_iter([
            ("a", Flags::READ),
            ("a.b.c", Flags::RW),
            ("a.b.e", Flags::DENY),
            ("a.b.*.d", Flags::DENY),
            ("e.f", Flags::READ),
            ("e.*.g", Flags::WRITE),
            ("e.*.g.a", Flags::READ),
            ("e.*.g.b", Flags::RW),
            ("e.h.g", Flags::DENY),
            ("f.g", Flags::READ),
        ])
    }

    #[test]
    fn test_init_from_rules() {
        let p1 = Permission::new("a", Flags::READ);
        let p2 = Permission::new("a.b.c", Flags::RW);
        let pset = PermissionSet::from_rules([p1.clone(), p2.clone()]);
        assert_eq!(pset.get("a"), Some(&p1));
        assert_eq!(pset.get("a.b.c"), Some(&p2));

        let pset = pdict();
        assert_eq!(pset.get("a"), Some(&p1));
        assert_eq!(pset.get("a.b.c"), Some(&p2));
    }

    #[test]
    fn test_update_index() {
        let pset = pdict();
        let expected = json!({
            "value": null,
            "implicit": false,
            "children": {
                "a": {"value": 1, "implicit": false, "children": {
                    "c": {"value": 14, "implicit": false},
                    "b": {"value": 1, "implicit": true, "children": {
                        "c": {"value": 15, "implicit": false},
                        "*": {"value": 1, "implicit": true, "children": {
                            "d": {"value": 0, "implicit": false}
                        }}
                    }}
                }},
                "b": {"value": null, "implicit": true, "children": {
                    "c": {"value": 1, "implicit": false}
                }},
                "k": {"value": 1, "implicit": false, "children": {
                    "x": {"value": 1, "implicit": true, "children": {
                        "y": {"value": 0, "implicit": false}
                    }}
                }},
                "l": {"value": 1, "implicit": false, "children": {
                    "*": {"value": 1, "implicit": true, "children": {
                        "y": {"value": 0, "implicit": false}
                    }}
                }}
            }
        });
        assert_eq!(serde_json::to_value(pset.index()).unwrap(), expected);
    }

    #[test]
    fn test_rebuild_twice_is_identical() {
        let mut pset = pdict();
        let index = pset.index().clone();
        let ramap = pset.read_access_map().clone();
        pset.update_index();
        pset.update_index();
        assert_eq!(pset.index(), &index);
        assert_eq!(pset.read_access_map(), &ramap);
    }

    #[test]
    fn test_contains() {
        let pset = pdict();
        assert!(pset.contains("a"));
        assert!(pset.contains("a.b.c"));
        assert!(!pset.contains("x"));
    }

    #[test]
    fn test_update() {
        let mut pset = pdict();
        pset.update(
            [
                Permission::new("x", Flags::READ),
                Permission::new("z", Flags::READ),
            ],
            true,
        );
        assert!(pset.contains("a"));
        assert!(pset.contains("a.b.c"));
        assert!(pset.check("x", Flags::READ, false));
        assert!(pset.check("z", Flags::READ, false));
    }

    #[test]
    fn test_update_without_override() {
        let mut pset = pdict();
        pset.update(
            [
                Permission::new("a", Flags::DENY),
                Permission::new("new", Flags::READ),
            ],
            false,
        );
        assert_eq!(pset.get("a").unwrap().value(), Some(Flags::READ));
        assert!(pset.contains("new"));

        pset.update([Permission::new("a", Flags::DENY)], true);
        assert_eq!(pset.get("a").unwrap().value(), Some(Flags::DENY));
    }

    #[test]
    fn test_set_and_delete() {
        let mut pset = PermissionSet::new();
        pset.set("a", Flags::READ);
        pset.set("a.b", Flags::RW);
        pset.set("b", Flags::READ);

        assert!(pset.get("a").unwrap().check(Flags::READ));
        assert!(pset.get("a.b").unwrap().check(Flags::WRITE));
        assert!(pset.get("b").unwrap().check(Flags::READ));

        pset.set("a.b", Flags::READ);
        assert!(!pset.get("a.b").unwrap().check(Flags::WRITE));

        let removed = pset.delete("b").unwrap();
        assert_eq!(removed.namespace().as_str(), "b");
        assert!(!pset.contains("b"));
        assert!(!pset.check("b", Flags::READ, false));
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let mut pset = pdict();
        let before = pset.clone();
        let err = pset.delete("nope").unwrap_err();
        assert!(matches!(err, GuardError::NotFound { ref namespace } if namespace == "nope"));
        assert_eq!(pset, before);
    }

    #[test]
    fn test_set_value_type_error_leaves_set_untouched() {
        let mut pset = pdict();
        let before = pset.clone();
        let err = pset.set_value("a.z", &json!({"r": true})).unwrap_err();
        assert!(matches!(err, GuardError::InvalidRule { .. }));
        assert_eq!(pset, before);

        pset.set_value("a.z", &json!("ru")).unwrap();
        assert_eq!(
            pset.get("a.z").unwrap().value(),
            Some(Flags::READ | Flags::UPDATE)
        );
    }

    #[test]
    fn test_wildcard_namespace_key_is_canonical() {
        let mut pset = PermissionSet::new();
        pset.set("a.b.*", Flags::READ);
        assert!(pset.contains("a.b"));
        assert_eq!(pset.namespaces().map(Namespace::as_str).collect::<Vec<_>>(), ["a.b"]);
    }

    #[test]
    fn test_check() {
        let pset = pdict2();
        assert!(pset.check("a.b", Flags::READ, false));
        assert!(pset.check("a.b.c", Flags::WRITE, false));
        assert!(pset.check("a.b.d", Flags::READ, false));
        assert!(!pset.check("a.b.c.d", Flags::READ, false));
        assert!(pset.check("e.f", Flags::READ, false));
        assert!(!pset.check("e", Flags::READ, false));
        assert!(pset.check("e.j.g", Flags::WRITE, false));
        assert!(!pset.check("e.k.g.a", Flags::WRITE, false));
        assert!(!pset.check("e.h.g", Flags::READ, false));
        assert!(!pset.check("e.h.g.a", Flags::WRITE, false));
        assert!(!pset.check("e.m.g.a", Flags::WRITE, false));
        assert!(pset.check("e.m.g.b", Flags::RW, false));
        assert!(!pset.check("f", Flags::WRITE, false));
        assert!(pset.check("f.g", Flags::READ, false));
    }

    #[test]
    fn test_check_explicit() {
        let pset = pdict();
        assert!(!pset.check("a.b", Flags::READ, true));
        assert!(pset.check("a", Flags::READ, true));
        assert!(!pset.check("a", Flags::WRITE, true));
        assert!(pset.check("a.b.c", Flags::WRITE, true));
        assert!(pset.check("a.b.c", Flags::READ, true));
    }

    #[test]
    fn test_specificity_ordering() {
        let pset = PermissionSet::from_iter([("a", Flags::READ), ("a.b.c", Flags::RW)]);
        assert!(!pset.check("a.b.d", Flags::WRITE, false));
        assert!(pset.check("a.b.c", Flags::WRITE, false));
        assert!(pset.check("a.b", Flags::READ, false));
    }

    #[test]
    fn test_wildcard_deny_overrides_ancestor() {
        let pset = PermissionSet::from_iter([("a", Flags::READ), ("a.b.*.d", Flags::DENY)]);
        assert!(!pset.check("a.b.x.d", Flags::READ, false));
        assert!(pset.check("a.b.x", Flags::READ, false));
    }

    #[test]
    fn test_explicit_requires_registration() {
        let mut pset = PermissionSet::from_iter([("a", Flags::READ)]);
        assert!(!pset.check("a.b", Flags::READ, true));
        assert!(pset.check("a.b", Flags::READ, false));

        pset.set("a.b", Flags::READ);
        assert!(pset.check("a.b", Flags::READ, true));
    }

    #[test]
    fn test_explicit_partial_prefix_is_not_a_match() {
        let pset = PermissionSet::from_iter([("a", Flags::READ), ("a.b.c", Flags::READ)]);
        assert_eq!(pset.get_permissions("a.b", true), Flags::DENY);
        assert_eq!(pset.get_permissions("a.b.c.d", true), Flags::DENY);
        assert_eq!(pset.get_permissions("a.b.c", true), Flags::READ);
    }

    #[test]
    fn test_unregistered_namespace_is_deny() {
        let pset = pdict();
        assert_eq!(pset.get_permissions("zzz", false), Flags::DENY);
        assert_eq!(pset.get_permissions("zzz.yyy", true), Flags::DENY);
        assert_eq!(PermissionSet::new().get_permissions("a", false), Flags::DENY);
    }

    #[test]
    fn test_get_permissions_values() {
        let pset = pdict2();
        assert_eq!(pset.get_permissions("a.b.c", false), Flags::RW);
        assert_eq!(pset.get_permissions("a.b.x", false), Flags::READ);
        assert_eq!(pset.get_permissions("e.j.g", false), Flags::WRITE);
        assert_eq!(pset.get_permissions("e.m.g.b", false), Flags::RW);
    }

    #[test]
    fn test_expandable() {
        let pset = pdict();
        assert!(pset.expandable("a.?"));
        assert!(!pset.expandable("a.*"));
    }

    #[test]
    fn test_wildcard_expansion_check() {
        let pset = PermissionSet::from_iter([("x.*.z", Flags::READ), ("x.*.x", Flags::RW)]);
        assert!(pset.check("x.?.z", Flags::READ, false));
        assert!(pset.check("x.?.x", Flags::WRITE, false));
        assert!(!pset.check("x.?.z", Flags::WRITE, false));
        assert!(!pset.check("a.?", Flags::READ, false));
    }

    #[test]
    fn test_expand_exact() {
        let pset = PermissionSet::from_iter([
            ("x.y.z", Flags::READ),
            ("x.w.z", Flags::READ),
            ("x.w.q", Flags::READ),
        ]);
        let expanded = pset.expand("x.?.z", false, true);
        assert_eq!(
            expanded,
            vec![Namespace::new("x.w.z"), Namespace::new("x.y.z")]
        );
    }

    #[test]
    fn test_expand_not_exact_includes_prefixes() {
        let pset = PermissionSet::from_iter([("x.y.z", Flags::READ)]);
        let expanded = pset.expand("x.?.z", false, false);
        assert_eq!(
            expanded,
            vec![
                Namespace::new("x"),
                Namespace::new("x.y"),
                Namespace::new("x.y.z"),
            ]
        );
    }

    #[test]
    fn test_expand_substitutes_wildcard() {
        let pset = PermissionSet::from_iter([("x.*.z", Flags::READ), ("x.k.z", Flags::READ)]);
        // a literal token walks both the literal and the wildcard child
        let expanded = pset.expand("x.k.?", false, true);
        assert_eq!(expanded, vec![Namespace::new("x.k.z")]);

        // `?` over a wildcard keeps the wildcard
        let expanded = pset.expand("x.?.z", false, true);
        assert_eq!(
            expanded,
            vec![Namespace::new("x.*.z"), Namespace::new("x.k.z")]
        );
    }

    #[test]
    fn test_expand_explicit_skips_valueless_nodes() {
        let pset = PermissionSet::from_iter([("b.c", Flags::READ)]);
        assert_eq!(
            pset.expand("?.?", true, false),
            vec![Namespace::new("b.c")]
        );
        assert_eq!(
            pset.expand("?.?", false, false),
            vec![Namespace::new("b"), Namespace::new("b.c")]
        );
    }

    #[test]
    fn test_expanded_explicit_check() {
        let pset = PermissionSet::from_iter([("a", Flags::READ), ("a.b", Flags::READ)]);
        assert!(pset.check("a.?", Flags::READ, true));
        let pset = PermissionSet::from_iter([("a.b.c", Flags::READ)]);
        assert!(!pset.check("?.b", Flags::READ, true));
        assert!(pset.check("?.b.c", Flags::READ, true));
    }

    #[test]
    fn test_global_default_rule() {
        let pset = PermissionSet::from_iter([("", Flags::READ), ("x", Flags::DENY)]);
        assert!(pset.check("anything.at.all", Flags::READ, false));
        assert!(!pset.check("x.y", Flags::READ, false));
    }

    #[test]
    fn test_from_json() {
        let pset = PermissionSet::from_json(&json!({
            "a": 1,
            "a.b": "crud",
            "c": null,
        }))
        .unwrap();
        assert_eq!(pset.get("a").unwrap().value(), Some(Flags::READ));
        assert_eq!(pset.get("a.b").unwrap().value(), Some(Flags::RW));
        assert_eq!(pset.get("c").unwrap().value(), None);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = PermissionSet::from_json(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, GuardError::InvalidRule { .. }));
    }

    #[test]
    fn test_from_json_str() {
        let pset = PermissionSet::from_json_str(r#"{"a": "r"}"#).unwrap();
        assert!(pset.check("a", Flags::READ, true));
        assert!(matches!(
            PermissionSet::from_json_str("{ nope").unwrap_err(),
            GuardError::JsonDecode(_)
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let pset = pdict();
        let value = serde_json::to_value(&pset).unwrap();
        assert_eq!(value["a.c"], json!(14));
        let restored: PermissionSet = serde_json::from_value(value).unwrap();
        assert_eq!(restored, pset);
    }

    #[test]
    fn test_serde_round_trip_keeps_unset_rule() {
        let mut pset = PermissionSet::from_iter([("a.*.c", Flags::READ), ("a.b.c", Flags::RW)]);
        pset.add(Permission::unset("a"));

        let value = serde_json::to_value(&pset).unwrap();
        assert_eq!(value, json!({"a": null, "a.*.c": 1, "a.b.c": 15}));

        let restored: PermissionSet = serde_json::from_value(value).unwrap();
        assert_eq!(restored, pset);
        assert!(!restored.get("a").unwrap().has_value());
        assert!(restored.expand("a.?", true, false).is_empty());
        assert!(restored.expand("?", true, false).is_empty());
    }

    #[test]
    fn test_null_and_false_masks_differ() {
        let mut pset = PermissionSet::from_json(&json!({"a": null, "b": false, "c": ""})).unwrap();
        assert!(!pset.get("a").unwrap().has_value());
        assert_eq!(pset.get("b").unwrap().value(), Some(Flags::DENY));
        assert_eq!(pset.get("c").unwrap().value(), Some(Flags::DENY));

        pset.set_value("b", &json!(null)).unwrap();
        assert!(!pset.get("b").unwrap().has_value());
    }

    #[test]
    fn test_read_access_overlay_does_not_mutate() {
        let pset = pdict();
        let before = pset.clone();
        let overlay = pset.read_access_overlay([Namespace::new("k.a.nested")]);
        let k = overlay.child("k").unwrap();
        assert!(k.child("a").unwrap().allowed);
        assert!(!k.child("a").unwrap().child("nested").unwrap().allowed);
        assert_eq!(pset, before);
        assert!(pset.read_access_map().child("k").unwrap().child("a").is_none());
    }

    #[test]
    fn test_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PermissionSet>();
    }
}
