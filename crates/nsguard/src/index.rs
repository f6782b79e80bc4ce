//! Permission index and read-access map.
//!
//! The index is a token tree built from a set of rules. Every node records
//! the mask that applies at its path and whether a rule was registered there
//! ([`IndexNode::implicit`] is `false`) or the node only exists to route
//! toward a deeper rule.
//!
//! # Construction
//!
//! Rules are inserted in ascending namespace order. When a rule needs
//! intermediate nodes, each new node copies the mask of its parent, so a
//! shorter rule such as `a` is threaded through the nodes created for a
//! longer rule such as `a.b.c`:
//!
//! ```text
//! a      (READ, explicit)
//! └── b  (READ, implicit)
//!     └── c  (RW, explicit)
//! ```
//!
//! The read-access map mirrors the index one node per node and keeps only
//! whether the node's mask contains [`Flags::READ`].

use crate::flags::Flags;
use crate::namespace::WILDCARD;
use crate::permission::Permission;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// A node of the permission index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexNode {
    /// Mask at this path, registered or inherited when the node was created
    #[serde(serialize_with = "serialize_mask")]
    pub value: Option<Flags>,
    /// `true` when no rule is registered at exactly this path
    pub implicit: bool,
    /// Child nodes keyed by token, including `*`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, IndexNode>,
}

impl IndexNode {
    /// Builds an index from rules.
    ///
    /// Rules must be supplied in ascending namespace order.
    pub fn build<'a, I>(rules: I) -> IndexNode
    where
        I: IntoIterator<Item = &'a Permission>,
    {
        let mut root = IndexNode::default();
        for rule in rules {
            let mut node = &mut root;
            for token in rule.namespace().tokens() {
                let inherited = node.value;
                node = node
                    .children
                    .entry(token.clone())
                    .or_insert_with(|| IndexNode {
                        value: inherited,
                        implicit: true,
                        children: BTreeMap::new(),
                    });
            }
            node.value = rule.value();
            node.implicit = false;
        }
        root
    }

    /// Child under a literal token.
    pub fn child(&self, token: &str) -> Option<&IndexNode> {
        self.children.get(token)
    }

    /// Child under the `*` token.
    pub fn wildcard(&self) -> Option<&IndexNode> {
        self.children.get(WILDCARD)
    }
}

fn serialize_mask<S: Serializer>(value: &Option<Flags>, serializer: S) -> Result<S::Ok, S::Error> {
    value.map(|mask| mask.bits()).serialize(serializer)
}

/// Boolean projection of the index restricted to read access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadAccessNode {
    /// `true` when the corresponding index node grants read
    pub allowed: bool,
    /// Child nodes keyed by token, including `*`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, ReadAccessNode>,
}

impl ReadAccessNode {
    /// Derives the read-access map from an index.
    pub fn project(node: &IndexNode) -> ReadAccessNode {
        ReadAccessNode {
            allowed: node.value.is_some_and(|mask| mask.allows(Flags::READ)),
            children: node
                .children
                .iter()
                .map(|(token, child)| (token.clone(), ReadAccessNode::project(child)))
                .collect(),
        }
    }

    /// Child under a literal token.
    pub fn child(&self, token: &str) -> Option<&ReadAccessNode> {
        self.children.get(token)
    }

    /// Child under the `*` token.
    pub fn wildcard(&self) -> Option<&ReadAccessNode> {
        self.children.get(WILDCARD)
    }
}
