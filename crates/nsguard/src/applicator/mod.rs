//! Redaction of nested data against a permission set.
//!
//! An [`Applicator`] walks a [`Data`] value alongside a permission set's
//! read-access map and returns a copy holding only the entries the set
//! permits reading. Containers that end up empty are dropped.
//!
//! # Walk
//!
//! Every entry is looked up in the current map node under its key:
//!
//! 1. **Exact key** - the child node decides
//! 2. **Wildcard** - otherwise a `*` child decides; containers reached this
//!    way keep the enclosing read status instead of taking the node's own
//! 3. **Inherited** - otherwise the nearest ancestor's read status decides
//!
//! Sequence entries are looked up under a derived key rather than their
//! position (see [`DefaultKeyHandler`]).
//!
//! # Handlers
//!
//! [`Handler`]s registered at a path override key derivation below that
//! path, and can require an explicit rule: a subtree behind an explicit
//! handler is only kept when a read rule is registered at exactly that path.
//! Inherited or wildcard grants are not enough. This is enforced with an
//! overlay of deny rules computed for the duration of one call; the
//! permission set itself is only borrowed.
//!
//! # Example
//!
//! ```rust
//! use nsguard::applicator::{Applicator, Handler};
//! use nsguard::{Data, Flags, PermissionSet};
//! use serde_json::json;
//!
//! let pset = PermissionSet::from_iter([("k", Flags::READ)]);
//!
//! let mut applicator = Applicator::new();
//! applicator.handler(Handler::new("k.secret").explicit(true));
//!
//! let data = Data::from(json!({"k": {"secret": {"x": 1}, "public": 2}}));
//! let filtered = applicator.apply(&pset, data);
//! assert_eq!(serde_json::Value::from(filtered), json!({"k": {"public": 2}}));
//! ```

mod handler;
mod namespace_key;

pub use handler::{DefaultKeyHandler, Handler, KeyHandler};
pub use namespace_key::{NamespaceKeyApplicator, DEFAULT_NAMESPACE_KEY};

use crate::data::Data;
use crate::flags::Flags;
use crate::index::ReadAccessNode;
use crate::namespace::Namespace;
use crate::permission_set::PermissionSet;
use handler::HandlerRegistry;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Filters nested data down to its readable entries.
///
/// An applicator holds handlers only; the permission set is passed to each
/// [`apply`](Applicator::apply) call.
#[derive(Debug, Clone, Default)]
pub struct Applicator {
    handlers: HandlerRegistry,
}

impl Applicator {
    /// Creates an applicator without handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any handler at the same path.
    pub fn handler(&mut self, handler: Handler) -> &mut Self {
        self.handlers.register(handler);
        self
    }

    /// Registered handlers in registration order.
    pub fn handlers(&self) -> impl Iterator<Item = &Handler> {
        self.handlers.iter()
    }

    /// Returns the readable part of `data`.
    ///
    /// Maps and sequences are filtered; a leaf is returned unchanged.
    pub fn apply(&self, pset: &PermissionSet, data: Data) -> Data {
        if !data.is_container() {
            return data;
        }

        let denies = self.explicit_denies(pset);
        debug!(
            handlers = self.handlers.len(),
            overlay_denies = denies.len(),
            "applying permissions"
        );
        let ramap: Cow<'_, ReadAccessNode> = if denies.is_empty() {
            Cow::Borrowed(pset.read_access_map())
        } else {
            Cow::Owned(pset.read_access_overlay(denies))
        };

        let mut path = Vec::new();
        self.filter(&ramap, &data, false, false, &mut path)
            .unwrap_or_else(|| empty_like(&data))
    }

    /// Namespaces of explicit handlers that currently grant read only
    /// through inheritance or a wildcard.
    fn explicit_denies(&self, pset: &PermissionSet) -> Vec<Namespace> {
        self.handlers
            .iter()
            .filter(|handler| handler.is_explicit())
            .filter_map(|handler| {
                let namespace = Namespace::new(handler.namespace().as_str());
                if !pset.get_permissions(&namespace, false).allows(Flags::READ) {
                    return None;
                }
                let registered = pset
                    .namespaces()
                    .any(|rule| rule.matches(namespace.tokens(), false));
                if registered {
                    return None;
                }
                trace!(namespace = %namespace, "explicit handler without registered rule");
                Some(namespace)
            })
            .collect()
    }

    /// Filters one value. Returns `None` for a dropped leaf.
    ///
    /// Containers take their status from `ramap` unless reached through a
    /// wildcard node.
    fn filter(
        &self,
        ramap: &ReadAccessNode,
        value: &Data,
        status: bool,
        wildcard: bool,
        path: &mut Vec<String>,
    ) -> Option<Data> {
        let status = if wildcard || !value.is_container() {
            status
        } else {
            ramap.allowed
        };
        let key_fn = self.handlers.find(path.as_slice()).and_then(Handler::key_fn);

        match value {
            Data::Leaf(_) => status.then(|| value.clone()),
            Data::Map(map) => {
                let mut kept = BTreeMap::new();
                for (position, entry) in map {
                    let key = match key_fn {
                        Some(key_fn) => key_fn.key(entry, position),
                        None => position.clone(),
                    };
                    if let Some(entry) = self.filter_entry(ramap, &key, entry, status, path) {
                        kept.insert(key, entry);
                    }
                }
                Some(Data::Map(kept))
            }
            Data::Seq(items) => {
                let key_fn = key_fn.unwrap_or(&DefaultKeyHandler);
                let mut kept = Vec::with_capacity(items.len());
                for (position, entry) in items.iter().enumerate() {
                    let key = key_fn.key(entry, &position.to_string());
                    if let Some(entry) = self.filter_entry(ramap, &key, entry, status, path) {
                        kept.push(entry);
                    }
                }
                Some(Data::Seq(kept))
            }
        }
    }

    /// Decides a single container entry looked up under `key`.
    fn filter_entry(
        &self,
        ramap: &ReadAccessNode,
        key: &str,
        entry: &Data,
        status: bool,
        path: &mut Vec<String>,
    ) -> Option<Data> {
        if !entry.is_container() {
            let readable = match ramap.child(key) {
                Some(node) => node.allowed,
                None => ramap.wildcard().is_some_and(|node| node.allowed) || status,
            };
            return readable.then(|| entry.clone());
        }

        let (node, wildcard) = match (ramap.child(key), ramap.wildcard()) {
            (Some(node), _) => (node, false),
            (None, Some(node)) => (node, true),
            (None, None) => return status.then(|| entry.clone()),
        };

        path.push(key.to_string());
        let filtered = self.filter(node, entry, status, wildcard, path);
        path.pop();
        filtered.filter(|data| !data.is_empty_container())
    }
}

fn empty_like(data: &Data) -> Data {
    match data {
        Data::Seq(_) => Data::Seq(Vec::new()),
        _ => Data::map(),
    }
}
