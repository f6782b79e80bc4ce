//! Applicator for data that carries its own namespaces.

use super::handler::{Handler, HandlerRegistry};
use crate::data::Data;
use crate::flags::Flags;
use crate::namespace::Namespace;
use crate::permission_set::PermissionSet;
use tracing::trace;

/// Field holding a map's namespace unless configured otherwise.
pub const DEFAULT_NAMESPACE_KEY: &str = "_namespace";

/// Filters data whose maps name their own permission namespace.
///
/// Instead of deriving namespaces from the position in the document, each
/// map may carry its namespace in a field (`"_namespace"` by default). A map
/// whose namespace the set does not permit reading is dropped together with
/// everything below it; otherwise the field is removed and the map's entries
/// are processed the same way. Maps without the field are kept.
///
/// A handler registered at a namespace marks it explicit, so only a rule
/// registered at exactly that namespace grants read.
///
/// # Example
///
/// ```
/// use nsguard::applicator::NamespaceKeyApplicator;
/// use nsguard::{Data, Flags, PermissionSet};
/// use serde_json::json;
///
/// let pset = PermissionSet::from_iter([("org.1", Flags::READ)]);
/// let data = Data::from(json!([
///     {"_namespace": "org.1", "name": "visible"},
///     {"_namespace": "org.2", "name": "hidden"},
/// ]));
///
/// let filtered = NamespaceKeyApplicator::new().apply(&pset, data).unwrap();
/// assert_eq!(serde_json::Value::from(filtered), json!([{"name": "visible"}]));
/// ```
#[derive(Debug, Clone)]
pub struct NamespaceKeyApplicator {
    namespace_key: String,
    remove_namespace_key: bool,
    handlers: HandlerRegistry,
}

impl Default for NamespaceKeyApplicator {
    fn default() -> Self {
        Self {
            namespace_key: DEFAULT_NAMESPACE_KEY.to_string(),
            remove_namespace_key: true,
            handlers: HandlerRegistry::default(),
        }
    }
}

impl NamespaceKeyApplicator {
    /// Creates an applicator reading namespaces from `"_namespace"`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads namespaces from `field` instead.
    pub fn namespace_key(mut self, field: impl Into<String>) -> Self {
        self.namespace_key = field.into();
        self
    }

    /// Keeps the namespace field in permitted maps when set to `false`.
    pub fn remove_namespace_key(mut self, remove: bool) -> Self {
        self.remove_namespace_key = remove;
        self
    }

    /// Registers a handler, replacing any handler at the same namespace.
    pub fn handler(&mut self, handler: Handler) -> &mut Self {
        self.handlers.register(handler);
        self
    }

    /// Returns the readable part of `data`, or `None` if `data` itself is a
    /// map the set does not permit reading.
    pub fn apply(&self, pset: &PermissionSet, data: Data) -> Option<Data> {
        match data {
            Data::Seq(rows) => Some(Data::Seq(
                rows.into_iter()
                    .filter_map(|row| self.apply(pset, row))
                    .collect(),
            )),
            Data::Map(mut map) => {
                let namespace = map
                    .get(&self.namespace_key)
                    .and_then(Data::as_str)
                    .map(Namespace::new)
                    .filter(|namespace| !namespace.is_empty());

                if let Some(namespace) = namespace {
                    let explicit = self
                        .handlers
                        .find(namespace.tokens())
                        .is_some_and(Handler::is_explicit);
                    if !pset.check(&namespace, Flags::READ, explicit) {
                        trace!(namespace = %namespace, explicit, "dropping unreadable entry");
                        return None;
                    }
                    if self.remove_namespace_key {
                        map.remove(&self.namespace_key);
                    }
                }

                Some(Data::Map(
                    map.into_iter()
                        .filter_map(|(key, item)| self.apply(pset, item).map(|item| (key, item)))
                        .collect(),
                ))
            }
            leaf => Some(leaf),
        }
    }
}
