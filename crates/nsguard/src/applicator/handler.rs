//! Per-path applicator handlers.

use crate::data::Data;
use crate::namespace::Namespace;
use std::fmt;
use std::sync::Arc;

/// Derives the read-access lookup key for a container entry.
///
/// `position` is the entry's map key, or its index rendered as a string for
/// sequences. Implemented for any matching closure.
///
/// # Example
///
/// ```
/// use nsguard::applicator::KeyHandler;
/// use nsguard::Data;
/// use serde_json::json;
///
/// struct ByLevel;
///
/// impl KeyHandler for ByLevel {
///     fn key(&self, row: &Data, position: &str) -> String {
///         row.get("level")
///             .and_then(Data::as_key)
///             .unwrap_or_else(|| position.to_string())
///     }
/// }
///
/// let row = Data::from(json!({"level": "public"}));
/// assert_eq!(ByLevel.key(&row, "0"), "public");
/// ```
pub trait KeyHandler: Send + Sync {
    /// Returns the key `row` is looked up under.
    fn key(&self, row: &Data, position: &str) -> String;
}

impl<F> KeyHandler for F
where
    F: Fn(&Data, &str) -> String + Send + Sync,
{
    fn key(&self, row: &Data, position: &str) -> String {
        self(row, position)
    }
}

/// Key derivation used for sequences without a custom key handler.
///
/// Uses the row's `id` field, then its `name` field, then the position.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyHandler;

impl KeyHandler for DefaultKeyHandler {
    fn key(&self, row: &Data, position: &str) -> String {
        ["id", "name"]
            .iter()
            .find_map(|field| row.get(field).and_then(Data::as_key))
            .unwrap_or_else(|| position.to_string())
    }
}

/// Customization registered on an applicator for one path.
///
/// The path is matched against the traversal path at full length; `*`
/// tokens match any key.
///
/// ```
/// use nsguard::applicator::Handler;
/// use nsguard::Data;
///
/// let handler = Handler::new("nested.*.data")
///     .key(|row: &Data, idx: &str| {
///         row.get("level").and_then(Data::as_key).unwrap_or_else(|| idx.to_string())
///     })
///     .explicit(false);
/// assert_eq!(handler.namespace().as_str(), "nested.*.data");
/// ```
#[derive(Clone)]
pub struct Handler {
    namespace: Namespace,
    key: Option<Arc<dyn KeyHandler>>,
    explicit: bool,
}

impl Handler {
    /// Creates a handler for `path` with no customization.
    pub fn new(path: &str) -> Self {
        Self {
            namespace: Namespace::unstripped(path),
            key: None,
            explicit: false,
        }
    }

    /// Sets a closure deriving lookup keys for entries below this path.
    pub fn key<F>(mut self, key: F) -> Self
    where
        F: Fn(&Data, &str) -> String + Send + Sync + 'static,
    {
        self.key = Some(Arc::new(key));
        self
    }

    /// Sets a shared key handler.
    pub fn key_handler(mut self, key: Arc<dyn KeyHandler>) -> Self {
        self.key = Some(key);
        self
    }

    /// Requires a rule registered at exactly this path for the subtree to be
    /// readable.
    pub fn explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    /// The handler path.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns `true` if the subtree requires an explicit read rule.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// The custom key handler, if any.
    pub fn key_fn(&self) -> Option<&dyn KeyHandler> {
        self.key.as_deref()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("namespace", &self.namespace)
            .field("key", &self.key.as_ref().map(|_| "<fn>"))
            .field("explicit", &self.explicit)
            .finish()
    }
}

/// Ordered handler registry shared by the applicators.
#[derive(Debug, Clone, Default)]
pub(crate) struct HandlerRegistry {
    handlers: Vec<Handler>,
}

impl HandlerRegistry {
    /// Registers `handler`, replacing one already registered at its path.
    pub(crate) fn register(&mut self, handler: Handler) {
        match self
            .handlers
            .iter_mut()
            .find(|existing| existing.namespace.as_str() == handler.namespace.as_str())
        {
            Some(existing) => *existing = handler,
            None => self.handlers.push(handler),
        }
    }

    /// First handler whose path matches `path` at full length.
    pub(crate) fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&Handler> {
        if path.is_empty() {
            return None;
        }
        let path = Namespace::unstripped_from_tokens(path);
        self.handlers
            .iter()
            .find(|handler| path.matches(handler.namespace.tokens(), false))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Handler> {
        self.handlers.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }
}
