//! Dotted permission namespaces.
//!
//! A [`Namespace`] is an ordered list of tokens such as `org.42.billing`.
//! Tokens are literals, the wildcard `*` or the expansion placeholder `?`.
//!
//! # Normalization
//!
//! [`Namespace::new`] drops trailing wildcard tokens, so `a.b.*` and `a.b`
//! are the same namespace. Handler paths that need to end in a wildcard are
//! built with [`Namespace::unstripped`]. Empty segments are discarded.
//!
//! ```
//! use nsguard::Namespace;
//!
//! let ns = Namespace::new("a.b.*");
//! assert_eq!(ns.as_str(), "a.b");
//! assert_eq!(ns.len(), 2);
//!
//! assert!(Namespace::new("a.b.c").matches(&["a", "*"], true));
//! assert!(!Namespace::new("a.b.c").matches(&["a", "*"], false));
//! ```

use crate::data::Data;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Add;
use std::str::FromStr;

/// Token matching any single segment.
pub const WILDCARD: &str = "*";

/// Token that expands to every concrete segment known to an index.
pub const PLACEHOLDER: &str = "?";

/// A dotted namespace.
///
/// Equality, ordering and hashing use the canonical string form.
#[derive(Debug, Clone)]
pub struct Namespace {
    value: String,
    tokens: Vec<String>,
    strip: bool,
}

impl Namespace {
    /// Parses a dotted string, dropping trailing wildcard tokens.
    pub fn new(value: &str) -> Self {
        Self::parse(value, true)
    }

    /// Parses a dotted string and keeps trailing wildcard tokens.
    pub fn unstripped(value: &str) -> Self {
        Self::parse(value, false)
    }

    /// Builds a namespace from tokens, dropping trailing wildcard tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::parse(&join_tokens(tokens), true)
    }

    /// Builds a namespace from tokens and keeps trailing wildcard tokens.
    pub fn unstripped_from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::parse(&join_tokens(tokens), false)
    }

    fn parse(value: &str, strip: bool) -> Self {
        let mut tokens: Vec<String> = value
            .split('.')
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        if strip {
            while tokens.last().is_some_and(|token| token == WILDCARD) {
                tokens.pop();
            }
        }
        Self {
            value: tokens.join("."),
            tokens,
            strip,
        }
    }

    /// Canonical dotted form.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The namespace tokens in order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` for the empty namespace.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Replaces the token at `index` and re-normalizes.
    ///
    /// Out-of-range indices leave the namespace unchanged.
    pub fn set_token(&mut self, index: usize, token: &str) {
        if let Some(slot) = self.tokens.get_mut(index) {
            *slot = token.to_string();
            *self = Self::parse(&self.tokens.join("."), self.strip);
        }
    }

    /// Concatenates two namespaces.
    pub fn join(&self, other: &Namespace) -> Namespace {
        Self::from_tokens(self.tokens.iter().chain(other.tokens.iter()))
    }

    /// Returns `true` if any token is the `?` placeholder.
    pub fn is_expandable(&self) -> bool {
        self.tokens.iter().any(|token| token == PLACEHOLDER)
    }

    /// Checks whether `keys` structurally match this namespace.
    ///
    /// Keys are compared pairwise with this namespace's tokens; a `*` on
    /// either side matches anything. `keys` longer than this namespace never
    /// match. With `partial` set, `keys` may be a shorter prefix; otherwise
    /// both must have the same length.
    pub fn matches<S: AsRef<str>>(&self, keys: &[S], partial: bool) -> bool {
        if !partial && keys.len() != self.tokens.len() {
            return false;
        }
        if keys.len() > self.tokens.len() {
            return false;
        }
        keys.iter().zip(&self.tokens).all(|(key, token)| {
            let key = key.as_ref();
            token == WILDCARD || key == WILDCARD || key == token
        })
    }

    /// Wraps `data` in nested maps keyed by this namespace's tokens.
    ///
    /// ```
    /// use nsguard::{Data, Namespace};
    /// use serde_json::json;
    ///
    /// let skeleton = Namespace::new("a.b").container(Data::from(json!({"d": 1})));
    /// assert_eq!(serde_json::Value::from(skeleton), json!({"a": {"b": {"d": 1}}}));
    /// ```
    pub fn container(&self, data: Data) -> Data {
        self.tokens.iter().rev().fold(data, |inner, token| {
            Data::Map(BTreeMap::from([(token.clone(), inner)]))
        })
    }
}

fn join_tokens<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|token| token.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(".")
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Namespace {}

impl Hash for Namespace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialOrd for Namespace {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Namespace {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Namespace {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Namespace {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Namespace {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&Namespace> for Namespace {
    fn from(value: &Namespace) -> Self {
        value.clone()
    }
}

impl Add for Namespace {
    type Output = Namespace;

    fn add(self, other: Namespace) -> Namespace {
        self.join(&other)
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Namespace::from)
    }
}
