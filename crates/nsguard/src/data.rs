//! Nested data consumed by the redaction walk.
//!
//! [`Data`] is a closed variant over maps, sequences and leaves. Untyped
//! input (usually decoded JSON) is converted into it before filtering and
//! back afterwards.
//!
//! ```
//! use nsguard::Data;
//! use serde_json::json;
//!
//! let data = Data::from(json!({"a": [1, {"id": "x"}]}));
//! assert!(data.is_container());
//! assert_eq!(serde_json::Value::from(data), json!({"a": [1, {"id": "x"}]}));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// A value the applicator can walk.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// Scalar value (string, number, boolean or null)
    Leaf(Value),
    /// Keyed container
    Map(BTreeMap<String, Data>),
    /// Ordered container
    Seq(Vec<Data>),
}

impl Data {
    /// An empty map.
    pub fn map() -> Self {
        Data::Map(BTreeMap::new())
    }

    /// Returns `true` for maps and sequences.
    pub fn is_container(&self) -> bool {
        !matches!(self, Data::Leaf(_))
    }

    /// Returns `true` for empty maps and sequences. Leaves are never empty.
    pub fn is_empty_container(&self) -> bool {
        match self {
            Data::Leaf(_) => false,
            Data::Map(map) => map.is_empty(),
            Data::Seq(seq) => seq.is_empty(),
        }
    }

    /// Looks up `key` in a map.
    pub fn get(&self, key: &str) -> Option<&Data> {
        match self {
            Data::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Returns the string content of a string leaf.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::Leaf(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Coerces a leaf into a lookup key.
    ///
    /// Strings are used as-is, other scalars use their JSON rendering.
    /// Containers and `null` have no key form.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Data::Leaf(Value::String(s)) => Some(s.clone()),
            Data::Leaf(Value::Null) => None,
            Data::Leaf(other) => Some(other.to_string()),
            _ => None,
        }
    }
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Data::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
            Value::Array(items) => Data::Seq(items.into_iter().map(Data::from).collect()),
            leaf => Data::Leaf(leaf),
        }
    }
}

impl From<Data> for Value {
    fn from(data: Data) -> Self {
        match data {
            Data::Leaf(value) => value,
            Data::Map(map) => Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
            Data::Seq(items) => Value::Array(items.into_iter().map(Value::from).collect()),
        }
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::Leaf(Value::String(s.to_string()))
    }
}

impl Serialize for Data {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Data::Leaf(value) => value.serialize(serializer),
            Data::Map(map) => map.serialize(serializer),
            Data::Seq(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Data {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Data::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_shapes() {
        let data = Data::from(json!({"a": {"b": [1, "two", null]}}));
        let Data::Map(root) = &data else {
            panic!("expected map");
        };
        let Some(Data::Map(a)) = root.get("a") else {
            panic!("expected nested map");
        };
        let Some(Data::Seq(b)) = a.get("b") else {
            panic!("expected sequence");
        };
        assert_eq!(b.len(), 3);
        assert_eq!(b[0], Data::Leaf(json!(1)));
        assert_eq!(b[2], Data::Leaf(Value::Null));
    }

    #[test]
    fn test_back_to_json() {
        let original = json!({"x": [{"id": 1}, true], "y": "z"});
        let value: Value = Data::from(original.clone()).into();
        assert_eq!(value, original);
    }

    #[test]
    fn test_as_key() {
        assert_eq!(Data::from("b").as_key().as_deref(), Some("b"));
        assert_eq!(Data::Leaf(json!(42)).as_key().as_deref(), Some("42"));
        assert_eq!(Data::Leaf(json!(true)).as_key().as_deref(), Some("true"));
        assert_eq!(Data::Leaf(Value::Null).as_key(), None);
        assert_eq!(Data::map().as_key(), None);
    }

    #[test]
    fn test_container_predicates() {
        assert!(Data::map().is_container());
        assert!(Data::map().is_empty_container());
        assert!(Data::Seq(vec![]).is_empty_container());
        assert!(!Data::from("x").is_container());
        assert!(!Data::from("x").is_empty_container());
    }

    #[test]
    fn test_serde_round_trip_through_text() {
        let data: Data = serde_json::from_str(r#"{"k": [1, 2]}"#).unwrap();
        assert_eq!(serde_json::to_string(&data).unwrap(), r#"{"k":[1,2]}"#);
    }
}
