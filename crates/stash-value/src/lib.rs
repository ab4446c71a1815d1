//! Value model for Stash.
//!
//! [`Value`] is the in-process value space shared by every storage backend:
//! scalars (null, boolean, integer, float, string), binary blobs, and the two
//! composites (sequence, string-keyed map). The model itself is
//! unrestricted -- a backend whose encoding cannot represent a particular
//! value (the file backend's text format, for example) rejects it at its own
//! boundary, identifying the offending kind by the name [`Value::kind`]
//! reports.

use std::collections::BTreeMap;

/// A value storable under a key.
///
/// `Null` is a real value: a key mapped to `Null` is present, observably
/// distinct from an absent key.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Int(i64),
    /// A 64-bit float. Text-encoding backends bound its magnitude.
    Float(f64),
    /// A UTF-8 string.
    Str(String),
    /// Arbitrary binary content.
    Bytes(Vec<u8>),
    /// An ordered sequence of values.
    Seq(Vec<Value>),
    /// A string-keyed map with deterministic iteration order.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of this value's kind, as used in error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Seq(_) => "seq",
            Value::Map(_) => "map",
        }
    }

    /// Returns `true` if this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The float payload, if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The string payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The binary payload, if this is a `Bytes`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The items, if this is a `Seq`.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// The entries, if this is a `Map`.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Seq(iter.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_cover_every_variant() {
        assert_eq!(Value::Null.kind(), "null");
        assert_eq!(Value::Bool(true).kind(), "bool");
        assert_eq!(Value::Int(7).kind(), "int");
        assert_eq!(Value::Float(0.5).kind(), "float");
        assert_eq!(Value::Str("x".into()).kind(), "str");
        assert_eq!(Value::Bytes(vec![0xff]).kind(), "bytes");
        assert_eq!(Value::Seq(vec![]).kind(), "seq");
        assert_eq!(Value::Map(BTreeMap::new()).kind(), "map");
    }

    #[test]
    fn null_is_distinct_from_other_kinds() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(false).is_null());
        assert!(!Value::Str(String::new()).is_null());
    }

    #[test]
    fn accessors_return_payload_only_for_matching_kind() {
        let v = Value::Int(42);
        assert_eq!(v.as_int(), Some(42));
        assert_eq!(v.as_bool(), None);
        assert_eq!(v.as_str(), None);

        let s = Value::Str("hello".into());
        assert_eq!(s.as_str(), Some("hello"));
        assert_eq!(s.as_int(), None);
    }

    #[test]
    fn conversions_from_native_types() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(3i64), Value::Int(3));
        assert_eq!(Value::from(3i32), Value::Int(3));
        assert_eq!(Value::from(2.5f64), Value::Float(2.5));
        assert_eq!(Value::from("abc"), Value::Str("abc".into()));
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
        assert_eq!(
            Value::from(vec![Value::Int(1), Value::Int(2)]),
            Value::Seq(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn collecting_iterators_builds_composites() {
        let seq: Value = (1..=3).map(Value::Int).collect();
        assert_eq!(seq.as_seq().unwrap().len(), 3);

        let map: Value = vec![("a".to_string(), Value::Int(1))]
            .into_iter()
            .collect();
        assert_eq!(map.as_map().unwrap().get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn default_is_null() {
        assert!(Value::default().is_null());
    }
}
