//! Serialization-agnostic object graph.
//!
//! A small closed tree of strings, sequences and key-ordered objects. Encoders
//! match on [`Value`] directly, or go through the [`Serialize`] impl which
//! emits object keys in insertion order.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Sequence(Vec<Value>),
    Object(Object),
}

/// Object node with unique keys kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`. An existing key keeps its position and
    /// has its value replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Follows a path of object keys, e.g. `["Hotels", "Hotel"]`.
    pub fn pointer(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |node, key| node.as_object()?.get(key))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Self::Object(obj)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Sequence(items)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::Sequence(items.into_iter().map(Value::String).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(obj) => obj.serialize(serializer),
        }
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_position_on_replace() {
        let mut obj = Object::new();
        obj.insert("b", "1");
        obj.insert("a", "2");
        obj.insert("b", "3");
        assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(obj.get("b").and_then(Value::as_str), Some("3"));
        assert_eq!(obj.len(), 2);
    }

    #[test]
    fn serializes_keys_in_insertion_order() {
        let value = Value::from(
            Object::new()
                .with("Zip", "85281")
                .with("City", "Tempe")
                .with("Phone", vec!["1".to_string(), "2".to_string()]),
        );
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"Zip":"85281","City":"Tempe","Phone":["1","2"]}"#);
    }

    #[test]
    fn pointer_walks_nested_objects() {
        let value = Value::from(
            Object::new().with("Hotels", Object::new().with("Hotel", Vec::<Value>::new())),
        );
        assert_eq!(
            value.pointer(&["Hotels", "Hotel"]).and_then(Value::as_sequence),
            Some(&[][..])
        );
        assert!(value.pointer(&["Hotels", "Missing"]).is_none());
    }
}
