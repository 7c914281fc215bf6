//! System container payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{codec, error::Result};

/// Flat string-to-string map stored inside an "AMSS" container.
///
/// Serialized as a single JSON object. Nested objects, arrays, numbers and
/// booleans are rejected on decode. Keys are kept sorted so the encoding of a
/// given map is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemPayload(BTreeMap<String, String>);

impl SystemPayload {
    /// Empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    /// Parse JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SystemPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_as_flat_object_in_key_order() {
        let payload: SystemPayload = [("zeta", "1"), ("alpha", "2")].into_iter().collect();
        assert_eq!(payload.encode().unwrap(), br#"{"alpha":"2","zeta":"1"}"#);
    }

    #[test]
    fn decode_roundtrip() {
        let json = br#"{"relay":"wss://example","theme":"dark"}"#;
        let payload = SystemPayload::decode(json).unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.get("relay"), Some("wss://example"));
        assert_eq!(payload.get("missing"), None);
    }

    #[test]
    fn nested_values_rejected() {
        assert!(SystemPayload::decode(br#"{"a":{"b":"c"}}"#).is_err());
        assert!(SystemPayload::decode(br#"{"a":["b"]}"#).is_err());
        assert!(SystemPayload::decode(br#"{"a":1}"#).is_err());
        assert!(SystemPayload::decode(br#"{"a":null}"#).is_err());
    }

    #[test]
    fn non_object_rejected() {
        assert!(SystemPayload::decode(br#"["a"]"#).is_err());
        assert!(SystemPayload::decode(br#""a""#).is_err());
    }

    #[test]
    fn empty_object() {
        let payload = SystemPayload::decode(b"{}").unwrap();
        assert!(payload.is_empty());
        assert_eq!(SystemPayload::new().encode().unwrap(), b"{}");
    }

    #[test]
    fn insert_and_remove() {
        let mut payload = SystemPayload::new();
        assert_eq!(payload.insert("k", "v1"), None);
        assert_eq!(payload.insert("k", "v2"), Some("v1".to_string()));
        assert_eq!(payload.iter().collect::<Vec<_>>(), vec![("k", "v2")]);
        assert_eq!(payload.remove("k"), Some("v2".to_string()));
        assert!(payload.is_empty());
    }
}
