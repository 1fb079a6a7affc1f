//! Key serialization and type-tagged blobs.

use crate::PersistenceError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::marker::PhantomData;

/// A serialized value together with the tag needed to decode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedBlob {
    /// Type hint for keys, value tag for registry values.
    #[serde(rename = "type")]
    pub type_tag: String,
    pub data: serde_json::Value,
}

/// Converts keys to and from their transportable form.
///
/// Only used for persistence; the router compares keys in memory.
pub trait KeySerializer<K> {
    /// Tag stored next to the serialized key and handed back to
    /// [`KeySerializer::deserialize`].
    fn type_hint(&self, key: &K) -> String;

    fn serialize(&self, key: &K) -> Result<serde_json::Value, PersistenceError>;

    fn deserialize(&self, type_hint: &str, blob: serde_json::Value) -> Result<K, PersistenceError>;

    /// Serialize `key` together with its type hint.
    fn to_blob(&self, key: &K) -> Result<TaggedBlob, PersistenceError> {
        Ok(TaggedBlob {
            type_tag: self.type_hint(key),
            data: self.serialize(key)?,
        })
    }

    /// Reverse of [`KeySerializer::to_blob`].
    fn from_blob(&self, blob: TaggedBlob) -> Result<K, PersistenceError> {
        self.deserialize(&blob.type_tag, blob.data)
    }
}

/// Default serializer for keys that implement serde.
///
/// The type hint is the Rust type name of `K`, so a blob saved for one key
/// type is rejected by a router using another.
pub struct JsonKeySerializer<K> {
    _key: PhantomData<fn() -> K>,
}

impl<K> JsonKeySerializer<K> {
    pub fn new() -> Self {
        Self { _key: PhantomData }
    }

    fn expected_hint() -> &'static str {
        std::any::type_name::<K>()
    }
}

impl<K> Default for JsonKeySerializer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Debug for JsonKeySerializer<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonKeySerializer")
            .field("key", &Self::expected_hint())
            .finish()
    }
}

impl<K> KeySerializer<K> for JsonKeySerializer<K>
where
    K: Serialize + DeserializeOwned,
{
    fn type_hint(&self, _key: &K) -> String {
        Self::expected_hint().to_string()
    }

    fn serialize(&self, key: &K) -> Result<serde_json::Value, PersistenceError> {
        serde_json::to_value(key).map_err(|e| PersistenceError::Key(e.to_string()))
    }

    fn deserialize(&self, type_hint: &str, blob: serde_json::Value) -> Result<K, PersistenceError> {
        if type_hint != Self::expected_hint() {
            return Err(PersistenceError::UnknownType {
                expected: Self::expected_hint().to_string(),
                found: type_hint.to_string(),
            });
        }
        Ok(serde_json::from_value(blob)?)
    }
}

/// Renderer-owned value stored in the saved-state registry.
///
/// Implementations are usually a caller-defined enum of every kind of state
/// the renderer persists. The tag is written next to the value and checked
/// on restore, so no runtime type lookup is needed.
pub trait StateValue: Clone + Debug + Serialize + DeserializeOwned {
    fn type_tag(&self) -> &'static str;
}

impl StateValue for serde_json::Value {
    fn type_tag(&self) -> &'static str {
        "json"
    }
}

impl StateValue for String {
    fn type_tag(&self) -> &'static str {
        "string"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Screen {
        Home,
        Detail(u32),
    }

    #[test]
    fn test_json_key_round_trip() {
        let serializer = JsonKeySerializer::<Screen>::new();
        let blob = serializer.to_blob(&Screen::Detail(4)).unwrap();
        assert!(blob.type_tag.ends_with("Screen"));
        assert_eq!(serializer.from_blob(blob).unwrap(), Screen::Detail(4));
    }

    #[test]
    fn test_json_key_rejects_foreign_hint() {
        let serializer = JsonKeySerializer::<Screen>::new();
        let err = serializer
            .deserialize("other::Key", serde_json::json!("Home"))
            .unwrap_err();
        assert!(matches!(err, PersistenceError::UnknownType { .. }));
    }

    #[test]
    fn test_json_key_rejects_bad_payload() {
        let serializer = JsonKeySerializer::<Screen>::new();
        let hint = serializer.type_hint(&Screen::Home);
        let err = serializer
            .deserialize(&hint, serde_json::json!({"Nope": 1}))
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Malformed(_)));
    }
}
