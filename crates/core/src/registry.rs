//! Key-addressed store for renderer-owned state.

use crate::{KeySerializer, PersistenceError, StateValue, TaggedBlob};
use indexmap::IndexMap;
use navstack_types::Key;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One persisted registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedStatePair {
    pub key: TaggedBlob,
    pub value: TaggedBlob,
}

/// Store for auxiliary state owned by the renderer (e.g. scroll positions).
///
/// The router never interprets the values; it only carries them through
/// save and restore. Iteration follows insertion order so saved blobs are
/// stable.
#[derive(Debug, Clone)]
pub struct SavedStateRegistry<K, V = serde_json::Value> {
    entries: IndexMap<K, V>,
}

impl<K: Key, V: StateValue> SavedStateRegistry<K, V> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Store `value` for `key`, returning the previous value.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Remove the value stored for `key`.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.shift_remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    /// Serialize every entry, tagging keys with their type hint and values
    /// with their [`StateValue::type_tag`].
    pub fn save_instance_state(
        &self,
        serializer: &dyn KeySerializer<K>,
    ) -> Result<Vec<SavedStatePair>, PersistenceError> {
        self.entries
            .iter()
            .map(|(key, value)| -> Result<SavedStatePair, PersistenceError> {
                Ok(SavedStatePair {
                    key: serializer.to_blob(key)?,
                    value: TaggedBlob {
                        type_tag: value.type_tag().to_string(),
                        data: serde_json::to_value(value)?,
                    },
                })
            })
            .collect()
    }

    /// Replace the registry contents with `pairs`.
    ///
    /// Every pair is decoded before anything is replaced: on error the
    /// registry is left untouched.
    pub fn restore_instance_state(
        &mut self,
        pairs: Vec<SavedStatePair>,
        serializer: &dyn KeySerializer<K>,
    ) -> Result<(), PersistenceError> {
        self.entries = Self::decode(pairs, serializer)?;
        debug!(entries = self.entries.len(), "Restored saved-state registry");
        Ok(())
    }

    /// Decode `pairs` into a fresh registry.
    pub fn from_saved(
        pairs: Vec<SavedStatePair>,
        serializer: &dyn KeySerializer<K>,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            entries: Self::decode(pairs, serializer)?,
        })
    }

    fn decode(
        pairs: Vec<SavedStatePair>,
        serializer: &dyn KeySerializer<K>,
    ) -> Result<IndexMap<K, V>, PersistenceError> {
        let mut entries = IndexMap::with_capacity(pairs.len());
        for pair in pairs {
            let key = serializer.from_blob(pair.key)?;
            let value: V = serde_json::from_value(pair.value.data)?;
            if value.type_tag() != pair.value.type_tag {
                return Err(PersistenceError::TypeMismatch {
                    stored: pair.value.type_tag,
                    decoded: value.type_tag().to_string(),
                });
            }
            entries.insert(key, value);
        }
        Ok(entries)
    }
}

impl<K: Key, V: StateValue> Default for SavedStateRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, V: StateValue + PartialEq> PartialEq for SavedStateRegistry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
