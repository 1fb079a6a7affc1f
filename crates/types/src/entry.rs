//! Backstack entries.

use crate::TransactionIndex;

/// A key together with its transaction index.
///
/// Equality is by key only: two entries for the same destination compare
/// equal regardless of the index they carry.
#[derive(Debug, Clone)]
pub struct BackstackEntry<K> {
    key: K,
    transaction_index: TransactionIndex,
}

impl<K> BackstackEntry<K> {
    /// Create an entry that has not been assigned an index yet.
    pub fn new(key: K) -> Self {
        Self {
            key,
            transaction_index: TransactionIndex::INVALID,
        }
    }

    /// Create an entry with a known index (used on restore).
    pub fn with_index(key: K, transaction_index: TransactionIndex) -> Self {
        Self {
            key,
            transaction_index,
        }
    }

    /// The destination key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Consume the entry and return its key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// The transaction index, possibly [`TransactionIndex::INVALID`].
    pub fn transaction_index(&self) -> TransactionIndex {
        self.transaction_index
    }

    /// Overwrite the transaction index.
    pub fn set_transaction_index(&mut self, index: TransactionIndex) {
        self.transaction_index = index;
    }

    /// Assign an index from `next` if this entry has none.
    ///
    /// Returns true if an index was assigned.
    pub fn ensure_valid_index(&mut self, next: impl FnOnce() -> TransactionIndex) -> bool {
        if self.transaction_index.is_valid() {
            return false;
        }
        self.transaction_index = next();
        true
    }
}

impl<K: PartialEq> PartialEq for BackstackEntry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Eq> Eq for BackstackEntry<K> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_index() {
        let a = BackstackEntry::with_index("a", TransactionIndex(1));
        let b = BackstackEntry::with_index("a", TransactionIndex(9));
        let c = BackstackEntry::with_index("c", TransactionIndex(1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_ensure_valid_index_only_assigns_once() {
        let mut entry = BackstackEntry::new("a");
        assert!(entry.ensure_valid_index(|| TransactionIndex(4)));
        assert!(!entry.ensure_valid_index(|| TransactionIndex(5)));
        assert_eq!(entry.transaction_index(), TransactionIndex(4));
    }
}
