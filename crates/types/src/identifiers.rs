//! Ordering tokens and transition identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable ordering token assigned to a backstack entry.
///
/// Indices are handed out by the router's transaction indexer the first time
/// an entry becomes part of a committed stack. Within one committed stack the
/// indices are strictly increasing from bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionIndex(pub i64);

impl TransactionIndex {
    /// Marker for an entry that has not been assigned an index yet.
    pub const INVALID: Self = TransactionIndex(-1);

    /// Check whether this index was assigned by an indexer.
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// Get the raw value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl Default for TransactionIndex {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for TransactionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Txn({})", self.0)
        } else {
            write!(f, "Txn(invalid)")
        }
    }
}

/// Identifier of one dispatched transition.
///
/// Every request that reaches the renderer gets a fresh id. Completion tokens
/// carry the id so the router can tell a current completion from a stale one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub u64);

impl TransitionId {
    /// Create a new transition ID.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transition-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_index() {
        assert!(!TransactionIndex::INVALID.is_valid());
        assert!(TransactionIndex(0).is_valid());
        assert_eq!(TransactionIndex::default(), TransactionIndex::INVALID);
        assert!(TransactionIndex::INVALID < TransactionIndex(0));
    }

    #[test]
    fn test_index_is_transparent_on_the_wire() {
        let json = serde_json::to_string(&TransactionIndex(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn test_display() {
        assert_eq!(TransactionIndex(3).to_string(), "Txn(3)");
        assert_eq!(TransactionIndex::INVALID.to_string(), "Txn(invalid)");
        assert_eq!(TransitionId::new(12).to_string(), "transition-12");
    }
}
