//! Monotonic transaction index source.

use navstack_types::TransactionIndex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Issues strictly increasing transaction indices.
///
/// Cloning yields a handle to the same counter, which is how nested routers
/// share their root's indexer. Only the root persists the counter.
#[derive(Debug, Clone, Default)]
pub struct TransactionIndexer {
    counter: Arc<AtomicI64>,
}

impl TransactionIndexer {
    /// Create a new indexer starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next index and advance the counter.
    ///
    /// Saturates at `i64::MAX` instead of wrapping to negative values.
    pub fn next_index(&self) -> TransactionIndex {
        let previous = self
            .counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| c.checked_add(1))
            .unwrap_or_else(|c| c);
        TransactionIndex(previous)
    }

    /// Value the next call to [`TransactionIndexer::next_index`] will return.
    pub fn save_state(&self) -> i64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Reset the counter to a saved value.
    pub fn restore_state(&self, counter: i64) {
        self.counter.store(counter, Ordering::Relaxed);
    }

    /// Make sure future indices are greater than `index`.
    pub fn ensure_above(&self, index: TransactionIndex) {
        self.counter
            .fetch_max(index.get().saturating_add(1), Ordering::Relaxed);
    }

    /// Whether a restored counter can follow a stack whose top is `top`.
    ///
    /// The counter must be non-negative, strictly above `top` and leave room
    /// for at least one more index.
    pub fn accepts_counter(counter: i64, top: Option<TransactionIndex>) -> bool {
        let floor = top.map_or(Some(0), |index| index.get().checked_add(1));
        floor.is_some_and(|floor| counter >= floor) && counter < i64::MAX
    }

    /// Whether `other` shares this indexer's counter.
    pub fn shares_counter_with(&self, other: &TransactionIndexer) -> bool {
        Arc::ptr_eq(&self.counter, &other.counter)
    }
}
