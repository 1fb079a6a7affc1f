//! Entry reconciliation on commit.
//!
//! When a transition commits, the keys of the new stack are matched against
//! the entries of the old one so that surviving destinations keep their
//! transaction index:
//!
//! 1. Each new key claims the first unclaimed old entry with an equal key and
//!    takes over its index. Keys without a match get `INVALID`.
//! 2. `INVALID` entries receive a fresh index from the indexer.
//! 3. The set of indices is sorted and written back in new-stack order.
//!
//! Step 3 keeps indices strictly increasing from bottom to top even when the
//! caller reordered surviving keys. In that case the numeric values move
//! between positions; an index is not pinned to a key across a reorder.

use crate::TransactionIndexer;
use navstack_types::{BackstackEntry, Key, TransactionIndex};

/// Build the committed entries for `new_keys`.
pub fn reconcile<K: Key>(
    current: &[BackstackEntry<K>],
    new_keys: Vec<K>,
    indexer: &TransactionIndexer,
) -> Vec<BackstackEntry<K>> {
    let mut claimed = vec![false; current.len()];

    let mut entries: Vec<BackstackEntry<K>> = Vec::with_capacity(new_keys.len());
    for key in new_keys {
        let mut index = TransactionIndex::INVALID;
        for (slot, old) in current.iter().enumerate() {
            if !claimed[slot] && old.key() == &key {
                claimed[slot] = true;
                index = old.transaction_index();
                break;
            }
        }
        entries.push(BackstackEntry::with_index(key, index));
    }

    for entry in &mut entries {
        entry.ensure_valid_index(|| indexer.next_index());
    }

    let mut indices: Vec<TransactionIndex> =
        entries.iter().map(BackstackEntry::transaction_index).collect();
    indices.sort_unstable();
    for (entry, index) in entries.iter_mut().zip(indices) {
        entry.set_transaction_index(index);
    }

    entries
}

/// Check that indices are valid and strictly increasing bottom to top.
pub fn is_monotonic<K>(entries: &[BackstackEntry<K>]) -> bool {
    entries.iter().all(|e| e.transaction_index().is_valid())
        && entries
            .windows(2)
            .all(|w| w[0].transaction_index() < w[1].transaction_index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn indices<K>(entries: &[BackstackEntry<K>]) -> Vec<i64> {
        entries.iter().map(|e| e.transaction_index().get()).collect()
    }

    fn keys<K: Clone>(entries: &[BackstackEntry<K>]) -> Vec<K> {
        entries.iter().map(|e| e.key().clone()).collect()
    }

    #[test]
    fn test_new_keys_get_fresh_indices() {
        let indexer = TransactionIndexer::new();
        let entries = reconcile(&[], vec!["a", "b"], &indexer);
        assert_eq!(keys(&entries), vec!["a", "b"]);
        assert_eq!(indices(&entries), vec![0, 1]);
    }

    #[test]
    fn test_surviving_keys_keep_their_index() {
        let indexer = TransactionIndexer::new();
        let first = reconcile(&[], vec!["a", "b", "c"], &indexer);
        let popped = reconcile(&first, vec!["a", "b"], &indexer);
        assert_eq!(indices(&popped), vec![0, 1]);

        let pushed = reconcile(&popped, vec!["a", "b", "d"], &indexer);
        assert_eq!(indices(&pushed), vec![0, 1, 3]);
    }

    #[test]
    fn test_reorder_redistributes_index_values() {
        // Reordering swaps the numeric values between positions rather than
        // pinning each index to its key.
        let indexer = TransactionIndexer::new();
        let first = reconcile(&[], vec!["a", "b"], &indexer);
        let swapped = reconcile(&first, vec!["b", "a"], &indexer);
        assert_eq!(keys(&swapped), vec!["b", "a"]);
        assert_eq!(indices(&swapped), vec![0, 1]);
        assert_eq!(indexer.save_state(), 2);
    }

    #[test]
    fn test_duplicate_keys_claim_in_scan_order() {
        let indexer = TransactionIndexer::new();
        let first = reconcile(&[], vec!["a", "b"], &indexer);
        let with_dup = reconcile(&first, vec!["a", "b", "a"], &indexer);
        assert_eq!(indices(&with_dup), vec![0, 1, 2]);

        // Dropping one duplicate reuses the first unclaimed entry.
        let deduped = reconcile(&with_dup, vec!["b", "a"], &indexer);
        assert_eq!(indices(&deduped), vec![0, 1]);
        assert_eq!(indexer.save_state(), 3);
    }

    #[test]
    fn test_is_monotonic() {
        let ok = vec![
            BackstackEntry::with_index("a", TransactionIndex(1)),
            BackstackEntry::with_index("b", TransactionIndex(4)),
        ];
        let bad = vec![
            BackstackEntry::with_index("a", TransactionIndex(4)),
            BackstackEntry::with_index("b", TransactionIndex(1)),
        ];
        let invalid = vec![BackstackEntry::new("a")];
        assert!(is_monotonic(&ok));
        assert!(!is_monotonic(&bad));
        assert!(!is_monotonic(&invalid));
        assert!(is_monotonic::<&str>(&[]));
    }

    proptest! {
        #[test]
        fn prop_indices_stay_monotonic(
            stacks in prop::collection::vec(prop::collection::vec(0u8..8, 0..12), 1..20)
        ) {
            let indexer = TransactionIndexer::new();
            let mut committed: Vec<BackstackEntry<u8>> = Vec::new();
            for stack in stacks {
                committed = reconcile(&committed, stack.clone(), &indexer);
                prop_assert_eq!(keys(&committed), stack);
                prop_assert!(is_monotonic(&committed));
            }
        }

        #[test]
        fn prop_surviving_prefix_keeps_indices(
            base in prop::collection::vec(0u16..1000, 1..30),
            extra in prop::collection::vec(1000u16..2000, 0..10),
            cut in 0usize..30,
        ) {
            let indexer = TransactionIndexer::new();
            let committed = reconcile(&[], base.clone(), &indexer);
            let keep = cut.min(base.len());
            let mut next: Vec<u16> = base[..keep].to_vec();
            next.extend(extra);
            let reconciled = reconcile(&committed, next, &indexer);
            prop_assert_eq!(&indices(&reconciled)[..keep], &indices(&committed)[..keep]);
        }
    }
}
