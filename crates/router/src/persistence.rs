//! Saving and restoring a router.
//!
//! The envelope carries the committed backstack with its transaction indices,
//! the back policy, the saved-state registry and, for root routers only, the
//! indexer counter. Queued and in-flight requests are not persisted.

use crate::reconcile::is_monotonic;
use crate::{Router, RouterError, TransactionIndexer};
use navstack_core::{
    PersistenceError, RouterContext, SavedStatePair, SavedStateRegistry, StateValue, TaggedBlob,
};
use navstack_types::{BackstackEntry, Key, TransactionIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One persisted backstack entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEntry {
    pub key: TaggedBlob,
    pub transaction_index: TransactionIndex,
}

/// Serialized form of a router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRouterState {
    pub tag: String,
    pub backstack: Vec<SavedEntry>,
    pub pops_last_key: bool,
    pub saved_state_registry: Vec<SavedStatePair>,
    /// Present only in envelopes written by a root router.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_indexer_counter: Option<i64>,
}

/// Fully decoded envelope, ready to be swapped in.
struct Decoded<K, V> {
    backstack: Vec<BackstackEntry<K>>,
    registry: SavedStateRegistry<K, V>,
    pops_last_key: bool,
    counter: Option<i64>,
}

impl<K: Key, V: StateValue> Router<K, V> {
    /// Snapshot the committed state.
    ///
    /// The renderer's save hook runs first so it can write into the registry.
    /// Keys rejected by the key filter are left out of the saved backstack.
    pub fn save_instance_state(&mut self) -> Result<SavedRouterState, RouterError> {
        if let Some(renderer) = self.renderer.as_mut() {
            let ctx = RouterContext::new(&self.config.tag, &self.backstack, self.paused);
            renderer.save_instance_state(&ctx, &mut self.registry);
        }

        let backstack = self
            .backstack
            .iter()
            .filter(|entry| self.key_filter.retain(entry.key()))
            .map(|entry| -> Result<SavedEntry, PersistenceError> {
                Ok(SavedEntry {
                    key: self.key_serializer.to_blob(entry.key())?,
                    transaction_index: entry.transaction_index(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let saved = SavedRouterState {
            tag: self.config.tag.clone(),
            backstack,
            pops_last_key: self.config.pops_last_key,
            saved_state_registry: self
                .registry
                .save_instance_state(self.key_serializer.as_ref())?,
            transaction_indexer_counter: self.is_root.then(|| self.indexer.save_state()),
        };

        debug!(
            tag = %self.config.tag,
            entries = saved.backstack.len(),
            registry = saved.saved_state_registry.len(),
            dropped_in_flight = self.queue.len(),
            "Saved router state"
        );
        Ok(saved)
    }

    /// Replace the committed state with `saved`.
    ///
    /// Everything is decoded before anything changes: on error the router is
    /// left exactly as it was. On success the queue is cleared.
    pub fn restore_instance_state(&mut self, saved: SavedRouterState) -> Result<(), RouterError> {
        let decoded = match self.decode_saved(saved) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(tag = %self.config.tag, error = %err, "Failed to restore router state");
                return Err(err);
            }
        };

        if let (true, Some(counter)) = (self.is_root, decoded.counter) {
            self.indexer.restore_state(counter);
        }
        if let Some(top) = decoded.backstack.last() {
            self.indexer.ensure_above(top.transaction_index());
        }

        let dropped = self.queue.len();
        self.queue.clear();
        self.backstack = decoded.backstack;
        self.registry = decoded.registry;
        self.config.pops_last_key = decoded.pops_last_key;

        debug!(
            tag = %self.config.tag,
            entries = self.backstack.len(),
            registry = self.registry.len(),
            dropped,
            "Restored router state"
        );
        Ok(())
    }

    fn decode_saved(&self, saved: SavedRouterState) -> Result<Decoded<K, V>, RouterError> {
        if saved.tag != self.config.tag {
            return Err(RouterError::TagMismatch {
                expected: self.config.tag.clone(),
                found: saved.tag,
            });
        }

        let mut backstack: Vec<BackstackEntry<K>> = Vec::with_capacity(saved.backstack.len());
        for entry in saved.backstack {
            let index = entry.transaction_index;
            let increasing = backstack
                .last()
                .map_or(true, |below| below.transaction_index() < index);
            // The indexer must be able to issue something above every entry.
            if !index.is_valid() || index.get() == i64::MAX || !increasing {
                return Err(PersistenceError::InvalidIndex(index.get()).into());
            }
            let key = self.key_serializer.from_blob(entry.key)?;
            backstack.push(BackstackEntry::with_index(key, index));
        }
        debug_assert!(is_monotonic(&backstack));

        if let Some(counter) = saved.transaction_indexer_counter {
            let top = backstack.last().map(BackstackEntry::transaction_index);
            if !TransactionIndexer::accepts_counter(counter, top) {
                return Err(PersistenceError::InvalidIndex(counter).into());
            }
        }

        let registry =
            SavedStateRegistry::from_saved(saved.saved_state_registry, self.key_serializer.as_ref())?;

        Ok(Decoded {
            backstack,
            registry,
            pops_last_key: saved.pops_last_key,
            counter: saved.transaction_indexer_counter,
        })
    }

    /// Save to a JSON string.
    pub fn save_to_string(&mut self) -> Result<String, RouterError> {
        let saved = self.save_instance_state()?;
        Ok(serde_json::to_string(&saved)?)
    }

    /// Restore from a JSON string produced by [`Router::save_to_string`].
    pub fn restore_from_str(&mut self, blob: &str) -> Result<(), RouterError> {
        let saved: SavedRouterState = serde_json::from_str(blob)?;
        self.restore_instance_state(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RouterConfig, TransactionIndexer};
    use navstack_core::{Completion, JsonKeySerializer, Renderer};
    use navstack_test_helpers::{keys, CompletionMode, LifecycleEvent, RecordingRenderer};
    use navstack_types::{Direction, StateChange};
    use proptest::prelude::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn indices(router: &Router<String>) -> Vec<TransactionIndex> {
        router
            .entries()
            .iter()
            .map(BackstackEntry::transaction_index)
            .collect()
    }

    fn router(tag: &str) -> Router<String> {
        Router::new(
            RouterConfig::new(keys(&["home"])).with_tag(tag),
            Box::new(JsonKeySerializer::new()),
        )
    }

    fn with_stack(tag: &str, stack: &[&str]) -> Router<String> {
        let mut router = router(tag);
        router.set_renderer(RecordingRenderer::new());
        router.set(keys(stack), Direction::Replace);
        router
    }

    /// Stores the visible key's scroll offset when asked to save.
    struct ScrollRenderer;

    impl Renderer<String> for ScrollRenderer {
        fn handle_transition(&mut self, _change: &StateChange<String>, completion: Completion) {
            completion.complete();
        }

        fn on_save_instance_state(
            &mut self,
            router: &RouterContext<'_, String>,
            registry: &mut SavedStateRegistry<String>,
        ) {
            if let Some(top) = router.top() {
                registry.set(top.clone(), json!({ "scroll": 120 }));
            }
        }
    }

    #[traced_test]
    #[test]
    fn test_round_trip_through_string() {
        let mut source = with_stack("main", &["a", "b", "c"]);
        source.registry_mut().set("b".to_string(), json!({ "field": "text" }));
        let blob = source.save_to_string().unwrap();

        let mut target = router("main");
        target.restore_from_str(&blob).unwrap();
        assert_eq!(target.backstack(), keys(&["a", "b", "c"]));
        assert_eq!(indices(&target), indices(&source));
        assert_eq!(target.registry(), source.registry());
        assert_eq!(target.indexer().save_state(), source.indexer().save_state());
    }

    #[traced_test]
    #[test]
    fn test_restored_router_replays_on_attach() {
        let mut source = with_stack("main", &["a", "b"]);
        let saved = source.save_instance_state().unwrap();

        let mut target = router("main");
        target.restore_instance_state(saved).unwrap();
        let renderer = RecordingRenderer::new();
        let log = renderer.log();
        target.set_renderer(renderer);

        let changes = log.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_state(), keys(&["a", "b"]).as_slice());
        assert_eq!(indices(&target), indices(&source));
    }

    #[traced_test]
    #[test]
    fn test_renderer_hook_runs_before_save() {
        let mut source = router("main");
        source.set_renderer(ScrollRenderer);
        let saved = source.save_instance_state().unwrap();
        assert_eq!(saved.saved_state_registry.len(), 1);
        assert_eq!(saved.saved_state_registry[0].value.data, json!({ "scroll": 120 }));

        let recording = RecordingRenderer::new();
        let log = recording.log();
        source.set_renderer(recording);
        source.save_instance_state().unwrap();
        assert_eq!(log.lifecycle().last(), Some(&LifecycleEvent::Save));
    }

    #[traced_test]
    #[test]
    fn test_in_flight_transition_is_not_saved() {
        let mut source = router("main");
        let renderer = RecordingRenderer::new().with_mode(CompletionMode::Deferred);
        let log = renderer.log();
        source.set_renderer(renderer);
        log.complete_next();
        source.poll_completion();
        source.push("next".to_string());
        assert!(source.is_in_flight());

        let saved = source.save_instance_state().unwrap();
        assert_eq!(saved.backstack.len(), 1);

        let mut target = router("main");
        target.push("queued".to_string());
        target.restore_instance_state(saved).unwrap();
        assert_eq!(target.pending_count(), 0);
        assert_eq!(target.backstack(), keys(&["home"]));
    }

    #[traced_test]
    #[test]
    fn test_key_filter_skips_keys_but_keeps_registry() {
        let mut source = with_stack("main", &["a", "secret", "b"]);
        source.registry_mut().set("secret".to_string(), json!(1));
        source.set_key_filter(Box::new(|key: &String| key != "secret"));

        let saved = source.save_instance_state().unwrap();
        assert_eq!(saved.backstack.len(), 2);
        assert_eq!(saved.saved_state_registry.len(), 1);

        let mut target = router("main");
        target.restore_instance_state(saved).unwrap();
        assert_eq!(target.backstack(), keys(&["a", "b"]));
        assert!(target.registry().contains(&"secret".to_string()));
    }

    #[traced_test]
    #[test]
    fn test_tag_mismatch_is_rejected() {
        let mut source = with_stack("left", &["a"]);
        let saved = source.save_instance_state().unwrap();
        let mut target = router("right");
        let err = target.restore_instance_state(saved).unwrap_err();
        assert!(matches!(err, RouterError::TagMismatch { .. }));
        assert!(target.is_empty());
    }

    #[traced_test]
    #[test]
    fn test_malformed_blob_leaves_router_untouched() {
        let mut target = with_stack("main", &["a", "b"]);
        let before = target.entries().to_vec();

        let err = target.restore_from_str("{ not json").unwrap_err();
        assert!(matches!(err, RouterError::Persistence(PersistenceError::Malformed(_))));

        let err = target
            .restore_from_str(r#"{"tag":"main","pops_last_key":false,"saved_state_registry":[]}"#)
            .unwrap_err();
        assert!(matches!(err, RouterError::Persistence(PersistenceError::Malformed(_))));
        assert_eq!(target.entries(), before.as_slice());
    }

    #[traced_test]
    #[test]
    fn test_foreign_key_type_is_rejected() {
        let mut source = with_stack("main", &["a"]);
        let mut saved = source.save_instance_state().unwrap();
        saved.backstack[0].key.type_tag = "other::Key".to_string();

        let mut target = router("main");
        let err = target.restore_instance_state(saved).unwrap_err();
        assert!(matches!(
            err,
            RouterError::Persistence(PersistenceError::UnknownType { .. })
        ));
        assert!(target.is_empty());
    }

    #[traced_test]
    #[test]
    fn test_negative_index_is_rejected() {
        let mut source = with_stack("main", &["a"]);
        let mut saved = source.save_instance_state().unwrap();
        saved.backstack[0].transaction_index = TransactionIndex(-4);

        let err = router("main").restore_instance_state(saved).unwrap_err();
        assert!(matches!(
            err,
            RouterError::Persistence(PersistenceError::InvalidIndex(-4))
        ));
    }

    #[traced_test]
    #[test]
    fn test_negative_counter_is_rejected() {
        let mut target = with_stack("main", &["a"]);
        let before = indices(&target);
        let blob = json!({
            "tag": "main",
            "backstack": [],
            "pops_last_key": false,
            "saved_state_registry": [],
            "transaction_indexer_counter": -3
        })
        .to_string();

        let err = target.restore_from_str(&blob).unwrap_err();
        assert!(matches!(
            err,
            RouterError::Persistence(PersistenceError::InvalidIndex(-3))
        ));
        assert_eq!(indices(&target), before);

        // The counter was left alone, so new entries still get valid indices
        // and the router can restore its own save.
        target.push("b".to_string());
        assert!(indices(&target).iter().all(|index| index.is_valid()));
        let saved = target.save_to_string().unwrap();
        router("main").restore_from_str(&saved).unwrap();
    }

    #[traced_test]
    #[test]
    fn test_counter_not_above_top_is_rejected() {
        let mut source = with_stack("main", &["a", "b"]);
        let mut saved = source.save_instance_state().unwrap();
        let top = saved.backstack[1].transaction_index.get();
        saved.transaction_indexer_counter = Some(top);

        let mut target = router("main");
        let err = target.restore_instance_state(saved).unwrap_err();
        assert!(matches!(
            err,
            RouterError::Persistence(PersistenceError::InvalidIndex(found)) if found == top
        ));
        assert!(target.is_empty());
    }

    #[traced_test]
    #[test]
    fn test_index_at_top_of_range_is_rejected() {
        let mut source = with_stack("main", &["a"]);
        let mut saved = source.save_instance_state().unwrap();
        saved.backstack[0].transaction_index = TransactionIndex(i64::MAX);
        saved.transaction_indexer_counter = None;
        let blob = serde_json::to_string(&saved).unwrap();

        let mut target = router("main");
        let err = target.restore_from_str(&blob).unwrap_err();
        assert!(matches!(
            err,
            RouterError::Persistence(PersistenceError::InvalidIndex(i64::MAX))
        ));
        assert!(target.is_empty());
        assert_eq!(target.indexer().save_state(), 0);
    }

    #[traced_test]
    #[test]
    fn test_nested_router_does_not_persist_counter() {
        let root = router("root");
        let mut child: Router<String> = Router::nested(
            RouterConfig::new(keys(&["tab"])).with_tag("child"),
            Box::new(JsonKeySerializer::new()),
            root.indexer().clone(),
        );
        child.set_renderer(RecordingRenderer::new());
        child.push("inner".to_string());
        let saved = child.save_instance_state().unwrap();
        assert_eq!(saved.transaction_indexer_counter, None);
        assert!(child.indexer().shares_counter_with(root.indexer()));

        // Restoring into a fresh nested router lifts the shared counter above
        // the restored indices.
        let fresh = TransactionIndexer::new();
        let mut restored: Router<String> = Router::nested(
            RouterConfig::new(Vec::new()).with_tag("child"),
            Box::new(JsonKeySerializer::new()),
            fresh.clone(),
        );
        restored.restore_instance_state(saved).unwrap();
        let top = restored.entries().last().unwrap().transaction_index();
        assert!(fresh.next_index() > top);
    }

    #[traced_test]
    #[test]
    fn test_pops_last_key_is_restored() {
        let mut source = with_stack("main", &["a"]);
        source.set_pops_last_key(true);
        let saved = source.save_instance_state().unwrap();
        let mut target = router("main");
        target.restore_instance_state(saved).unwrap();
        assert!(target.pops_last_key());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_round_trip_reproduces_state(
            stack in prop::collection::vec("[a-z]{1,6}", 1..=50),
            values in prop::collection::vec(any::<u32>(), 0..10),
        ) {
            let mut source = router("main");
            source.set_renderer(RecordingRenderer::new());
            source.set(stack.clone(), Direction::Forward);
            for (key, value) in stack.iter().zip(values) {
                source.registry_mut().set(key.clone(), json!(value));
            }

            let blob = source.save_to_string().unwrap();
            let mut target = router("main");
            target.restore_from_str(&blob).unwrap();

            prop_assert_eq!(target.backstack(), stack);
            prop_assert_eq!(indices(&target), indices(&source));
            prop_assert_eq!(target.registry(), source.registry());
        }
    }
}
