//! Step-by-step router assembly.

use crate::{Router, RouterConfig, RouterError, SavedRouterState, TransactionIndexer};
use navstack_core::{
    JsonKeySerializer, KeyFilter, KeySerializer, Renderer, StateValue, TransitionListener,
};
use navstack_types::Key;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Builder for a [`Router`].
///
/// Saved state is restored before the renderer is attached, so the renderer's
/// first transition replays the restored stack.
///
/// # Example
///
/// ```ignore
/// let router = RouterBuilder::json()
///     .config(RouterConfig::new(vec![Screen::Home]).with_tag("main"))
///     .saved_state(saved)
///     .renderer(view_renderer)
///     .build()?;
/// ```
pub struct RouterBuilder<K: Key, V: StateValue = serde_json::Value> {
    config: RouterConfig<K>,
    key_serializer: Box<dyn KeySerializer<K>>,
    key_filter: Option<Box<dyn KeyFilter<K>>>,
    listeners: Vec<Box<dyn TransitionListener<K>>>,
    renderer: Option<Box<dyn Renderer<K, V>>>,
    saved_state: Option<SavedRouterState>,
    parent_indexer: Option<TransactionIndexer>,
}

impl<K: Key, V: StateValue> RouterBuilder<K, V> {
    pub fn new(key_serializer: Box<dyn KeySerializer<K>>) -> Self {
        Self {
            config: RouterConfig::default(),
            key_serializer,
            key_filter: None,
            listeners: Vec::new(),
            renderer: None,
            saved_state: None,
            parent_indexer: None,
        }
    }

    /// Builder using [`JsonKeySerializer`] for serde keys.
    pub fn json() -> Self
    where
        K: Serialize + DeserializeOwned,
    {
        Self::new(Box::new(JsonKeySerializer::new()))
    }

    pub fn config(mut self, config: RouterConfig<K>) -> Self {
        self.config = config;
        self
    }

    pub fn key_filter<F>(mut self, key_filter: F) -> Self
    where
        F: KeyFilter<K> + 'static,
    {
        self.key_filter = Some(Box::new(key_filter));
        self
    }

    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: TransitionListener<K> + 'static,
    {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn renderer<R>(mut self, renderer: R) -> Self
    where
        R: Renderer<K, V> + 'static,
    {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Restore from a previously saved envelope.
    pub fn saved_state(mut self, saved_state: SavedRouterState) -> Self {
        self.saved_state = Some(saved_state);
        self
    }

    /// Nest the router under the router owning `indexer`.
    pub fn parent_indexer(mut self, indexer: TransactionIndexer) -> Self {
        self.parent_indexer = Some(indexer);
        self
    }

    pub fn build(self) -> Result<Router<K, V>, RouterError> {
        let mut router = match self.parent_indexer {
            Some(indexer) => Router::nested(self.config, self.key_serializer, indexer),
            None => Router::new(self.config, self.key_serializer),
        };
        if let Some(key_filter) = self.key_filter {
            router.set_key_filter(key_filter);
        }
        for listener in self.listeners {
            router.add_boxed_listener(listener);
        }
        if let Some(saved) = self.saved_state {
            router.restore_instance_state(saved)?;
        }
        if let Some(renderer) = self.renderer {
            router.set_boxed_renderer(renderer);
        }
        Ok(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navstack_core::PersistenceError;
    use navstack_test_helpers::{keys, RecordingRenderer};
    use navstack_types::StateChange;
    use std::cell::Cell;
    use std::rc::Rc;
    use tracing_test::traced_test;

    #[derive(Clone, Default)]
    struct Counter(Rc<Cell<usize>>);

    impl TransitionListener<String> for Counter {
        fn after_transition(&mut self, _change: &StateChange<String>) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[traced_test]
    #[test]
    fn test_build_restores_before_attach() {
        let mut source: Router<String> = RouterBuilder::json()
            .config(RouterConfig::new(keys(&["home"])).with_tag("main"))
            .renderer(RecordingRenderer::new())
            .build()
            .unwrap();
        source.push("detail".to_string());
        let saved = source.save_instance_state().unwrap();

        let renderer = RecordingRenderer::new();
        let log = renderer.log();
        let counter = Counter::default();
        let router: Router<String> = RouterBuilder::json()
            .config(RouterConfig::new(keys(&["home"])).with_tag("main"))
            .listener(counter.clone())
            .saved_state(saved)
            .renderer(renderer)
            .build()
            .unwrap();

        assert_eq!(router.backstack(), keys(&["home", "detail"]));
        let changes = log.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_state(), keys(&["home", "detail"]).as_slice());
        assert_eq!(counter.0.get(), 1);
    }

    #[traced_test]
    #[test]
    fn test_build_with_parent_indexer_is_nested() {
        let indexer = TransactionIndexer::new();
        let router: Router<String> = RouterBuilder::json()
            .parent_indexer(indexer.clone())
            .key_filter(|_: &String| false)
            .build()
            .unwrap();
        assert!(!router.is_root());
        assert!(router.indexer().shares_counter_with(&indexer));
    }

    #[traced_test]
    #[test]
    fn test_build_propagates_restore_errors() {
        let saved: SavedRouterState = serde_json::from_value(serde_json::json!({
            "tag": "",
            "backstack": [{ "key": { "type": "nope", "data": "x" }, "transaction_index": 0 }],
            "pops_last_key": false,
            "saved_state_registry": []
        }))
        .unwrap();

        let result: Result<Router<String>, _> = RouterBuilder::json().saved_state(saved).build();
        assert!(matches!(
            result,
            Err(RouterError::Persistence(PersistenceError::UnknownType { .. }))
        ));
    }
}
