//! Capability traits implemented by the host.

use crate::{Completion, RouterContext, SavedStateRegistry, StateValue};
use navstack_types::StateChange;

/// The external collaborator that performs transitions.
///
/// The router owns the renderer and calls into it from a single logical
/// thread. Only [`Renderer::handle_transition`] is required; the lifecycle
/// hooks default to no-ops so renderers implement what they need.
///
/// # Guarantees given by the router
///
/// - **Single flight**: `handle_transition` is never called while a previous
///   change is still waiting for its completion
/// - **No no-ops**: requests whose reducer yields `Reduction::NoOp` are never
///   passed to the renderer
/// - **Edge-triggered hooks**: each lifecycle hook fires at most once per edge
///   (attached → detached, active → inactive)
///
/// # Example
///
/// ```ignore
/// impl Renderer<Screen> for ViewRenderer {
///     fn handle_transition(&mut self, change: &StateChange<Screen>, completion: Completion) {
///         self.animate(change.top_previous(), change.top_new(), change.direction());
///         self.pending = Some(completion);
///     }
/// }
/// ```
pub trait Renderer<K, V: StateValue = serde_json::Value> {
    /// Perform the transition described by `change`.
    ///
    /// Must call [`Completion::complete`] exactly once, either before returning
    /// or at any later point. A completion that never fires stalls the queue
    /// permanently.
    fn handle_transition(&mut self, change: &StateChange<K>, completion: Completion);

    /// The renderer was attached to a router.
    fn on_attach(&mut self, _router: &RouterContext<'_, K>) {}

    /// The host became visible while this renderer is attached.
    fn on_active(&mut self, _router: &RouterContext<'_, K>) {}

    /// The host stopped being visible, or the renderer is about to detach.
    fn on_inactive(&mut self, _router: &RouterContext<'_, K>) {}

    /// The renderer was detached from the router.
    fn on_detach(&mut self, _router: &RouterContext<'_, K>) {}

    /// Persist renderer-owned state into the registry before the router
    /// serializes itself.
    fn on_save_instance_state(
        &mut self,
        _router: &RouterContext<'_, K>,
        _registry: &mut SavedStateRegistry<K, V>,
    ) {
    }
}

/// Observer notified around every transition that reaches the renderer.
pub trait TransitionListener<K> {
    /// Called right before the renderer receives `change`.
    fn before_transition(&mut self, _change: &StateChange<K>) {}

    /// Called right after `change` was committed.
    fn after_transition(&mut self, _change: &StateChange<K>) {}
}

/// Decides which keys are written to the persisted envelope.
pub trait KeyFilter<K> {
    /// Return false to leave `key` out of the saved backstack.
    fn retain(&self, key: &K) -> bool;
}

impl<K, F> KeyFilter<K> for F
where
    F: Fn(&K) -> bool,
{
    fn retain(&self, key: &K) -> bool {
        self(key)
    }
}

/// Filter that persists every key.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl<K> KeyFilter<K> for KeepAll {
    fn retain(&self, _key: &K) -> bool {
        true
    }
}
