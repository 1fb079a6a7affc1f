//! Edge-triggered renderer lifecycle.

use navstack_core::{Completion, Renderer, RouterContext, SavedStateRegistry, StateValue};
use navstack_types::StateChange;

/// Wraps a renderer and forwards each lifecycle hook at most once per edge.
///
/// Attach/detach and active/inactive are tracked as booleans so repeated
/// pause or detach calls from the host never reach the renderer twice.
pub(crate) struct LifecycleGuard<K, V: StateValue> {
    renderer: Box<dyn Renderer<K, V>>,
    attached: bool,
    active: bool,
}

impl<K, V: StateValue> LifecycleGuard<K, V> {
    pub(crate) fn new(renderer: Box<dyn Renderer<K, V>>) -> Self {
        Self {
            renderer,
            attached: false,
            active: false,
        }
    }

    pub(crate) fn attach(&mut self, ctx: &RouterContext<'_, K>) {
        if !self.attached {
            self.attached = true;
            self.renderer.on_attach(ctx);
        }
    }

    pub(crate) fn activate(&mut self, ctx: &RouterContext<'_, K>) {
        if !self.active {
            self.active = true;
            self.renderer.on_active(ctx);
        }
    }

    pub(crate) fn deactivate(&mut self, ctx: &RouterContext<'_, K>) {
        if self.active {
            self.active = false;
            self.renderer.on_inactive(ctx);
        }
    }

    pub(crate) fn detach(&mut self, ctx: &RouterContext<'_, K>) {
        if self.attached {
            self.attached = false;
            self.renderer.on_detach(ctx);
        }
    }

    pub(crate) fn handle_transition(&mut self, change: &StateChange<K>, completion: Completion) {
        self.renderer.handle_transition(change, completion);
    }

    pub(crate) fn save_instance_state(
        &mut self,
        ctx: &RouterContext<'_, K>,
        registry: &mut SavedStateRegistry<K, V>,
    ) {
        self.renderer.on_save_instance_state(ctx, registry);
    }

    pub(crate) fn into_inner(self) -> Box<dyn Renderer<K, V>> {
        self.renderer
    }
}
