//! Test helpers for navstack.
//!
//! [`RecordingRenderer`] records every call the router makes into a shared
//! [`RenderLog`] and either completes transitions immediately or holds the
//! completion tokens until the test releases them.

use navstack_core::{Completion, Renderer, RouterContext, SavedStateRegistry, StateValue};
use navstack_types::StateChange;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Build owned string keys from literals.
pub fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Lifecycle hook observed by a [`RecordingRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Attach,
    Active,
    Inactive,
    Detach,
    Save,
}

/// How a [`RecordingRenderer`] treats completion tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionMode {
    /// Complete inside `handle_transition`.
    #[default]
    Synchronous,
    /// Hold the token until [`RenderLog::complete_next`] is called.
    Deferred,
}

struct LogInner<K> {
    changes: Vec<StateChange<K>>,
    lifecycle: Vec<LifecycleEvent>,
    held: VecDeque<Completion>,
    overlapping: usize,
}

/// Shared view of everything a [`RecordingRenderer`] saw.
pub struct RenderLog<K> {
    inner: Rc<RefCell<LogInner<K>>>,
}

impl<K> Clone for RenderLog<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K: Clone> RenderLog<K> {
    fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(LogInner {
                changes: Vec::new(),
                lifecycle: Vec::new(),
                held: VecDeque::new(),
                overlapping: 0,
            })),
        }
    }

    /// Every state change received, in order.
    pub fn changes(&self) -> Vec<StateChange<K>> {
        self.inner.borrow().changes.clone()
    }

    /// Every lifecycle hook received, in order. Save hooks included.
    pub fn lifecycle(&self) -> Vec<LifecycleEvent> {
        self.inner.borrow().lifecycle.clone()
    }

    /// Times a change arrived while an earlier token was still held.
    ///
    /// Always zero for a router that honors single flight.
    pub fn overlapping(&self) -> usize {
        self.inner.borrow().overlapping
    }

    /// Complete the oldest held token. Returns false if none is held.
    pub fn complete_next(&self) -> bool {
        let next = self.inner.borrow_mut().held.pop_front();
        match next {
            Some(completion) => {
                completion.complete();
                true
            }
            None => false,
        }
    }
}

/// Renderer that records calls into a [`RenderLog`].
pub struct RecordingRenderer<K> {
    log: RenderLog<K>,
    mode: CompletionMode,
}

impl<K: Clone> RecordingRenderer<K> {
    /// Create a renderer that completes synchronously.
    pub fn new() -> Self {
        Self {
            log: RenderLog::new(),
            mode: CompletionMode::Synchronous,
        }
    }

    pub fn with_mode(mut self, mode: CompletionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Handle to the shared log. Stays valid after the router takes the
    /// renderer.
    pub fn log(&self) -> RenderLog<K> {
        self.log.clone()
    }
}

impl<K: Clone> Default for RecordingRenderer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: StateValue> Renderer<K, V> for RecordingRenderer<K> {
    fn handle_transition(&mut self, change: &StateChange<K>, completion: Completion) {
        let mut inner = self.log.inner.borrow_mut();
        if !inner.held.is_empty() {
            inner.overlapping += 1;
        }
        inner.changes.push(change.clone());
        match self.mode {
            CompletionMode::Synchronous => {
                drop(inner);
                completion.complete();
            }
            CompletionMode::Deferred => inner.held.push_back(completion),
        }
    }

    fn on_attach(&mut self, _router: &RouterContext<'_, K>) {
        self.push(LifecycleEvent::Attach);
    }

    fn on_active(&mut self, _router: &RouterContext<'_, K>) {
        self.push(LifecycleEvent::Active);
    }

    fn on_inactive(&mut self, _router: &RouterContext<'_, K>) {
        self.push(LifecycleEvent::Inactive);
    }

    fn on_detach(&mut self, _router: &RouterContext<'_, K>) {
        self.push(LifecycleEvent::Detach);
    }

    fn on_save_instance_state(
        &mut self,
        _router: &RouterContext<'_, K>,
        _registry: &mut SavedStateRegistry<K, V>,
    ) {
        self.push(LifecycleEvent::Save);
    }
}

impl<K> RecordingRenderer<K> {
    fn push(&self, event: LifecycleEvent) {
        self.log.inner.borrow_mut().lifecycle.push(event);
    }
}
