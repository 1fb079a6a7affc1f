//! The router state machine.

use crate::lifecycle::LifecycleGuard;
use crate::pending::{Delivery, PendingStateChange, Request, Status};
use crate::reconcile::reconcile;
use crate::{RouterConfig, RouterError, TransactionIndexer};
use navstack_core::{
    Completion, KeepAll, KeyFilter, KeySerializer, Renderer, RouterContext, SavedStateRegistry,
    StateValue, TransitionListener,
};
use navstack_types::{BackstackEntry, Key, Reduction, StateChange, TransitionId};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info, trace};

/// Coarse state of the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    /// No transition in flight.
    Idle,
    /// Exactly one transition is waiting for its completion.
    Busy,
    /// The host suspended dispatch. Queued requests are kept.
    Paused,
}

/// Handle returned by [`Router::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Navigation backstack coordinator.
///
/// The router owns the committed backstack and a FIFO queue of reducers. It
/// runs the reducer at the head of the queue against a copy of the committed
/// stack, hands the resulting [`StateChange`] to the attached renderer and
/// commits the new stack once the renderer signals completion. Then the next
/// request is started.
///
/// All methods take `&mut self`: the router is driven from one logical
/// thread. Renderers may complete on another thread; the host then calls
/// [`Router::poll_completion`] to pick the signal up.
///
/// # Invariants
///
/// - At most one queued request is `InProgress` at any time
/// - Requests reach the renderer in the order they were enqueued
/// - A reducer yielding [`Reduction::NoOp`] never reaches the renderer
/// - Committed transaction indices are strictly increasing bottom to top
pub struct Router<K: Key, V: StateValue = serde_json::Value> {
    pub(crate) config: RouterConfig<K>,

    /// Committed entries, bottom first.
    pub(crate) backstack: Vec<BackstackEntry<K>>,

    /// Pending requests. Only the head may be `InProgress`.
    pub(crate) queue: VecDeque<PendingStateChange<K>>,

    pub(crate) renderer: Option<LifecycleGuard<K, V>>,

    /// Host suspension flag.
    pub(crate) paused: bool,

    pub(crate) registry: SavedStateRegistry<K, V>,

    pub(crate) indexer: TransactionIndexer,

    /// Whether this router owns its indexer (and persists the counter).
    pub(crate) is_root: bool,

    pub(crate) key_serializer: Box<dyn KeySerializer<K>>,

    pub(crate) key_filter: Box<dyn KeyFilter<K>>,

    listeners: Vec<(ListenerId, Box<dyn TransitionListener<K>>)>,

    next_listener_id: u64,

    next_transition_id: u64,
}

impl<K: Key, V: StateValue> Router<K, V> {
    /// Create a new root router with its own indexer.
    pub fn new(config: RouterConfig<K>, key_serializer: Box<dyn KeySerializer<K>>) -> Self {
        Self::with_indexer(config, key_serializer, TransactionIndexer::new(), true)
    }

    /// Create a router nested under the router owning `indexer`.
    ///
    /// Nested routers draw indices from the shared counter but never persist
    /// or restore it.
    pub fn nested(
        config: RouterConfig<K>,
        key_serializer: Box<dyn KeySerializer<K>>,
        indexer: TransactionIndexer,
    ) -> Self {
        Self::with_indexer(config, key_serializer, indexer, false)
    }

    /// Create a router nested under this one, sharing its indexer.
    pub fn child<C: Key, W: StateValue>(
        &self,
        config: RouterConfig<C>,
        key_serializer: Box<dyn KeySerializer<C>>,
    ) -> Router<C, W> {
        Router::nested(config, key_serializer, self.indexer.clone())
    }

    fn with_indexer(
        config: RouterConfig<K>,
        key_serializer: Box<dyn KeySerializer<K>>,
        indexer: TransactionIndexer,
        is_root: bool,
    ) -> Self {
        Self {
            config,
            backstack: Vec::new(),
            queue: VecDeque::new(),
            renderer: None,
            paused: false,
            registry: SavedStateRegistry::new(),
            indexer,
            is_root,
            key_serializer,
            key_filter: Box::new(KeepAll),
            listeners: Vec::new(),
            next_listener_id: 0,
            next_transition_id: 0,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn tag(&self) -> &str {
        &self.config.tag
    }

    /// Copy of the committed keys, bottom first.
    pub fn backstack(&self) -> Vec<K> {
        self.backstack.iter().map(|e| e.key().clone()).collect()
    }

    /// Committed entries with their transaction indices.
    pub fn entries(&self) -> &[BackstackEntry<K>] {
        &self.backstack
    }

    /// Currently visible destination.
    pub fn top(&self) -> Option<&K> {
        self.backstack.last().map(BackstackEntry::key)
    }

    pub fn len(&self) -> usize {
        self.backstack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backstack.is_empty()
    }

    pub fn state(&self) -> RouterState {
        if self.paused {
            RouterState::Paused
        } else if self.is_in_flight() {
            RouterState::Busy
        } else {
            RouterState::Idle
        }
    }

    /// Whether a transition was handed to a renderer and not committed yet.
    pub fn is_in_flight(&self) -> bool {
        self.queue
            .front()
            .is_some_and(|head| head.status == Status::InProgress)
    }

    /// Number of queued requests, including the one in flight.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pops_last_key(&self) -> bool {
        self.config.pops_last_key
    }

    pub fn set_pops_last_key(&mut self, pops_last_key: bool) {
        self.config.pops_last_key = pops_last_key;
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Handle to this router's indexer, for creating nested routers.
    pub fn indexer(&self) -> &TransactionIndexer {
        &self.indexer
    }

    pub fn registry(&self) -> &SavedStateRegistry<K, V> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SavedStateRegistry<K, V> {
        &mut self.registry
    }

    pub fn set_key_filter(&mut self, key_filter: Box<dyn KeyFilter<K>>) {
        self.key_filter = key_filter;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Requests
    // ═══════════════════════════════════════════════════════════════════════════

    /// Enqueue a reducer.
    ///
    /// The reducer runs when the request reaches the head of the queue, against
    /// the stack committed at that moment.
    pub fn set_backstack<F>(&mut self, reducer: F)
    where
        F: FnOnce(Vec<K>) -> Reduction<K> + 'static,
    {
        self.queue
            .push_back(PendingStateChange::new(Request::Reduce(Box::new(reducer))));
        debug!(
            tag = %self.config.tag,
            queued = self.queue.len(),
            "Enqueued state change"
        );
        self.begin_if_possible();
    }

    /// Enqueue a back navigation if one is currently possible.
    ///
    /// Back is possible while requests are queued, or when the committed stack
    /// holds more than one key (more than zero with `pops_last_key`). The
    /// enqueued reducer removes the top key, or yields a no-op if by then the
    /// policy forbids removal. Returns whether the request was accepted.
    pub fn handle_back(&mut self) -> bool {
        let pops_last_key = self.config.pops_last_key;
        let minimum = if pops_last_key { 0 } else { 1 };
        let accepted = !self.queue.is_empty() || self.backstack.len() > minimum;

        if !accepted {
            trace!(tag = %self.config.tag, "Back navigation rejected");
            return false;
        }

        self.set_backstack(move |mut stack: Vec<K>| {
            if stack.len() > minimum {
                stack.pop();
                Reduction::backward(stack)
            } else {
                Reduction::NoOp
            }
        });
        true
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Renderer and host lifecycle
    // ═══════════════════════════════════════════════════════════════════════════

    /// Attach a renderer, replacing the current one.
    ///
    /// The previous renderer receives its inactive/detach hooks first. If a
    /// transition is in flight and has not completed, the same state change is
    /// redelivered to the new renderer. Otherwise a replace transition from an
    /// empty previous state to the committed stack is placed at the head of the
    /// queue so the renderer starts from the existing state. At most one such
    /// replay is queued at a time.
    pub fn set_renderer<R>(&mut self, renderer: R)
    where
        R: Renderer<K, V> + 'static,
    {
        self.set_boxed_renderer(Box::new(renderer));
    }

    pub fn set_boxed_renderer(&mut self, renderer: Box<dyn Renderer<K, V>>) {
        // A completion from the outgoing renderer still counts.
        self.commit_if_completed();
        let _ = self.detach_renderer();

        let mut guard = LifecycleGuard::new(renderer);
        let ctx = RouterContext::new(&self.config.tag, &self.backstack, self.paused);
        guard.attach(&ctx);
        if !self.paused {
            guard.activate(&ctx);
        }
        self.renderer = Some(guard);
        info!(tag = %self.config.tag, "Renderer attached");

        match self.queue.front_mut() {
            Some(head) if head.status == Status::InProgress => {
                if let Some(delivery) = head.delivery.as_mut() {
                    delivery.signal = None;
                }
                debug!(tag = %self.config.tag, "Redelivering in-flight transition");
            }
            Some(head) if head.is_attach() && head.status == Status::Enqueued => {
                trace!(tag = %self.config.tag, "Attach replay already queued");
            }
            _ => {
                self.queue
                    .push_front(PendingStateChange::new(Request::Attach));
            }
        }

        self.begin_if_possible();
    }

    /// Detach the current renderer and return it.
    ///
    /// Requests keep queueing but nothing is dispatched until a renderer is
    /// attached again.
    pub fn remove_renderer(&mut self) -> Option<Box<dyn Renderer<K, V>>> {
        self.commit_if_completed();
        self.detach_renderer()
    }

    fn detach_renderer(&mut self) -> Option<Box<dyn Renderer<K, V>>> {
        let mut guard = self.renderer.take()?;
        let ctx = RouterContext::new(&self.config.tag, &self.backstack, self.paused);
        guard.deactivate(&ctx);
        guard.detach(&ctx);
        info!(tag = %self.config.tag, "Renderer detached");
        Some(guard.into_inner())
    }

    /// Suspend dispatch (host no longer visible).
    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        let ctx = RouterContext::new(&self.config.tag, &self.backstack, true);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.deactivate(&ctx);
        }
        info!(tag = %self.config.tag, "Router paused");
    }

    /// Resume dispatch and immediately try to start the queue head.
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        let ctx = RouterContext::new(&self.config.tag, &self.backstack, false);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.activate(&ctx);
        }
        info!(tag = %self.config.tag, "Router resumed");
        self.begin_if_possible();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Listeners
    // ═══════════════════════════════════════════════════════════════════════════

    /// Register a listener called around every transition.
    pub fn add_listener<L>(&mut self, listener: L) -> ListenerId
    where
        L: TransitionListener<K> + 'static,
    {
        self.add_boxed_listener(Box::new(listener))
    }

    pub fn add_boxed_listener(&mut self, listener: Box<dyn TransitionListener<K>>) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener. Returns false if the id is unknown.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Dispatch
    // ═══════════════════════════════════════════════════════════════════════════

    /// Commit the in-flight transition if its completion has been signaled,
    /// then start the next request.
    ///
    /// Hosts call this after a renderer completed asynchronously. Returns
    /// whether a transition was committed.
    pub fn poll_completion(&mut self) -> bool {
        let committed = self.commit_if_completed();
        if committed {
            self.begin_if_possible();
        }
        committed
    }

    /// Explicitly start the queue head.
    ///
    /// Unlike the automatic triggers, this reports a missing renderer as an
    /// error instead of leaving the request queued.
    pub fn dispatch(&mut self) -> Result<(), RouterError> {
        if self.renderer.is_none() {
            return Err(RouterError::NoRenderer);
        }
        self.begin_if_possible();
        Ok(())
    }

    /// Advance the queue as far as possible without waiting.
    ///
    /// Loops instead of recursing: a renderer that completes synchronously
    /// has its transition committed here and the next request started, all
    /// within the caller's stack frame.
    pub(crate) fn begin_if_possible(&mut self) {
        loop {
            self.commit_if_completed();

            if self.renderer.is_none() || self.paused {
                return;
            }
            let Some(head) = self.queue.front() else {
                return;
            };

            if head.needs_redelivery() {
                self.deliver_head();
            } else if head.status == Status::Enqueued {
                self.start_head();
            } else {
                return;
            }

            if self.is_in_flight() && !self.head_completed() {
                return;
            }
        }
    }

    fn head_completed(&self) -> bool {
        self.queue
            .front()
            .is_some_and(PendingStateChange::is_completed_by_renderer)
    }

    /// Run the head reducer and hand the result to the renderer.
    fn start_head(&mut self) {
        let current = self.backstack();
        let Some(head) = self.queue.front_mut() else {
            return;
        };

        let is_attach = head.is_attach();
        let (previous, reduction) = match head.request.take() {
            Some(Request::Attach) => {
                let stack = if current.is_empty() {
                    self.config.initial_keys.clone()
                } else {
                    current
                };
                (Vec::new(), Reduction::replace(stack))
            }
            Some(Request::Reduce(reducer)) => (current.clone(), reducer(current)),
            None => return,
        };

        match reduction {
            Reduction::NoOp => {
                head.status = Status::Completed;
                self.queue.pop_front();
                debug!(tag = %self.config.tag, "Skipped no-op state change");
            }
            Reduction::Transition {
                backstack,
                direction,
            } => {
                let id = TransitionId::new(self.next_transition_id);
                self.next_transition_id += 1;
                head.status = Status::InProgress;
                head.delivery = Some(Delivery {
                    change: StateChange::new(
                        id,
                        previous,
                        backstack,
                        direction,
                        self.config.tag.clone(),
                    ),
                    signal: None,
                });
                debug!(
                    tag = %self.config.tag,
                    transition = %id,
                    direction = %direction,
                    attach = is_attach,
                    "Dispatching state change"
                );

                if let Some(delivery) = head.delivery.as_ref() {
                    for (_, listener) in self.listeners.iter_mut() {
                        listener.before_transition(&delivery.change);
                    }
                }
                self.deliver_head();
            }
        }
    }

    /// Hand the head's state change to the renderer with a fresh token.
    fn deliver_head(&mut self) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let Some(delivery) = self
            .queue
            .front_mut()
            .and_then(|head| head.delivery.as_mut())
        else {
            return;
        };

        let (completion, signal) = Completion::new(delivery.change.id());
        delivery.signal = Some(signal);
        renderer.handle_transition(&delivery.change, completion);
    }

    /// Commit the head if the renderer signaled completion.
    fn commit_if_completed(&mut self) -> bool {
        if !self.head_completed() {
            return false;
        }
        let Some(mut head) = self.queue.pop_front() else {
            return false;
        };
        let Some(delivery) = head.delivery.take() else {
            return false;
        };

        self.backstack = reconcile(
            &self.backstack,
            delivery.change.new_state().to_vec(),
            &self.indexer,
        );
        head.status = Status::Completed;
        debug!(
            tag = %self.config.tag,
            transition = %delivery.change.id(),
            size = self.backstack.len(),
            queued = self.queue.len(),
            "Committed state change"
        );

        for (_, listener) in self.listeners.iter_mut() {
            listener.after_transition(&delivery.change);
        }
        true
    }
}

impl<K: Key, V: StateValue> fmt::Debug for Router<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("tag", &self.config.tag)
            .field("backstack", &self.backstack)
            .field("queued", &self.queue.len())
            .field("state", &self.state())
            .field("has_renderer", &self.renderer.is_some())
            .finish()
    }
}
