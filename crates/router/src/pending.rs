//! Queued transition requests.

use navstack_core::CompletionSignal;
use navstack_types::{Reduction, StateChange};

/// A reducer maps a copy of the committed stack to the next configuration.
pub type Reducer<K> = Box<dyn FnOnce(Vec<K>) -> Reduction<K>>;

/// Lifecycle of a queued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Waiting in the queue.
    Enqueued,
    /// Handed to the renderer; waiting for completion.
    InProgress,
    /// Committed or discarded. Terminal; the entry leaves the queue.
    Completed,
}

/// What a queued entry will do when it reaches the head.
pub(crate) enum Request<K> {
    /// Synthesized when a renderer attaches: replay the committed stack (or
    /// the initial keys) from an empty previous state.
    Attach,
    /// Caller-issued reducer.
    Reduce(Reducer<K>),
}

/// The change handed to the renderer plus the signal of its current token.
///
/// `signal` is `None` when the renderer that received the change was detached
/// before completing; the change is then redelivered to the next renderer.
pub(crate) struct Delivery<K> {
    pub(crate) change: StateChange<K>,
    pub(crate) signal: Option<CompletionSignal>,
}

/// One entry of the transition queue.
pub(crate) struct PendingStateChange<K> {
    pub(crate) request: Option<Request<K>>,
    pub(crate) status: Status,
    pub(crate) delivery: Option<Delivery<K>>,
}

impl<K> PendingStateChange<K> {
    pub(crate) fn new(request: Request<K>) -> Self {
        Self {
            request: Some(request),
            status: Status::Enqueued,
            delivery: None,
        }
    }

    pub(crate) fn is_attach(&self) -> bool {
        matches!(self.request, Some(Request::Attach))
    }

    /// Whether the current renderer has signaled completion.
    pub(crate) fn is_completed_by_renderer(&self) -> bool {
        self.status == Status::InProgress
            && self
                .delivery
                .as_ref()
                .and_then(|d| d.signal.as_ref())
                .is_some_and(CompletionSignal::is_completed)
    }

    /// In progress but not held by any renderer.
    pub(crate) fn needs_redelivery(&self) -> bool {
        self.status == Status::InProgress
            && self.delivery.as_ref().is_some_and(|d| d.signal.is_none())
    }
}
