//! Completion tokens handed to renderers.

use navstack_types::TransitionId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-shot completion token for a dispatched transition.
///
/// The token is move-only and consumed by [`Completion::complete`], so a
/// renderer cannot signal the same transition twice. It is `Send`: the
/// renderer may finish its work on another thread, in which case the host
/// picks up the signal with `Router::poll_completion`.
#[derive(Debug)]
pub struct Completion {
    id: TransitionId,
    flag: Arc<AtomicBool>,
}

/// Router-side view of a [`Completion`].
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    id: TransitionId,
    flag: Arc<AtomicBool>,
}

impl Completion {
    /// Create a token and the signal the router keeps for it.
    pub fn new(id: TransitionId) -> (Self, CompletionSignal) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Self {
                id,
                flag: Arc::clone(&flag),
            },
            CompletionSignal { id, flag },
        )
    }

    /// The transition this token completes.
    pub fn id(&self) -> TransitionId {
        self.id
    }

    /// Signal that the renderer finished the transition.
    pub fn complete(self) {
        self.flag.store(true, Ordering::Release);
    }
}

impl CompletionSignal {
    pub fn id(&self) -> TransitionId {
        self.id
    }

    /// Whether the renderer has called [`Completion::complete`].
    pub fn is_completed(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
