//! Virtual-time event queue.

use crate::NavAction;
use navstack_core::Completion;
use std::time::Duration;

/// Ordering key for scheduled events.
///
/// Events fire by simulated time; ties are broken by scheduling order so a
/// run is reproducible from its seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventKey {
    pub time: Duration,
    pub sequence: u64,
}

/// Something that happens at a point in simulated time.
#[derive(Debug)]
pub enum Event {
    /// Issue the next workload action.
    Step,
    /// Perform a specific navigation action.
    Navigate(NavAction),
    /// A renderer finishes a deferred transition. `generation` identifies the
    /// renderer that received the token.
    Complete {
        generation: u64,
        completion: Completion,
    },
    /// The host becomes visible again.
    Resume,
    /// A fresh renderer is attached after a detach.
    Attach,
}
