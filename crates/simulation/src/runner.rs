//! Simulation runner.

use crate::renderer::{Probe, SimulatedRenderer};
use crate::workload::random_delay;
use crate::{Event, EventKey, NavAction, SimKey, SimulationConfig, Workload};
use navstack_core::{JsonKeySerializer, TransitionListener};
use navstack_router::navigation::{push, replace_top};
use navstack_router::{is_monotonic, Router, RouterConfig, RouterError};
use navstack_types::{BackstackEntry, Reduction, StateChange, TransactionIndex, TransitionId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, trace};

const ROUTER_TAG: &str = "sim";

/// Invariant violations detected during a run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Transition {0} delivered while another was outstanding")]
    Overlap(TransitionId),

    #[error("Request {found} reduced after request {previous}")]
    OutOfOrder { previous: u64, found: u64 },

    #[error("Transaction indices not increasing at {time:?}: {indices:?}")]
    NonMonotonic {
        time: Duration,
        indices: Vec<TransactionIndex>,
    },

    #[error("Renderer saw {found} forward/replace transitions, expected {expected}")]
    UnexpectedDelivery { expected: u64, found: u64 },

    #[error("{replays} attach replays for {attaches} renderer attaches")]
    UnexpectedReplay { attaches: u64, replays: u64 },

    #[error("{delivered} transitions delivered but {committed} committed")]
    CommitMismatch { delivered: u64, committed: u64 },

    #[error("Queue stalled with {pending} pending requests")]
    Stalled { pending: usize },

    #[error("Restored backstack {restored:?} differs from saved {saved:?}")]
    RoundTrip {
        saved: Vec<SimKey>,
        restored: Vec<SimKey>,
    },

    #[error(transparent)]
    Router(#[from] RouterError),
}

/// Statistics collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub steps: usize,
    pub pushes: u64,
    pub replaces: u64,
    pub noops: u64,
    pub backs_accepted: u64,
    pub backs_rejected: u64,
    pub pauses: u64,
    pub swaps: u64,
    pub redeliveries: u64,
    pub deliveries: u64,
    pub commits: u64,
    pub sync_completions: u64,
    pub deferred_completions: u64,
    pub max_queue_depth: usize,
    pub final_backstack: Vec<SimKey>,
    pub end_time: Duration,
}

/// Counts committed transitions.
struct CommitCounter(Rc<Cell<u64>>);

impl TransitionListener<SimKey> for CommitCounter {
    fn after_transition(&mut self, _change: &StateChange<SimKey>) {
        self.0.set(self.0.get() + 1);
    }
}

/// Deterministic driver for one router.
///
/// Processes events in `(time, sequence)` order. Every event may enqueue
/// requests, deliver transitions and defer completions; deferred completions
/// are scheduled as new events after a random delay.
pub struct SimulationRunner {
    config: SimulationConfig,
    router: Router<SimKey>,
    probe: Rc<RefCell<Probe>>,
    workload: Workload,
    rng: ChaCha8Rng,
    events: BTreeMap<EventKey, Event>,
    now: Duration,
    sequence: u64,
    steps_issued: usize,

    /// Request numbers in the order their reducers ran.
    reducer_order: Rc<RefCell<Vec<u64>>>,
    next_request: u64,

    /// Workload reducers that produced a transition.
    reduced_transitions: Rc<Cell<u64>>,

    commits: Rc<Cell<u64>>,
    stats: SimulationStats,
}

impl SimulationRunner {
    /// Create a runner with an attached renderer and the first step scheduled.
    pub fn new(config: SimulationConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let commits = Rc::new(Cell::new(0));
        let mut router: Router<SimKey> = Router::new(
            RouterConfig::new(vec![0]).with_tag(ROUTER_TAG),
            Box::new(JsonKeySerializer::new()),
        );
        router.add_listener(CommitCounter(Rc::clone(&commits)));

        let mut runner = Self {
            workload: Workload::new(&config),
            config,
            router,
            probe: Rc::new(RefCell::new(Probe::default())),
            rng,
            events: BTreeMap::new(),
            now: Duration::ZERO,
            sequence: 0,
            steps_issued: 0,
            reducer_order: Rc::new(RefCell::new(Vec::new())),
            next_request: 0,
            reduced_transitions: Rc::new(Cell::new(0)),
            commits,
            stats: SimulationStats::default(),
        };

        let renderer = runner.next_renderer();
        runner.router.set_renderer(renderer);
        runner.schedule_deferred();
        if runner.config.steps > 0 {
            runner.schedule(Duration::ZERO, Event::Step);
        }
        runner
    }

    pub fn router(&self) -> &Router<SimKey> {
        &self.router
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `event` at absolute simulated time `time`.
    pub fn schedule(&mut self, time: Duration, event: Event) {
        let key = EventKey {
            time,
            sequence: self.sequence,
        };
        self.sequence += 1;
        self.events.insert(key, event);
    }

    /// Process all events and verify the end state.
    pub fn run(&mut self) -> Result<SimulationStats, SimulationError> {
        while let Some((key, event)) = self.events.pop_first() {
            self.now = key.time;
            self.process(event);
            self.schedule_deferred();
            self.check_after_event()?;
        }
        self.finish()
    }

    fn process(&mut self, event: Event) {
        trace!(time = ?self.now, event = ?event, "Processing event");
        match event {
            Event::Step => {
                let action = self.workload.next_action(&mut self.rng);
                self.apply(action);
                self.steps_issued += 1;
                if self.steps_issued < self.config.steps {
                    let next = self.now + self.config.step_interval;
                    self.schedule(next, Event::Step);
                }
            }
            Event::Navigate(action) => self.apply(action),
            Event::Complete {
                generation,
                completion,
            } => {
                {
                    let mut probe = self.probe.borrow_mut();
                    if generation == probe.generation {
                        probe.outstanding = probe.outstanding.saturating_sub(1);
                    }
                }
                self.stats.deferred_completions += 1;
                completion.complete();
                self.router.poll_completion();
            }
            Event::Resume => self.router.resume(),
            Event::Attach => {
                let renderer = self.next_renderer();
                self.router.set_renderer(renderer);
            }
        }
    }

    fn apply(&mut self, action: NavAction) {
        debug!(time = ?self.now, action = ?action, "Applying action");
        match action {
            NavAction::Push(key) => {
                self.stats.pushes += 1;
                self.enqueue_tracked(push(key));
            }
            NavAction::ReplaceTop(key) => {
                self.stats.replaces += 1;
                self.enqueue_tracked(replace_top(key));
            }
            NavAction::NoOp => {
                self.stats.noops += 1;
                self.enqueue_tracked(|_| Reduction::NoOp);
            }
            NavAction::Back => {
                if self.router.handle_back() {
                    self.stats.backs_accepted += 1;
                } else {
                    self.stats.backs_rejected += 1;
                }
            }
            NavAction::Pause(duration) => {
                if !self.router.is_paused() {
                    self.stats.pauses += 1;
                    self.router.pause();
                    let at = self.now + duration;
                    self.schedule(at, Event::Resume);
                }
            }
            NavAction::SwapRenderer(gap) => {
                if !self.router.has_renderer() {
                    return;
                }
                self.stats.swaps += 1;
                self.retire_renderer();
                if gap.is_zero() {
                    let renderer = self.next_renderer();
                    self.router.set_renderer(renderer);
                } else {
                    self.router.remove_renderer();
                    let at = self.now + gap;
                    self.schedule(at, Event::Attach);
                }
            }
        }
    }

    /// Build a renderer for the current generation with its own seeded rng.
    fn next_renderer(&mut self) -> SimulatedRenderer {
        SimulatedRenderer::new(
            Rc::clone(&self.probe),
            ChaCha8Rng::seed_from_u64(self.rng.gen()),
            self.config.sync_completion_ratio,
        )
    }

    /// Start a new renderer generation. Tokens held by the old renderer no
    /// longer count as outstanding.
    fn retire_renderer(&mut self) {
        let mut probe = self.probe.borrow_mut();
        probe.generation += 1;
        probe.outstanding = 0;
    }

    /// Enqueue `reducer`, recording when it runs and whether it produced a
    /// transition.
    fn enqueue_tracked<F>(&mut self, reducer: F)
    where
        F: FnOnce(Vec<SimKey>) -> Reduction<SimKey> + 'static,
    {
        let request = self.next_request;
        self.next_request += 1;
        let order = Rc::clone(&self.reducer_order);
        let produced = Rc::clone(&self.reduced_transitions);
        self.router.set_backstack(move |stack| {
            order.borrow_mut().push(request);
            let reduction = reducer(stack);
            if !reduction.is_noop() {
                produced.set(produced.get() + 1);
            }
            reduction
        });
    }

    /// Turn tokens the renderer deferred into completion events.
    fn schedule_deferred(&mut self) {
        let deferred = std::mem::take(&mut self.probe.borrow_mut().deferred);
        for (generation, completion) in deferred {
            let delay = random_delay(&mut self.rng, self.config.max_completion_delay);
            let at = self.now + delay;
            self.schedule(
                at,
                Event::Complete {
                    generation,
                    completion,
                },
            );
        }
    }

    fn check_after_event(&mut self) -> Result<(), SimulationError> {
        self.stats.max_queue_depth = self.stats.max_queue_depth.max(self.router.pending_count());

        if let Some(id) = self.probe.borrow().overlaps.first() {
            return Err(SimulationError::Overlap(*id));
        }

        let order = self.reducer_order.borrow();
        if let Some(pair) = order.windows(2).find(|w| w[0] >= w[1]) {
            return Err(SimulationError::OutOfOrder {
                previous: pair[0],
                found: pair[1],
            });
        }

        if !is_monotonic(self.router.entries()) {
            return Err(SimulationError::NonMonotonic {
                time: self.now,
                indices: self
                    .router
                    .entries()
                    .iter()
                    .map(BackstackEntry::transaction_index)
                    .collect(),
            });
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<SimulationStats, SimulationError> {
        let pending = self.router.pending_count();
        if pending > 0 {
            return Err(SimulationError::Stalled { pending });
        }

        let probe = self.probe.borrow();
        let delivered = probe.delivered.len() as u64;
        let committed = self.commits.get();
        if delivered != committed {
            return Err(SimulationError::CommitMismatch {
                delivered,
                committed,
            });
        }

        // Every attach queues at most one replay, and the first one always
        // runs.
        let attaches = 1 + self.stats.swaps;
        let replays = probe.attach_replays;
        if replays == 0 || replays > attaches {
            return Err(SimulationError::UnexpectedReplay { attaches, replays });
        }

        // Apart from attach replays, forward and replace transitions come
        // only from workload reducers; backs are always backward.
        let expected = replays + self.reduced_transitions.get();
        let found = probe.forward + probe.replace;
        if expected != found {
            return Err(SimulationError::UnexpectedDelivery { expected, found });
        }

        self.stats.steps = self.steps_issued;
        self.stats.deliveries = delivered;
        self.stats.commits = committed;
        self.stats.sync_completions = probe.sync_completions;
        self.stats.redeliveries = probe.redeliveries;
        self.stats.final_backstack = self.router.backstack();
        self.stats.end_time = self.now;
        drop(probe);

        self.check_round_trip()?;

        info!(
            seed = self.config.seed,
            steps = self.stats.steps,
            deliveries = self.stats.deliveries,
            max_queue_depth = self.stats.max_queue_depth,
            final_size = self.stats.final_backstack.len(),
            "Simulation complete"
        );
        Ok(self.stats.clone())
    }

    /// Save the final state and restore it into a fresh router.
    fn check_round_trip(&mut self) -> Result<(), SimulationError> {
        let blob = self.router.save_to_string()?;
        let mut restored: Router<SimKey> = Router::new(
            RouterConfig::default().with_tag(ROUTER_TAG),
            Box::new(JsonKeySerializer::new()),
        );
        restored.restore_from_str(&blob)?;

        let same_indices = restored
            .entries()
            .iter()
            .zip(self.router.entries())
            .all(|(a, b)| a.transaction_index() == b.transaction_index());
        if restored.backstack() != self.router.backstack() || !same_indices {
            return Err(SimulationError::RoundTrip {
                saved: self.router.backstack(),
                restored: restored.backstack(),
            });
        }
        Ok(())
    }
}
