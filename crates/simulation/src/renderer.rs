//! Renderer used by the simulation.

use crate::SimKey;
use navstack_core::{Completion, Renderer};
use navstack_types::{Direction, StateChange, TransitionId};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// Observations shared between the simulated renderers and the runner.
#[derive(Debug, Default)]
pub struct Probe {
    /// Renderer generation currently attached. Bumped by the runner whenever
    /// it removes or swaps the renderer.
    pub generation: u64,

    /// Tokens the renderer did not complete synchronously, tagged with the
    /// generation that received them. The runner turns them into scheduled
    /// completion events.
    pub deferred: Vec<(u64, Completion)>,

    /// Transitions held by the current generation and not completed yet.
    pub outstanding: usize,

    /// Transitions delivered while another one was still outstanding.
    pub overlaps: Vec<TransitionId>,

    /// Every transition id delivered, in order. Redeliveries are not repeated.
    pub delivered: Vec<TransitionId>,

    /// In-flight transitions handed again to a newly attached renderer.
    pub redeliveries: u64,

    /// Replace transitions starting from an empty stack.
    pub attach_replays: u64,

    /// Delivered transitions by direction.
    pub forward: u64,
    pub backward: u64,
    pub replace: u64,

    pub sync_completions: u64,
}

/// Renderer that completes some transitions inline and defers the rest.
pub struct SimulatedRenderer {
    probe: Rc<RefCell<Probe>>,
    generation: u64,
    rng: ChaCha8Rng,
    sync_completion_ratio: f64,
}

impl SimulatedRenderer {
    pub fn new(probe: Rc<RefCell<Probe>>, rng: ChaCha8Rng, sync_completion_ratio: f64) -> Self {
        let generation = probe.borrow().generation;
        Self {
            probe,
            generation,
            rng,
            sync_completion_ratio,
        }
    }
}

impl Renderer<SimKey> for SimulatedRenderer {
    fn handle_transition(&mut self, change: &StateChange<SimKey>, completion: Completion) {
        let mut probe = self.probe.borrow_mut();
        if probe.outstanding > 0 {
            probe.overlaps.push(change.id());
        }
        if probe.delivered.last() == Some(&change.id()) {
            probe.redeliveries += 1;
            trace!(transition = %change.id(), generation = self.generation, "Redelivered");
        } else {
            probe.delivered.push(change.id());
            match change.direction() {
                Direction::Forward => probe.forward += 1,
                Direction::Backward => probe.backward += 1,
                Direction::Replace => probe.replace += 1,
            }
            if change.direction() == Direction::Replace && change.previous_state().is_empty() {
                probe.attach_replays += 1;
            }
        }

        if self.rng.gen_bool(self.sync_completion_ratio) {
            probe.sync_completions += 1;
            drop(probe);
            trace!(transition = %change.id(), "Completing synchronously");
            completion.complete();
        } else {
            probe.outstanding += 1;
            probe.deferred.push((self.generation, completion));
        }
    }
}
