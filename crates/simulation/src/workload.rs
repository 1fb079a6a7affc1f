//! Random navigation workload.

use crate::{SimKey, SimulationConfig};
use rand::Rng;
use std::time::Duration;

/// One action issued against the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    /// Append a key.
    Push(SimKey),
    /// Swap the top key.
    ReplaceTop(SimKey),
    /// Enqueue a reducer that yields a no-op.
    NoOp,
    /// Call `handle_back`.
    Back,
    /// Pause the router and resume it after the given delay.
    Pause(Duration),
    /// Replace the renderer. With a zero gap the new renderer is attached
    /// right away; otherwise the old one is removed and the new one attached
    /// after the gap.
    SwapRenderer(Duration),
}

/// Draws actions according to the configured ratios.
#[derive(Debug, Clone)]
pub struct Workload {
    back_ratio: f64,
    noop_ratio: f64,
    pause_ratio: f64,
    swap_ratio: f64,
    replace_ratio: f64,
    key_space: u32,
    max_pause: Duration,
}

impl Workload {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            back_ratio: config.back_ratio,
            noop_ratio: config.noop_ratio,
            pause_ratio: config.pause_ratio,
            swap_ratio: config.swap_ratio,
            replace_ratio: config.replace_ratio,
            key_space: config.key_space.max(1),
            max_pause: config.step_interval * 4,
        }
    }

    /// Generate the next action.
    pub fn next_action(&self, rng: &mut impl Rng) -> NavAction {
        let roll: f64 = rng.gen();
        let mut threshold = self.back_ratio;
        if roll < threshold {
            return NavAction::Back;
        }
        threshold += self.noop_ratio;
        if roll < threshold {
            return NavAction::NoOp;
        }
        threshold += self.pause_ratio;
        if roll < threshold {
            return NavAction::Pause(random_delay(rng, self.max_pause));
        }
        threshold += self.swap_ratio;
        if roll < threshold {
            let gap = if rng.gen_bool(0.5) {
                Duration::ZERO
            } else {
                random_delay(rng, self.max_pause)
            };
            return NavAction::SwapRenderer(gap);
        }

        let key = rng.gen_range(0..self.key_space);
        if rng.gen_bool(self.replace_ratio) {
            NavAction::ReplaceTop(key)
        } else {
            NavAction::Push(key)
        }
    }
}

/// Uniform delay in `1ms..=max` (at least one millisecond).
pub(crate) fn random_delay(rng: &mut impl Rng, max: Duration) -> Duration {
    let max_ms = (max.as_millis() as u64).max(1);
    Duration::from_millis(rng.gen_range(1..=max_ms))
}
