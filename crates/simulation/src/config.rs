//! Configuration types for the simulation.

use std::time::Duration;

/// Configuration for a simulation run.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Random seed for deterministic simulation.
    pub seed: u64,

    /// Number of navigation actions to issue.
    pub steps: usize,

    /// Simulated time between two actions.
    pub step_interval: Duration,

    /// Upper bound for the delay of a deferred completion.
    pub max_completion_delay: Duration,

    /// Probability that the renderer completes inside `handle_transition`.
    pub sync_completion_ratio: f64,

    /// Probability that an action is a back navigation.
    pub back_ratio: f64,

    /// Probability that an action is a reducer yielding a no-op.
    pub noop_ratio: f64,

    /// Probability that an action pauses the router for a while.
    pub pause_ratio: f64,

    /// Probability that an action removes or swaps the renderer.
    pub swap_ratio: f64,

    /// Probability that a forward action replaces the top instead of pushing.
    pub replace_ratio: f64,

    /// Number of distinct keys the workload draws from.
    pub key_space: u32,
}

impl SimulationConfig {
    /// Create a configuration with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            steps: 200,
            step_interval: Duration::from_millis(10),
            max_completion_delay: Duration::from_millis(35),
            sync_completion_ratio: 0.3,
            back_ratio: 0.3,
            noop_ratio: 0.1,
            pause_ratio: 0.05,
            swap_ratio: 0.03,
            replace_ratio: 0.15,
            key_space: 8,
        }
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of actions.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Set the time between actions.
    pub fn with_step_interval(mut self, interval: Duration) -> Self {
        self.step_interval = interval;
        self
    }

    /// Set the maximum completion delay.
    pub fn with_max_completion_delay(mut self, delay: Duration) -> Self {
        self.max_completion_delay = delay;
        self
    }

    /// Set the synchronous completion ratio.
    pub fn with_sync_completion_ratio(mut self, ratio: f64) -> Self {
        self.sync_completion_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the back navigation ratio.
    pub fn with_back_ratio(mut self, ratio: f64) -> Self {
        self.back_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the no-op ratio.
    pub fn with_noop_ratio(mut self, ratio: f64) -> Self {
        self.noop_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the pause ratio.
    pub fn with_pause_ratio(mut self, ratio: f64) -> Self {
        self.pause_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the renderer swap ratio.
    pub fn with_swap_ratio(mut self, ratio: f64) -> Self {
        self.swap_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the replace ratio.
    pub fn with_replace_ratio(mut self, ratio: f64) -> Self {
        self.replace_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the number of distinct keys.
    pub fn with_key_space(mut self, key_space: u32) -> Self {
        self.key_space = key_space.max(1);
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new(12345)
    }
}
