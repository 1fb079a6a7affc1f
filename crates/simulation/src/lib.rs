//! Deterministic simulation runner.
//!
//! This crate drives a [`Router`](navstack_router::Router) with a seeded
//! random workload and a renderer whose completions arrive after random
//! virtual delays. Given the same seed, it produces identical results every
//! run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  SimulationRunner                       │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Event Queue (BTreeMap<EventKey, Event>)        │ │
//! │  │     Ordered by: time, sequence                     │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Router<SimKey> + SimulatedRenderer             │ │
//! │  │     Deferred completions become new events         │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Invariant checks after every event             │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod config;
mod event_queue;
mod renderer;
mod runner;
mod workload;

pub use config::SimulationConfig;
pub use event_queue::{Event, EventKey};
pub use renderer::{Probe, SimulatedRenderer};
pub use runner::{SimulationError, SimulationRunner, SimulationStats};
pub use workload::{NavAction, Workload};

/// Destination key used by simulated routers.
pub type SimKey = u32;
