//! Turn-structured simulation for Rasterwelt.
//!
//! A global clock advances in explicit steps. Every entity keeps a local
//! clock that its own actions push forward; after each step the entities in
//! the player's area that lag behind act until the scheduler's catch-up
//! policy for their kind is satisfied. Actions come from scripts run by the
//! [`ScriptEngine`], and movement goes through the A* [`Pathfinder`].
//!
//! Script assignments live in the scheduler, not on entities, so `rw-core`
//! stays free of behavior.

/// Built-in behaviors available to every script engine.
pub mod behavior;
/// The global clock.
pub mod clock;
/// Configuration for a simulation run.
pub mod config;
/// Mutable context handed to behaviors and systems.
pub mod context;
/// Error types for the simulation crate.
pub mod error;
/// Simulation events and the event log.
pub mod event;
/// Marks areas the player has entered.
pub mod exploration;
/// A* search over area tiles.
pub mod pathfind;
/// The time-debt scheduler.
pub mod scheduler;
/// Script values and the engine that runs them.
pub mod script;
/// The top-level orchestrator.
pub mod simulation;
/// Snapshots of a whole simulation.
pub mod snapshot;
/// Pre- and post-step hooks.
pub mod system;

#[cfg(test)]
mod test_support;

pub use clock::GameClock;
pub use config::{DEFAULT_ACTION_COST, SimConfig};
pub use context::SimContext;
pub use error::{SimError, SimResult};
pub use event::{EventLog, SimEvent, SimEventKind};
pub use exploration::ExplorationSystem;
pub use pathfind::{DIAGONAL_COST, ORTHOGONAL_COST, PathTarget, Pathfinder, find_path};
pub use scheduler::{CatchUp, Scheduler, catch_up_policy};
pub use script::{BehaviorFn, Script, ScriptEngine};
pub use simulation::Simulation;
pub use snapshot::{ScriptAssignment, SimSnapshot};
pub use system::System;
