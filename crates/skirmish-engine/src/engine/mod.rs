//! Episode lifecycle and reward administration.
//!
//! - [`Arena`] - owns the roster and wires every component together
//! - [`EpisodeOrchestrator`] - the `Active → Ending → Resetting → Active` gate
//! - [`RewardAdministrator`] - damage, kill, existence and boundary rewards
//! - [`BoundaryMonitor`] - soft/hard radii derived from the arena size
//! - [`SettingsResolver`] - default → override → trainer parameter merge
//! - [`MetricsAggregator`] - per-episode statistics flushed before each reset
//!
//! # Tick Flow
//!
//! 1. Combatant timers advance
//! 2. A pending reset sequence is driven forward (see [`ResetStage`])
//! 3. While the gate is open: existence penalty, boundary sweep, distance sampling,
//!    time limit
//!
//! Damage enters through [`Arena::apply_damage`] at any point between ticks. Any
//! terminal condition calls [`Arena::request_end`], which closes the gate
//! synchronously; repeated requests before the reset completes are ignored.

pub use self::{
    arena::*, boundary::*, config::*, event::*, metrics::*, orchestrator::*, population::*,
    reward::*, roster::*, settings::*,
};

mod arena;
mod boundary;
mod config;
mod event;
mod metrics;
mod orchestrator;
mod population;
mod reward;
mod roster;
mod settings;
