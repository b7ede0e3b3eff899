//! Episode lifecycle and reward administration for trainable combat arenas.
//!
//! An [`Arena`] owns a roster of combatants ("ships"), the agent controllers bound
//! to them, and the machinery that turns combat into a clean episodic training
//! signal:
//!
//! - [`SettingsResolver`] merges default, override and trainer-supplied settings
//!   into one [`EffectiveSettings`] snapshot per episode
//! - [`BoundaryMonitor`] applies the soft/hard two-radius boundary
//! - [`RewardAdministrator`] converts damage, deaths and boundary violations into
//!   reward grants
//! - [`EpisodeOrchestrator`] gates reward accumulation and sequences the reset
//! - [`MetricsAggregator`] accumulates per-episode statistics and flushes them
//!
//! Ship physics, weapons, observations and the trainer itself live outside this
//! crate and talk to the arena through [`Combatant`], [`AgentController`],
//! [`ArenaPopulation`], [`ParameterSource`] and [`MetricsSink`].

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Rejected arena configuration.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("hard boundary multiplier ({hard}) must be greater than soft multiplier ({soft})")]
    InvalidBoundary { soft: f32, hard: f32 },
    #[display("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[display("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[display("{name} is too large for a duration, got {value}")]
    DurationOutOfRange { name: &'static str, value: f32 },
    #[display("spawn radius fraction ({spawn}) must be less than soft multiplier ({soft})")]
    SpawnOutsideBoundary { spawn: f32, soft: f32 },
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ArenaError {
    #[display("no combatant registered as {id}")]
    UnknownCombatant { id: CombatantId },
    #[display("combatant {id} has been removed from the arena")]
    MissingCombatant { id: CombatantId },
}

pub(crate) fn ensure_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

/// Converts `value` seconds into a [`Duration`], rejecting negative and
/// unrepresentable values.
///
/// [`Duration`]: std::time::Duration
pub fn ensure_duration(
    name: &'static str,
    value: f32,
) -> Result<std::time::Duration, ConfigError> {
    ensure_non_negative(name, value)?;
    std::time::Duration::try_from_secs_f32(value)
        .map_err(|_| ConfigError::DurationOutOfRange { name, value })
}

pub(crate) fn ensure_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}
