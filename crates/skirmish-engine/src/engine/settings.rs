//! Per-episode settings resolution.
//!
//! Every episode runs against one [`EffectiveSettings`] snapshot produced by merging,
//! in order:
//!
//! 1. the default settings asset (or [`ArenaSettings::BUILT_IN`] when it is absent)
//! 2. an optional override supplied by the arena manager
//! 3. scalar overrides from an external [`ParameterSource`], looked up by name
//!
//! The default asset is only ever read. The snapshot is a value: components that
//! need derived quantities (boundary radii, obstacle density) take them from the
//! snapshot once per episode.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ConfigError, ensure_non_negative, ensure_positive};

/// Parameter name of [`ArenaSettings::arena_size`].
pub const ARENA_SIZE_PARAM: &str = "arena_size";
/// Parameter name of [`ArenaSettings::obstacle_density`].
pub const OBSTACLE_DENSITY_PARAM: &str = "obstacle_density";
/// Parameter name of [`ArenaSettings::opponent_difficulty`].
pub const OPPONENT_DIFFICULTY_PARAM: &str = "opponent_difficulty";

/// Tunable environment parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    /// Arena radius in world units.
    pub arena_size: f32,
    pub obstacle_density: f32,
    pub opponent_difficulty: f32,
}

impl ArenaSettings {
    pub const BUILT_IN: Self = Self {
        arena_size: 50.0,
        obstacle_density: 0.5,
        opponent_difficulty: 0.5,
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("arena_size", self.arena_size)?;
        ensure_non_negative("obstacle_density", self.obstacle_density)?;
        ensure_non_negative("opponent_difficulty", self.opponent_difficulty)?;
        Ok(())
    }
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self::BUILT_IN
    }
}

/// External source of scalar overrides, typically the trainer's curriculum.
pub trait ParameterSource: fmt::Debug {
    /// Returns the value registered under `name`, or `default` when there is none.
    fn scalar(&self, name: &str, default: f32) -> f32;

    /// Called once per resolution, before any lookup, with the index of the
    /// episode about to start.
    fn prepare(&mut self, _episode: u64) {}
}

impl ParameterSource for BTreeMap<String, f32> {
    fn scalar(&self, name: &str, default: f32) -> f32 {
        self.get(name).copied().unwrap_or(default)
    }
}

impl ParameterSource for HashMap<String, f32> {
    fn scalar(&self, name: &str, default: f32) -> f32 {
        self.get(name).copied().unwrap_or(default)
    }
}

/// Immutable settings snapshot for one episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EffectiveSettings(ArenaSettings);

impl EffectiveSettings {
    #[must_use]
    pub fn arena_size(&self) -> f32 {
        self.0.arena_size
    }

    #[must_use]
    pub fn obstacle_density(&self) -> f32 {
        self.0.obstacle_density
    }

    #[must_use]
    pub fn opponent_difficulty(&self) -> f32 {
        self.0.opponent_difficulty
    }

    /// Returns a copy of the underlying values.
    #[must_use]
    pub fn to_settings(&self) -> ArenaSettings {
        self.0
    }
}

/// Holds the default and override layers and merges them on demand.
#[derive(Debug, Clone, Default)]
pub struct SettingsResolver {
    defaults: Option<ArenaSettings>,
    override_settings: Option<ArenaSettings>,
}

impl SettingsResolver {
    #[must_use]
    pub fn new(defaults: Option<ArenaSettings>) -> Self {
        if defaults.is_none() {
            warn!("no default arena settings configured, using built-in defaults");
        }
        Self {
            defaults,
            override_settings: None,
        }
    }

    #[must_use]
    pub fn defaults(&self) -> Option<&ArenaSettings> {
        self.defaults.as_ref()
    }

    #[must_use]
    pub fn override_settings(&self) -> Option<&ArenaSettings> {
        self.override_settings.as_ref()
    }

    /// Replaces the manager override. Takes effect at the next resolution.
    pub fn set_override(&mut self, settings: Option<ArenaSettings>) {
        self.override_settings = settings;
    }

    #[must_use]
    pub fn resolve(&self, params: Option<&dyn ParameterSource>) -> EffectiveSettings {
        resolve_settings(
            self.defaults.as_ref(),
            self.override_settings.as_ref(),
            params,
        )
    }
}

/// Merges the three settings layers. Later layers win field by field.
#[must_use]
pub fn resolve_settings(
    defaults: Option<&ArenaSettings>,
    override_settings: Option<&ArenaSettings>,
    params: Option<&dyn ParameterSource>,
) -> EffectiveSettings {
    let mut settings = match defaults {
        Some(defaults) => *defaults,
        None => {
            debug!("resolving against built-in arena settings");
            ArenaSettings::BUILT_IN
        }
    };

    if let Some(override_settings) = override_settings {
        settings = *override_settings;
    }

    if let Some(params) = params {
        settings.arena_size = params.scalar(ARENA_SIZE_PARAM, settings.arena_size);
        settings.obstacle_density =
            params.scalar(OBSTACLE_DENSITY_PARAM, settings.obstacle_density);
        settings.opponent_difficulty =
            params.scalar(OPPONENT_DIFFICULTY_PARAM, settings.opponent_difficulty);
    }

    debug!(
        arena_size = settings.arena_size,
        obstacle_density = settings.obstacle_density,
        opponent_difficulty = settings.opponent_difficulty,
        "resolved arena settings"
    );
    EffectiveSettings(settings)
}
