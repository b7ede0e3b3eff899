use serde::{Deserialize, Serialize};

use crate::{
    ArenaSettings, BoundaryConfig, ConfigError, EpisodeConfig, MetricsConfig, RewardConfig,
};

/// Static configuration of an arena. Per-episode values live in [`ArenaSettings`].
///
/// Every section falls back to its defaults when omitted from JSON:
///
/// ```
/// use skirmish_engine::ArenaConfig;
///
/// let config: ArenaConfig =
///     serde_json::from_str(r#"{ "boundary": { "hard_multiplier": 1.5 } }"#).unwrap();
/// assert_eq!(config.boundary.hard_multiplier, 1.5);
/// assert_eq!(config.boundary.soft_multiplier, 0.75);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// The default settings asset. `None` falls back to [`ArenaSettings::BUILT_IN`].
    pub defaults: Option<ArenaSettings>,
    pub reward: RewardConfig,
    pub boundary: BoundaryConfig,
    pub episode: EpisodeConfig,
    pub metrics: MetricsConfig,
    /// Seed of the spawn randomizer. Random when absent.
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            defaults: Some(ArenaSettings::default()),
            reward: RewardConfig::default(),
            boundary: BoundaryConfig::default(),
            episode: EpisodeConfig::default(),
            metrics: MetricsConfig::default(),
            seed: None,
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(defaults) = &self.defaults {
            defaults.validate()?;
        }
        self.reward.validate()?;
        self.boundary.validate()?;
        self.episode.validate()?;
        // Ships spawned past the soft radius start the episode already penalized.
        let spawn = self.episode.spawn_radius_fraction;
        let soft = self.boundary.soft_multiplier;
        if spawn >= soft {
            return Err(ConfigError::SpawnOutsideBoundary { spawn, soft });
        }
        Ok(())
    }
}
