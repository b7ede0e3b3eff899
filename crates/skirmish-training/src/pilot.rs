//! Heuristic ship controller.
//!
//! A [`ScriptedPilot`] stands in for a policy network during headless runs. Each
//! step it:
//!
//! 1. picks the nearest live opponent on the arena plane
//! 2. closes in until it reaches its preferred engagement distance, with Gaussian
//!    steering noise
//! 3. fires when the target is in range and the weapon has cooled down
//!
//! The chance of a shot landing is `base_hit_chance` scaled by the arena's current
//! opponent difficulty, so a curriculum that raises difficulty makes scripted
//! opponents more dangerous.

use std::time::Duration;

use glam::Vec3;
use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};
use skirmish_engine::{
    Arena, ArenaError, CombatantId, ConfigError, DamageReport, ensure_duration, planar_distance,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    /// World units per second.
    pub speed: f32,
    pub weapon_range: f32,
    /// Distance the pilot tries to keep from its target, as a fraction of the range.
    pub engagement_fraction: f32,
    pub weapon_damage: f32,
    pub fire_interval_secs: f32,
    /// Hit probability at opponent difficulty `0.5`.
    pub base_hit_chance: f32,
    /// Standard deviation of the steering noise in world units per step.
    pub steering_noise: f32,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            speed: 12.0,
            weapon_range: 20.0,
            engagement_fraction: 0.6,
            weapon_damage: 15.0,
            fire_interval_secs: 0.25,
            base_hit_chance: 0.5,
            steering_noise: 0.05,
        }
    }
}

/// Hit probability for a shot fired at `difficulty`.
#[must_use]
pub fn hit_chance(base: f32, difficulty: f32) -> f32 {
    (base * 2.0 * difficulty).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct ScriptedPilot {
    id: CombatantId,
    config: PilotConfig,
    fire_interval: Duration,
    cooldown: Duration,
    noise: Normal<f32>,
}

impl ScriptedPilot {
    pub fn new(id: CombatantId, config: PilotConfig) -> Result<Self, ConfigError> {
        let noise = Normal::new(0.0, config.steering_noise).map_err(|_| ConfigError::Negative {
            name: "pilot.steering_noise",
            value: config.steering_noise,
        })?;
        let fire_interval = ensure_duration("pilot.fire_interval_secs", config.fire_interval_secs)?;
        Ok(Self {
            id,
            config,
            fire_interval,
            cooldown: Duration::ZERO,
            noise,
        })
    }

    #[must_use]
    pub fn id(&self) -> CombatantId {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &PilotConfig {
        &self.config
    }

    /// Nearest live opponent of `id` on the arena plane.
    #[must_use]
    pub fn nearest_opponent(arena: &Arena, id: CombatantId) -> Option<(CombatantId, f32)> {
        let position = arena.combatant(id)?.position();
        let roster = arena.roster();
        roster
            .ids()
            .filter(|other| roster.are_opponents(id, *other) && roster.is_alive(*other))
            .filter_map(|other| {
                let target = roster.combatant(other)?.position();
                Some((other, planar_distance(target, position)))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
    }

    /// Moves the pilot's ship and fires if possible.
    ///
    /// Returns the report of a shot that landed. A dead or removed ship does nothing.
    pub fn step<R>(
        &mut self,
        arena: &mut Arena,
        dt: Duration,
        rng: &mut R,
    ) -> Result<Option<DamageReport>, ArenaError>
    where
        R: Rng + ?Sized,
    {
        self.cooldown = self.cooldown.saturating_sub(dt);

        let Some(ship) = arena.combatant(self.id).filter(|c| c.is_alive()) else {
            return Ok(None);
        };
        let position = ship.position();
        let Some((target, distance)) = Self::nearest_opponent(arena, self.id) else {
            return Ok(None);
        };
        let Some(target_position) = arena.combatant(target).map(|c| c.position()) else {
            return Ok(None);
        };

        let mut direction = target_position - position;
        direction.y = 0.0;
        let direction = direction.normalize_or_zero();
        let preferred = self.config.weapon_range * self.config.engagement_fraction;
        let travel = (distance - preferred).clamp(
            -self.config.speed * dt.as_secs_f32(),
            self.config.speed * dt.as_secs_f32(),
        );
        let noise = Vec3::new(self.noise.sample(rng), 0.0, self.noise.sample(rng));
        let heading = direction.x.atan2(direction.z);
        arena.steer(self.id, position + direction * travel + noise, heading)?;

        if distance > self.config.weapon_range || !self.cooldown.is_zero() {
            return Ok(None);
        }
        self.cooldown = self.fire_interval;

        let chance = hit_chance(
            self.config.base_hit_chance,
            arena.settings().opponent_difficulty(),
        );
        if !rng.random_bool(chance.into()) {
            return Ok(None);
        }
        arena.apply_damage(target, Some(self.id), self.config.weapon_damage)
    }
}
