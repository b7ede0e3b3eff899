use glam::Vec3;
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use skirmish_engine::ArenaPopulation;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleFieldConfig {
    /// Obstacle count at density `1.0`.
    pub max_obstacles: usize,
    /// Radius of the disc around the anchor that obstacles are scattered in.
    pub spread: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for ObstacleFieldConfig {
    fn default() -> Self {
        Self {
            max_obstacles: 40,
            spread: 50.0,
            min_radius: 0.5,
            max_radius: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub position: Vec3,
    pub radius: f32,
}

/// Scenery of asteroids scattered on the arena plane.
#[derive(Debug, Clone)]
pub struct ObstacleField {
    config: ObstacleFieldConfig,
    anchor: Vec3,
    density: f32,
    obstacles: Vec<Obstacle>,
    respawn_count: u64,
    rng: Pcg32,
}

impl ObstacleField {
    #[must_use]
    pub fn new(config: ObstacleFieldConfig, seed: u64) -> Self {
        Self {
            config,
            anchor: Vec3::ZERO,
            density: 0.0,
            obstacles: vec![],
            respawn_count: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    #[must_use]
    pub fn density(&self) -> f32 {
        self.density
    }

    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    #[must_use]
    pub fn respawn_count(&self) -> u64 {
        self.respawn_count
    }

    /// Number of obstacles a respawn produces at the current density.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn target_count(&self) -> usize {
        (self.density * self.config.max_obstacles as f32).round() as usize
    }
}

impl ArenaPopulation for ObstacleField {
    fn set_anchor(&mut self, center: Vec3) {
        self.anchor = center;
    }

    fn set_density(&mut self, density: f32) {
        self.density = if density.is_finite() {
            density.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    fn respawn_obstacles(&mut self) {
        let count = self.target_count();
        let ObstacleFieldConfig {
            spread,
            min_radius,
            max_radius,
            ..
        } = self.config;

        self.obstacles.clear();
        for _ in 0..count {
            let distance = spread * self.rng.random::<f32>().sqrt();
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            let radius = if max_radius > min_radius {
                self.rng.random_range(min_radius..=max_radius)
            } else {
                min_radius
            };
            self.obstacles.push(Obstacle {
                position: self.anchor
                    + Vec3::new(distance * angle.cos(), 0.0, distance * angle.sin()),
                radius,
            });
        }
        self.respawn_count += 1;
        debug!(count, density = self.density, "respawned obstacles");
    }
}
