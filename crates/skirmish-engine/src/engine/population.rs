use std::fmt;

use glam::Vec3;

/// Manages non-combatant scenery (asteroids, debris) around the arena.
///
/// Called once per reset, after settings have been resolved: anchor, then density,
/// then respawn.
pub trait ArenaPopulation: fmt::Debug {
    fn set_anchor(&mut self, center: Vec3);

    fn set_density(&mut self, density: f32);

    fn respawn_obstacles(&mut self);
}
