use std::{fmt, time::Duration};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Index of a participant slot inside an arena roster.
///
/// Ids are handed out by [`Arena::register`](crate::Arena::register) in registration
/// order and stay valid for the lifetime of the arena, even after the combatant in
/// the slot has been removed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("{_0}")]
pub struct CombatantId(pub usize);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("team {_0}")]
pub struct TeamId(pub u8);

/// Outcome of a hit that actually landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageReport {
    /// Damage applied to shield and health combined.
    pub amount: f32,
    pub shield_before: f32,
    pub shield_after: f32,
    pub health_after: f32,
    /// The hit reduced health to zero.
    pub killed: bool,
}

impl DamageReport {
    /// Whether the hit is classified as a shield hit for reward purposes.
    ///
    /// A hit counts against the shield when the victim still has shield left, or
    /// had shield before the damage was applied.
    #[must_use]
    pub fn is_shield_hit(&self) -> bool {
        self.shield_after > 0.0 || self.shield_before > 0.0
    }
}

/// A fighter living inside an arena.
///
/// Movement and weapons are simulated elsewhere; the arena only needs to damage,
/// reset and locate combatants.
pub trait Combatant: fmt::Debug {
    fn team(&self) -> TeamId;

    fn position(&self) -> Vec3;

    /// Yaw in radians around the vertical axis.
    fn heading(&self) -> f32;

    fn is_alive(&self) -> bool;

    fn health(&self) -> f32;

    fn max_health(&self) -> f32;

    fn shield(&self) -> f32;

    fn max_shield(&self) -> f32;

    /// Applies damage, shield first.
    ///
    /// Returns `None` when nothing landed (dead, invulnerable, or non-positive
    /// amount).
    fn take_damage(&mut self, amount: f32) -> Option<DamageReport>;

    /// Reactivates the combatant with full health and shield at the given transform.
    fn reset(&mut self, position: Vec3, heading: f32);

    fn set_temporary_invulnerability(&mut self, duration: Duration);

    /// Moves the combatant. Called by the movement simulation, never by reward code.
    fn set_transform(&mut self, position: Vec3, heading: f32);

    /// Advances timers by one simulation tick.
    fn advance(&mut self, _dt: Duration) {}
}

/// Default [`Combatant`] implementation: a non-regenerating shield layered over health.
#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    team: TeamId,
    max_health: f32,
    max_shield: f32,
    health: f32,
    shield: f32,
    position: Vec3,
    heading: f32,
    alive: bool,
    invulnerable_for: Duration,
}

impl Ship {
    pub const DEFAULT_MAX_HEALTH: f32 = 100.0;
    pub const DEFAULT_MAX_SHIELD: f32 = 50.0;

    #[must_use]
    pub fn new(team: TeamId) -> Self {
        Self::with_capacity(team, Self::DEFAULT_MAX_HEALTH, Self::DEFAULT_MAX_SHIELD)
    }

    #[must_use]
    pub fn with_capacity(team: TeamId, max_health: f32, max_shield: f32) -> Self {
        Self {
            team,
            max_health,
            max_shield,
            health: max_health,
            shield: max_shield,
            position: Vec3::ZERO,
            heading: 0.0,
            alive: true,
            invulnerable_for: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        !self.invulnerable_for.is_zero()
    }
}

impl Combatant for Ship {
    fn team(&self) -> TeamId {
        self.team
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn heading(&self) -> f32 {
        self.heading
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn max_health(&self) -> f32 {
        self.max_health
    }

    fn shield(&self) -> f32 {
        self.shield
    }

    fn max_shield(&self) -> f32 {
        self.max_shield
    }

    fn take_damage(&mut self, amount: f32) -> Option<DamageReport> {
        if !self.alive || self.is_invulnerable() || amount <= 0.0 || !amount.is_finite() {
            return None;
        }

        let shield_before = self.shield;
        let absorbed = f32::min(self.shield, amount);
        self.shield -= absorbed;
        let health_damage = f32::min(self.health, amount - absorbed);
        self.health -= health_damage;

        let killed = self.health <= 0.0;
        if killed {
            self.health = 0.0;
            self.alive = false;
        }

        Some(DamageReport {
            amount: absorbed + health_damage,
            shield_before,
            shield_after: self.shield,
            health_after: self.health,
            killed,
        })
    }

    fn reset(&mut self, position: Vec3, heading: f32) {
        self.health = self.max_health;
        self.shield = self.max_shield;
        self.alive = true;
        self.position = position;
        self.heading = heading;
        self.invulnerable_for = Duration::ZERO;
    }

    fn set_temporary_invulnerability(&mut self, duration: Duration) {
        self.invulnerable_for = duration;
    }

    fn set_transform(&mut self, position: Vec3, heading: f32) {
        if self.alive {
            self.position = position;
            self.heading = heading;
        }
    }

    fn advance(&mut self, dt: Duration) {
        self.invulnerable_for = self.invulnerable_for.saturating_sub(dt);
    }
}
