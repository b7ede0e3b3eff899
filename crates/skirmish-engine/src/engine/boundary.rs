//! Two-radius arena boundary.
//!
//! The boundary combines a graduated penalty zone with a terminal wall:
//!
//! ```text
//! soft_radius = arena_size × soft_multiplier
//! hard_radius = arena_size × hard_multiplier
//!
//! distance <  soft_radius                → inside, no penalty
//! soft_radius ≤ distance < hard_radius   → penalty = coefficient × frac²
//!                                          frac = (distance − soft) / (hard − soft)
//! distance ≥ hard_radius                 → terminal violation
//! ```
//!
//! Because `frac` is normalized by the width of the zone, an agent at the same
//! relative depth receives the same penalty in arenas of any size.

use glam::{Vec3, Vec3Swizzles as _};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, EffectiveSettings, ensure_non_negative, ensure_positive};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub soft_multiplier: f32,
    pub hard_multiplier: f32,
    /// Penalty at the hard wall (`frac = 1`).
    pub penalty_coefficient: f32,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            soft_multiplier: 0.75,
            hard_multiplier: 1.20,
            penalty_coefficient: 0.002,
        }
    }
}

impl BoundaryConfig {
    /// Rejects multipliers that would collapse or invert the penalty zone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("boundary.soft_multiplier", self.soft_multiplier)?;
        ensure_positive("boundary.hard_multiplier", self.hard_multiplier)?;
        ensure_non_negative("boundary.penalty_coefficient", self.penalty_coefficient)?;
        if self.hard_multiplier <= self.soft_multiplier {
            return Err(ConfigError::InvalidBoundary {
                soft: self.soft_multiplier,
                hard: self.hard_multiplier,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryRadii {
    pub soft: f32,
    pub hard: f32,
}

impl BoundaryRadii {
    #[must_use]
    pub fn new(arena_size: f32, config: &BoundaryConfig) -> Self {
        Self {
            soft: arena_size * config.soft_multiplier,
            hard: arena_size * config.hard_multiplier,
        }
    }
}

/// Classification of one agent's distance from the arena center.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::IsVariant)]
pub enum BoundaryZone {
    Inside,
    /// Inside the graduated zone. `penalty` is the magnitude to subtract.
    Soft { fraction: f32, penalty: f32 },
    Hard,
}

#[derive(Debug, Clone)]
pub struct BoundaryMonitor {
    config: BoundaryConfig,
    radii: BoundaryRadii,
}

impl BoundaryMonitor {
    pub fn new(config: BoundaryConfig, settings: &EffectiveSettings) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            radii: BoundaryRadii::new(settings.arena_size(), &config),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &BoundaryConfig {
        &self.config
    }

    #[must_use]
    pub fn radii(&self) -> BoundaryRadii {
        self.radii
    }

    /// Recomputes the radii for a new episode.
    pub fn configure(&mut self, settings: &EffectiveSettings) {
        self.radii = BoundaryRadii::new(settings.arena_size(), &self.config);
    }

    #[must_use]
    pub fn classify(&self, distance: f32) -> BoundaryZone {
        let BoundaryRadii { soft, hard } = self.radii;
        if distance >= hard {
            return BoundaryZone::Hard;
        }
        if distance < soft {
            return BoundaryZone::Inside;
        }
        let fraction = ((distance - soft) / (hard - soft)).clamp(0.0, 1.0);
        BoundaryZone::Soft {
            fraction,
            penalty: self.config.penalty_coefficient * fraction * fraction,
        }
    }
}

/// Distance on the horizontal (XZ) plane.
#[must_use]
pub fn planar_distance(position: Vec3, center: Vec3) -> f32 {
    (position.xz() - center.xz()).length()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{ARENA_SIZE_PARAM, ArenaSettings, resolve_settings};

    fn settings_with_size(arena_size: f32) -> EffectiveSettings {
        let params = BTreeMap::from([(ARENA_SIZE_PARAM.to_owned(), arena_size)]);
        resolve_settings(Some(&ArenaSettings::BUILT_IN), None, Some(&params))
    }

    fn monitor(arena_size: f32) -> BoundaryMonitor {
        BoundaryMonitor::new(BoundaryConfig::default(), &settings_with_size(arena_size)).unwrap()
    }

    #[test]
    fn test_radii_follow_arena_size() {
        let radii = monitor(50.0).radii();
        assert!((radii.soft - 37.5).abs() < 1e-4);
        assert!((radii.hard - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_soft_zone_penalty_at_45_units() {
        let zone = monitor(50.0).classify(45.0);
        let BoundaryZone::Soft { fraction, penalty } = zone else {
            panic!("expected soft zone, got {zone:?}");
        };
        assert!((fraction - 1.0 / 3.0).abs() < 1e-4);
        assert!((penalty - 0.000_222).abs() < 1e-6);
    }

    #[test]
    fn test_zone_edges() {
        let monitor = monitor(50.0);
        assert_eq!(monitor.classify(0.0), BoundaryZone::Inside);
        assert_eq!(monitor.classify(37.4), BoundaryZone::Inside);
        assert_eq!(
            monitor.classify(37.5),
            BoundaryZone::Soft {
                fraction: 0.0,
                penalty: 0.0
            }
        );
        assert_eq!(monitor.classify(60.5), BoundaryZone::Hard);
        assert_eq!(monitor.classify(1000.0), BoundaryZone::Hard);
    }

    #[test]
    fn test_penalty_is_scale_invariant() {
        let small = monitor(20.0);
        let large = monitor(500.0);
        let midpoint = |m: &BoundaryMonitor| {
            let r = m.radii();
            (r.soft + r.hard) / 2.0
        };

        let BoundaryZone::Soft { penalty: p_small, .. } = small.classify(midpoint(&small)) else {
            panic!("expected soft zone");
        };
        let BoundaryZone::Soft { penalty: p_large, .. } = large.classify(midpoint(&large)) else {
            panic!("expected soft zone");
        };
        assert!((p_small - p_large).abs() < 1e-7);
        assert!((p_small - 0.002 * 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_configure_recomputes_radii() {
        let mut monitor = monitor(50.0);
        monitor.configure(&settings_with_size(100.0));
        assert!((monitor.radii().hard - 120.0).abs() < 1e-4);
    }

    #[test]
    fn test_inverted_multipliers_are_rejected() {
        let config = BoundaryConfig {
            soft_multiplier: 1.2,
            hard_multiplier: 0.75,
            ..BoundaryConfig::default()
        };
        let result = BoundaryMonitor::new(config, &settings_with_size(50.0));
        assert!(matches!(result, Err(ConfigError::InvalidBoundary { .. })));

        let equal = BoundaryConfig {
            soft_multiplier: 1.0,
            hard_multiplier: 1.0,
            ..BoundaryConfig::default()
        };
        assert!(equal.validate().is_err());
    }

    #[test]
    fn test_planar_distance_ignores_height() {
        let d = planar_distance(Vec3::new(3.0, 100.0, 4.0), Vec3::ZERO);
        assert!((d - 5.0).abs() < 1e-6);
        let d = planar_distance(Vec3::new(13.0, 0.0, 14.0), Vec3::new(10.0, -5.0, 10.0));
        assert!((d - 5.0).abs() < 1e-6);
    }
}
