//! Concrete collaborators for headless arena training runs.
//!
//! The engine only talks to the outside world through traits. This crate provides
//! the implementations a trainer needs to drive an [`Arena`](skirmish_engine::Arena)
//! without a game client:
//!
//! - [`curriculum::Curriculum`] - a [`ParameterSource`](skirmish_engine::ParameterSource)
//!   that raises difficulty as episodes accumulate
//! - [`obstacle_field::ObstacleField`] - an
//!   [`ArenaPopulation`](skirmish_engine::ArenaPopulation) scattering obstacles
//!   around the arena anchor
//! - [`pilot::ScriptedPilot`] - a heuristic controller that chases the nearest
//!   opponent and fires when in range
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use glam::Vec3;
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg32;
//! use skirmish_engine::{Arena, ArenaConfig, Ship, TeamId, TrainingAgent};
//! use skirmish_training::pilot::{PilotConfig, ScriptedPilot};
//!
//! let mut arena = Arena::new(&ArenaConfig::default()).unwrap();
//! let a = arena.register(
//!     Box::new(Ship::new(TeamId(0)).at(Vec3::new(-5.0, 0.0, 0.0))),
//!     Some(Box::new(TrainingAgent::new())),
//! );
//! let mut pilot = ScriptedPilot::new(a, PilotConfig::default()).unwrap();
//!
//! let mut rng = Pcg32::seed_from_u64(1);
//! pilot.step(&mut arena, Duration::from_millis(20), &mut rng).unwrap();
//! arena.tick(Duration::from_millis(20));
//! ```

pub mod curriculum;
pub mod obstacle_field;
pub mod pilot;
