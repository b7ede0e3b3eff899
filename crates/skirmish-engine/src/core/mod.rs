//! Leaf data entities shared by every arena component.
//!
//! - [`Combatant`] / [`Ship`] - health, shield, team and transform of one fighter
//! - [`AgentController`] / [`TrainingAgent`] - cumulative reward of a trainable policy
//! - [`CombatantId`] / [`TeamId`] - identifiers handed out by the arena

pub use self::{agent::*, combatant::*};

mod agent;
mod combatant;
