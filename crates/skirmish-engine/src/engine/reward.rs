//! Reward administration.
//!
//! The administrator turns combat and boundary events into [`RewardGrant`]s. It
//! never touches agents itself: the arena applies grants through
//! [`Roster::apply`], and only while the episode gate is open.
//!
//! # Rules
//!
//! ```text
//! existence   every live agent, every tick     Δ = −existence_penalty
//! damage      victim agent                      Δ = −multiplier × amount / capacity
//!             opposing trainable attacker       Δ = +multiplier × amount / capacity
//! kill        killer agent                      → cumulative = +1
//!             victim agent                      → cumulative = −1
//! boundary    violating agent                   → cumulative = −1
//!             one opponent agent                → cumulative = +1
//! ```
//!
//! `multiplier` and `capacity` come from the shield when the hit is a shield hit
//! (see [`DamageReport::is_shield_hit`]) and from health otherwise.
//!
//! Terminal rewards are expressed as [`RewardChange::Target`]: the applied delta is
//! `target − cumulative`, so the episode ends at exactly ±1 no matter how much
//! shaping reward came before, and earlier shaping stays in the agent's history.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{CombatantId, ConfigError, DamageReport, Roster, ensure_non_negative};

/// Cumulative reward of the winning side at episode end.
pub const WIN_REWARD: f32 = 1.0;
/// Cumulative reward of the losing side at episode end.
pub const LOSS_REWARD: f32 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Magnitude subtracted from every live agent each tick.
    pub existence_penalty: f32,
    pub shield_damage_multiplier: f32,
    pub health_damage_multiplier: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            existence_penalty: 0.0005,
            shield_damage_multiplier: 0.05,
            health_damage_multiplier: 0.1,
        }
    }
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_negative("reward.existence_penalty", self.existence_penalty)?;
        ensure_non_negative(
            "reward.shield_damage_multiplier",
            self.shield_damage_multiplier,
        )?;
        ensure_non_negative(
            "reward.health_damage_multiplier",
            self.health_damage_multiplier,
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RewardChange {
    Delta(f32),
    /// Drive the cumulative reward to this value by adding the difference.
    Target(f32),
}

impl RewardChange {
    /// The delta to add to an agent whose cumulative reward is `current`.
    #[must_use]
    pub fn delta_from(self, current: f32) -> f32 {
        match self {
            RewardChange::Delta(delta) => delta,
            RewardChange::Target(target) => target - current,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardGrant {
    pub recipient: CombatantId,
    pub change: RewardChange,
}

impl RewardGrant {
    #[must_use]
    pub const fn new(recipient: CombatantId, change: RewardChange) -> Self {
        Self { recipient, change }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewardAdministrator {
    config: RewardConfig,
    /// Most recent opposing attacker of each victim in the current episode.
    last_attacker: HashMap<CombatantId, CombatantId>,
}

impl RewardAdministrator {
    #[must_use]
    pub fn new(config: RewardConfig) -> Self {
        Self {
            config,
            last_attacker: HashMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Forgets per-episode attribution.
    pub fn begin_episode(&mut self) {
        self.last_attacker.clear();
    }

    #[must_use]
    pub fn last_attacker(&self, victim: CombatantId) -> Option<CombatantId> {
        self.last_attacker.get(&victim).copied()
    }

    #[must_use]
    pub fn existence_penalties(&self, roster: &Roster) -> Vec<RewardGrant> {
        if self.config.existence_penalty == 0.0 {
            return vec![];
        }
        roster
            .trainable_ids()
            .filter(|id| roster.is_alive(*id))
            .map(|id| RewardGrant::new(id, RewardChange::Delta(-self.config.existence_penalty)))
            .collect()
    }

    pub fn on_damaged(
        &mut self,
        victim: CombatantId,
        attacker: Option<CombatantId>,
        report: &DamageReport,
        roster: &Roster,
    ) -> Vec<RewardGrant> {
        let Some(combatant) = roster.combatant(victim) else {
            return vec![];
        };

        let (multiplier, capacity) = if report.is_shield_hit() {
            (self.config.shield_damage_multiplier, combatant.max_shield())
        } else {
            (self.config.health_damage_multiplier, combatant.max_health())
        };
        if capacity <= 0.0 {
            return vec![];
        }
        let magnitude = multiplier * report.amount / capacity;

        let mut grants = vec![];
        if roster.is_trainable(victim) {
            grants.push(RewardGrant::new(victim, RewardChange::Delta(-magnitude)));
        }
        if let Some(attacker) = attacker.filter(|a| roster.are_opponents(*a, victim)) {
            self.last_attacker.insert(victim, attacker);
            if roster.is_trainable(attacker) {
                grants.push(RewardGrant::new(attacker, RewardChange::Delta(magnitude)));
            }
        }
        grants
    }

    /// Zero-sums the actual killer/victim pair. Friendly or unattributed kills
    /// only penalize the victim.
    #[must_use]
    pub fn on_died(
        &self,
        victim: CombatantId,
        killer: Option<CombatantId>,
        roster: &Roster,
    ) -> Vec<RewardGrant> {
        let mut grants = vec![];
        if let Some(killer) =
            killer.filter(|k| roster.is_trainable(*k) && roster.are_opponents(*k, victim))
        {
            grants.push(RewardGrant::new(killer, RewardChange::Target(WIN_REWARD)));
        }
        if roster.is_trainable(victim) {
            grants.push(RewardGrant::new(victim, RewardChange::Target(LOSS_REWARD)));
        }
        grants
    }

    #[must_use]
    pub fn on_boundary_violation(
        &self,
        violator: CombatantId,
        roster: &Roster,
    ) -> Vec<RewardGrant> {
        let mut grants = vec![RewardGrant::new(
            violator,
            RewardChange::Target(LOSS_REWARD),
        )];
        if let Some(winner) = self.boundary_winner(violator, roster) {
            grants.push(RewardGrant::new(winner, RewardChange::Target(WIN_REWARD)));
        }
        grants
    }

    /// The single opponent credited when `violator` leaves the arena: its most
    /// recent opposing attacker if still trainable, else the first trainable live
    /// opponent in registration order, else the first trainable opponent.
    #[must_use]
    pub fn boundary_winner(&self, violator: CombatantId, roster: &Roster) -> Option<CombatantId> {
        let is_candidate = |id: CombatantId| {
            id != violator && roster.is_trainable(id) && roster.are_opponents(id, violator)
        };
        if let Some(attacker) = self.last_attacker(violator).filter(|a| is_candidate(*a)) {
            return Some(attacker);
        }
        roster
            .ids()
            .find(|id| is_candidate(*id) && roster.is_alive(*id))
            .or_else(|| roster.ids().find(|id| is_candidate(*id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgentController as _, Combatant as _, Ship, TeamId, TrainingAgent};

    struct Fixture {
        roster: Roster,
        admin: RewardAdministrator,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                roster: Roster::new(),
                admin: RewardAdministrator::new(RewardConfig::default()),
            }
        }

        fn agent(&mut self, team: u8) -> CombatantId {
            self.roster.push(
                Box::new(Ship::new(TeamId(team))),
                Some(Box::new(TrainingAgent::new())),
            )
        }

        fn drone(&mut self, team: u8) -> CombatantId {
            self.roster.push(Box::new(Ship::new(TeamId(team))), None)
        }

        fn reward(&self, id: CombatantId) -> f32 {
            self.roster.agent(id).unwrap().cumulative_reward()
        }

        fn hit(&mut self, victim: CombatantId, attacker: Option<CombatantId>, amount: f32) {
            let report = self
                .roster
                .combatant_mut(victim)
                .unwrap()
                .take_damage(amount)
                .unwrap();
            let grants = self.admin.on_damaged(victim, attacker, &report, &self.roster);
            self.roster.apply(&grants);
        }
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    mod damage {
        use super::*;

        #[test]
        fn test_shield_hit_uses_shield_capacity() {
            let mut f = Fixture::new();
            let a = f.agent(0);
            let b = f.agent(1);
            f.hit(b, Some(a), 25.0);
            // 0.05 × 25 / 50
            assert_close(f.reward(b), -0.025);
            assert_close(f.reward(a), 0.025);
        }

        #[test]
        fn test_health_hit_uses_health_capacity() {
            let mut f = Fixture::new();
            let a = f.agent(0);
            let b = f.agent(1);
            f.hit(b, Some(a), 50.0);
            f.hit(b, Some(a), 20.0);
            // 0.05 × 50 / 50 + 0.1 × 20 / 100
            assert_close(f.reward(b), -0.07);
            assert_close(f.reward(a), 0.07);
        }

        #[test]
        fn test_friendly_fire_only_penalizes_victim() {
            let mut f = Fixture::new();
            let a = f.agent(0);
            let mate = f.agent(0);
            f.hit(mate, Some(a), 10.0);
            assert_close(f.reward(mate), -0.01);
            assert_close(f.reward(a), 0.0);
            assert_eq!(f.admin.last_attacker(mate), None);
        }

        #[test]
        fn test_environment_damage_has_no_attacker_reward() {
            let mut f = Fixture::new();
            let a = f.agent(0);
            f.hit(a, None, 10.0);
            assert_close(f.reward(a), -0.01);
        }

        #[test]
        fn test_untrainable_attacker_is_recorded_but_not_rewarded() {
            let mut f = Fixture::new();
            let a = f.agent(0);
            let drone = f.drone(1);
            f.hit(a, Some(drone), 10.0);
            assert_eq!(f.admin.last_attacker(a), Some(drone));
            assert_close(f.reward(a), -0.01);
        }
    }

    mod kill {
        use super::*;

        #[test]
        fn test_kill_drives_pair_to_exact_targets() {
            let mut f = Fixture::new();
            let killer = f.agent(0);
            let victim = f.agent(1);
            f.roster.agent_mut(killer).unwrap().add_reward(0.3);
            f.roster.agent_mut(victim).unwrap().add_reward(0.45);

            let grants = f.admin.on_died(victim, Some(killer), &f.roster);
            assert_eq!(grants.len(), 2);
            f.roster.apply(&grants);

            assert_close(f.reward(killer), WIN_REWARD);
            assert_close(f.reward(victim), LOSS_REWARD);
        }

        #[test]
        fn test_kill_delta_is_difference_to_target() {
            let mut f = Fixture::new();
            let killer = f.agent(0);
            let victim = f.agent(1);
            f.roster.agent_mut(killer).unwrap().add_reward(0.3);

            let grants = f.admin.on_died(victim, Some(killer), &f.roster);
            let delta = grants[0].change.delta_from(f.reward(killer));
            assert_close(delta, 0.7);
        }

        #[test]
        fn test_unattributed_death_only_affects_victim() {
            let mut f = Fixture::new();
            let other = f.agent(0);
            let victim = f.agent(1);
            let grants = f.admin.on_died(victim, None, &f.roster);
            assert_eq!(
                grants,
                vec![RewardGrant::new(victim, RewardChange::Target(LOSS_REWARD))]
            );
            f.roster.apply(&grants);
            assert_eq!(f.reward(other), 0.0);
        }

        #[test]
        fn test_teamkill_is_not_rewarded() {
            let mut f = Fixture::new();
            let a = f.agent(0);
            let mate = f.agent(0);
            let grants = f.admin.on_died(mate, Some(a), &f.roster);
            assert_eq!(grants.len(), 1);
            assert_eq!(grants[0].recipient, mate);
        }
    }

    mod boundary {
        use super::*;

        #[test]
        fn test_winner_prefers_last_attacker() {
            let mut f = Fixture::new();
            let _first = f.agent(1);
            let violator = f.agent(0);
            let second = f.agent(1);
            f.hit(violator, Some(second), 5.0);

            assert_eq!(f.admin.boundary_winner(violator, &f.roster), Some(second));
        }

        #[test]
        fn test_winner_falls_back_to_first_live_opponent() {
            let mut f = Fixture::new();
            let _mate = f.agent(0);
            let dead = f.agent(1);
            let alive = f.agent(1);
            let violator = f.agent(0);
            f.roster.combatant_mut(dead).unwrap().take_damage(1000.0);

            assert_eq!(f.admin.boundary_winner(violator, &f.roster), Some(alive));
        }

        #[test]
        fn test_violation_zero_sums_exactly_one_opponent() {
            let mut f = Fixture::new();
            let violator = f.agent(0);
            let a = f.agent(1);
            let b = f.agent(1);
            f.roster.agent_mut(violator).unwrap().add_reward(0.2);

            let grants = f.admin.on_boundary_violation(violator, &f.roster);
            f.roster.apply(&grants);
            assert_close(f.reward(violator), LOSS_REWARD);
            assert_close(f.reward(a), WIN_REWARD);
            assert_eq!(f.reward(b), 0.0);
        }

        #[test]
        fn test_violation_without_opponent_still_penalizes() {
            let mut f = Fixture::new();
            let violator = f.agent(0);
            f.drone(1);
            let grants = f.admin.on_boundary_violation(violator, &f.roster);
            assert_eq!(grants.len(), 1);
        }

        #[test]
        fn test_begin_episode_forgets_attackers() {
            let mut f = Fixture::new();
            let a = f.agent(0);
            let b = f.agent(1);
            f.hit(b, Some(a), 1.0);
            f.admin.begin_episode();
            assert_eq!(f.admin.last_attacker(b), None);
        }
    }

    #[test]
    fn test_existence_penalty_skips_dead_and_untrainable() {
        let mut f = Fixture::new();
        let a = f.agent(0);
        let b = f.agent(1);
        f.drone(1);
        f.roster.combatant_mut(b).unwrap().take_damage(1000.0);

        let grants = f.admin.existence_penalties(&f.roster);
        assert_eq!(
            grants,
            vec![RewardGrant::new(a, RewardChange::Delta(-0.0005))]
        );
    }
}
