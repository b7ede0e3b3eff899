//! Episode-scoped metrics.
//!
//! [`MetricsAggregator`] accumulates statistics for the current episode only and
//! folds them into lifetime totals when the episode is flushed. A flush emits the
//! following names to the [`MetricsSink`], once each:
//!
//! | name                           | value                                        |
//! |--------------------------------|----------------------------------------------|
//! | `arena/kill_rate`              | lifetime kills / lifetime episodes           |
//! | `arena/mean_center_distance`   | mean normalized distance (only if sampled)   |
//! | `arena/mean_damage_dealt`      | mean over tracked agents                     |
//! | `arena/mean_damage_taken`      | mean over tracked agents                     |
//! | `arena/episode_ticks`          | ticks in the episode                         |
//! | `agent_<id>/damage_dealt`      | per tracked agent                            |
//! | `agent_<id>/damage_taken`      | per tracked agent                            |
//! | `agent_<id>/cumulative_reward` | final reward of each agent                   |

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{CombatantId, EndReason};

/// Destination of flushed statistics.
pub trait MetricsSink: fmt::Debug {
    fn add(&mut self, name: &str, value: f32);
}

/// Sink that keeps every value it receives, grouped by name.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    values: BTreeMap<String, Vec<f32>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn values(&self, name: &str) -> &[f32] {
        self.values.get(name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn last(&self, name: &str) -> Option<f32> {
        self.values(name).last().copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl MetricsSink for RecordingSink {
    fn add(&mut self, name: &str, value: f32) {
        self.values.entry(name.to_owned()).or_default().push(value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Distance samples are taken every this many active ticks.
    pub distance_sample_interval: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            distance_sample_interval: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEpisodeStats {
    pub id: CombatantId,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub cumulative_reward: Option<f32>,
}

/// Everything emitted by one flush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Zero-based index of the flushed episode.
    pub episode: u64,
    pub end_reason: Option<EndReason>,
    pub ticks: u64,
    pub ended_in_kill: bool,
    pub kill_rate: f32,
    pub mean_center_distance: Option<f32>,
    pub mean_damage_dealt: f32,
    pub mean_damage_taken: f32,
    pub agents: Vec<AgentEpisodeStats>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct DamageTally {
    dealt: f32,
    taken: f32,
}

#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    sample_interval: u64,
    ticks: u64,
    damage: BTreeMap<CombatantId, DamageTally>,
    distance_samples: Vec<f32>,
    ended_in_kill: bool,
    lifetime_episodes: u64,
    lifetime_kills: u64,
}

impl MetricsAggregator {
    #[must_use]
    pub fn new(config: &MetricsConfig) -> Self {
        Self {
            sample_interval: config.distance_sample_interval.max(1),
            ticks: 0,
            damage: BTreeMap::new(),
            distance_samples: Vec::new(),
            ended_in_kill: false,
            lifetime_episodes: 0,
            lifetime_kills: 0,
        }
    }

    /// Starts tracking damage for an agent. Untracked ids are ignored by
    /// [`record_damage`](Self::record_damage).
    pub fn track(&mut self, id: CombatantId) {
        self.damage.entry(id).or_default();
    }

    #[must_use]
    pub fn is_tracked(&self, id: CombatantId) -> bool {
        self.damage.contains_key(&id)
    }

    /// Counts an active tick and reports whether distances should be sampled on it.
    pub fn record_tick(&mut self) -> bool {
        self.ticks += 1;
        self.ticks % self.sample_interval == 0
    }

    /// Records a center distance already normalized by the arena size.
    pub fn record_distance(&mut self, normalized_distance: f32) {
        self.distance_samples.push(normalized_distance);
    }

    pub fn record_damage(
        &mut self,
        attacker: Option<CombatantId>,
        victim: CombatantId,
        amount: f32,
    ) {
        if let Some(tally) = self.damage.get_mut(&victim) {
            tally.taken += amount;
        }
        if let Some(tally) = attacker.and_then(|a| self.damage.get_mut(&a)) {
            tally.dealt += amount;
        }
    }

    pub fn record_kill(&mut self) {
        self.ended_in_kill = true;
    }

    #[must_use]
    pub fn lifetime_episodes(&self) -> u64 {
        self.lifetime_episodes
    }

    #[must_use]
    pub fn lifetime_kills(&self) -> u64 {
        self.lifetime_kills
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn kill_rate(&self) -> f32 {
        if self.lifetime_episodes == 0 {
            return 0.0;
        }
        self.lifetime_kills as f32 / self.lifetime_episodes as f32
    }

    #[must_use]
    pub fn distance_samples(&self) -> &[f32] {
        &self.distance_samples
    }

    #[must_use]
    pub fn ended_in_kill(&self) -> bool {
        self.ended_in_kill
    }

    /// True when no per-episode data has been accumulated.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.ticks == 0
            && self.distance_samples.is_empty()
            && !self.ended_in_kill
            && self
                .damage
                .values()
                .all(|t| t.dealt == 0.0 && t.taken == 0.0)
    }

    /// Folds the current episode into the lifetime totals, emits it to `sink`, and
    /// clears every per-episode accumulator.
    pub fn flush(
        &mut self,
        episode: u64,
        end_reason: Option<EndReason>,
        rewards: &[(CombatantId, f32)],
        sink: Option<&mut dyn MetricsSink>,
    ) -> EpisodeSummary {
        self.lifetime_episodes += 1;
        if self.ended_in_kill {
            self.lifetime_kills += 1;
        }

        let agents: Vec<AgentEpisodeStats> = self
            .damage
            .iter()
            .map(|(id, tally)| AgentEpisodeStats {
                id: *id,
                damage_dealt: tally.dealt,
                damage_taken: tally.taken,
                cumulative_reward: rewards.iter().find(|(r, _)| r == id).map(|(_, v)| *v),
            })
            .collect();

        let summary = EpisodeSummary {
            episode,
            end_reason,
            ticks: self.ticks,
            ended_in_kill: self.ended_in_kill,
            kill_rate: self.kill_rate(),
            mean_center_distance: mean(self.distance_samples.iter().copied()),
            mean_damage_dealt: mean(agents.iter().map(|a| a.damage_dealt)).unwrap_or(0.0),
            mean_damage_taken: mean(agents.iter().map(|a| a.damage_taken)).unwrap_or(0.0),
            agents,
        };

        if let Some(sink) = sink {
            emit(&summary, rewards, sink);
        }
        info!(
            episode,
            reason = ?end_reason,
            ticks = summary.ticks,
            kill = summary.ended_in_kill,
            kill_rate = summary.kill_rate,
            "flushed episode metrics"
        );

        self.reset();
        summary
    }

    /// Clears per-episode accumulators. Tracked agents stay tracked.
    pub fn reset(&mut self) {
        self.ticks = 0;
        self.distance_samples.clear();
        self.ended_in_kill = false;
        for tally in self.damage.values_mut() {
            *tally = DamageTally::default();
        }
    }
}

fn emit(summary: &EpisodeSummary, rewards: &[(CombatantId, f32)], sink: &mut dyn MetricsSink) {
    sink.add("arena/kill_rate", summary.kill_rate);
    if let Some(distance) = summary.mean_center_distance {
        sink.add("arena/mean_center_distance", distance);
    }
    sink.add("arena/mean_damage_dealt", summary.mean_damage_dealt);
    sink.add("arena/mean_damage_taken", summary.mean_damage_taken);
    #[expect(clippy::cast_precision_loss)]
    sink.add("arena/episode_ticks", summary.ticks as f32);
    for agent in &summary.agents {
        sink.add(&format!("agent_{}/damage_dealt", agent.id), agent.damage_dealt);
        sink.add(&format!("agent_{}/damage_taken", agent.id), agent.damage_taken);
    }
    for (id, reward) in rewards {
        sink.add(&format!("agent_{id}/cumulative_reward"), *reward);
    }
}

#[expect(clippy::cast_precision_loss)]
fn mean<I>(values: I) -> Option<f32>
where
    I: IntoIterator<Item = f32>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: CombatantId = CombatantId(0);
    const B: CombatantId = CombatantId(1);
    const DRONE: CombatantId = CombatantId(2);

    fn aggregator() -> MetricsAggregator {
        let mut metrics = MetricsAggregator::new(&MetricsConfig {
            distance_sample_interval: 2,
        });
        metrics.track(A);
        metrics.track(B);
        metrics
    }

    #[test]
    fn test_sampling_interval() {
        let mut metrics = aggregator();
        let sampled: Vec<bool> = (0..6).map(|_| metrics.record_tick()).collect();
        assert_eq!(sampled, [false, true, false, true, false, true]);
    }

    #[test]
    fn test_untracked_damage_is_ignored() {
        let mut metrics = aggregator();
        metrics.record_damage(Some(DRONE), A, 10.0);
        metrics.record_damage(Some(A), DRONE, 4.0);

        let summary = metrics.flush(0, None, &[], None);
        assert_eq!(summary.agents[0].damage_taken, 10.0);
        assert_eq!(summary.agents[0].damage_dealt, 4.0);
        assert_eq!(summary.agents.len(), 2);
    }

    #[test]
    fn test_flush_emits_named_statistics() {
        let mut metrics = aggregator();
        let mut sink = RecordingSink::new();
        metrics.record_tick();
        metrics.record_distance(0.5);
        metrics.record_distance(0.7);
        metrics.record_damage(Some(A), B, 30.0);
        metrics.record_kill();

        let summary = metrics.flush(
            0,
            Some(EndReason::Kill),
            &[(A, 1.0), (B, -1.0)],
            Some(&mut sink),
        );

        assert!(summary.ended_in_kill);
        assert_eq!(sink.last("arena/kill_rate"), Some(1.0));
        assert!((sink.last("arena/mean_center_distance").unwrap() - 0.6).abs() < 1e-6);
        assert_eq!(sink.last("arena/mean_damage_dealt"), Some(15.0));
        assert_eq!(sink.last("arena/mean_damage_taken"), Some(15.0));
        assert_eq!(sink.last("arena/episode_ticks"), Some(1.0));
        assert_eq!(sink.last("agent_0/damage_dealt"), Some(30.0));
        assert_eq!(sink.last("agent_1/damage_taken"), Some(30.0));
        assert_eq!(sink.last("agent_1/cumulative_reward"), Some(-1.0));
        assert_eq!(summary.agents[1].cumulative_reward, Some(-1.0));
    }

    #[test]
    fn test_kill_rate_over_lifetime() {
        let mut metrics = aggregator();
        metrics.record_kill();
        metrics.flush(0, Some(EndReason::Kill), &[], None);
        metrics.flush(1, Some(EndReason::TimeLimit), &[], None);
        metrics.flush(2, Some(EndReason::BoundaryViolation), &[], None);
        metrics.record_kill();
        let summary = metrics.flush(3, Some(EndReason::Kill), &[], None);

        assert_eq!(metrics.lifetime_episodes(), 4);
        assert_eq!(metrics.lifetime_kills(), 2);
        assert_eq!(summary.kill_rate, 0.5);
    }

    #[test]
    fn test_flush_clears_every_accumulator() {
        let mut metrics = aggregator();
        metrics.record_tick();
        metrics.record_distance(0.9);
        metrics.record_damage(Some(B), A, 12.0);
        metrics.record_kill();
        assert!(!metrics.is_clear());

        metrics.flush(0, None, &[], None);
        assert!(metrics.is_clear());
        assert!(metrics.distance_samples().is_empty());
        assert!(!metrics.ended_in_kill());
        assert!(metrics.is_tracked(A));
    }

    #[test]
    fn test_no_distance_metric_without_samples() {
        let mut metrics = aggregator();
        let mut sink = RecordingSink::new();
        metrics.flush(0, None, &[], Some(&mut sink));
        assert_eq!(sink.last("arena/mean_center_distance"), None);
        assert_eq!(sink.last("arena/kill_rate"), Some(0.0));
    }
}
