//! Episode gate and reset sequencing.
//!
//! ```text
//!            request_end()             poll(): Prepare            poll(): Finish
//!   Active ───────────────▶ Ending ────────────────────▶ Resetting ───────────────▶ Active
//!     ▲    (gate closes)                (delay starts)      (delay elapsed)  reopen()
//!     └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The orchestrator only tracks state; the arena performs the work of each
//! [`ResetStage`]:
//!
//! - `Prepare`: flush metrics, advance the episode counter, notify listeners,
//!   resolve new settings
//! - `Finish`: repopulate obstacles, reset combatants, begin agent episodes, clear
//!   metrics, then [`EpisodeOrchestrator::reopen`]
//!
//! The configurable delay between the two stages is the only point where the
//! sequence waits; the rest of the simulation keeps ticking meanwhile. A reset in
//! flight cannot be cancelled.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ConfigError, ensure_duration, ensure_positive};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// When disabled, end requests are ignored and the trainer owns resets.
    pub auto_reset: bool,
    pub reset_delay_secs: f32,
    /// Ticks after which the episode ends as a draw. `0` disables the limit.
    pub max_episode_ticks: u64,
    pub invulnerability_secs: f32,
    /// Spawn radius as a fraction of the arena size.
    pub spawn_radius_fraction: f32,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            auto_reset: true,
            reset_delay_secs: 0.0,
            max_episode_ticks: 0,
            invulnerability_secs: 1.5,
            spawn_radius_fraction: 0.7,
        }
    }
}

impl EpisodeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_duration("episode.reset_delay_secs", self.reset_delay_secs)?;
        ensure_duration("episode.invulnerability_secs", self.invulnerability_secs)?;
        ensure_positive("episode.spawn_radius_fraction", self.spawn_radius_fraction)?;
        Ok(())
    }

    /// Saturates at [`Duration::MAX`] for values [`validate`](Self::validate) rejects.
    #[must_use]
    pub fn reset_delay(&self) -> Duration {
        secs_to_duration(self.reset_delay_secs)
    }

    #[must_use]
    pub fn invulnerability(&self) -> Duration {
        secs_to_duration(self.invulnerability_secs)
    }
}

fn secs_to_duration(secs: f32) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum EpisodePhase {
    Active,
    Ending,
    Resetting,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    #[display("kill")]
    Kill,
    #[display("boundary violation")]
    BoundaryViolation,
    #[display("time limit")]
    TimeLimit,
    #[display("external request")]
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStage {
    Prepare,
    Finish,
}

#[derive(Debug, Clone)]
pub struct EpisodeOrchestrator {
    phase: EpisodePhase,
    auto_reset: bool,
    reset_delay: Duration,
    remaining_delay: Duration,
    episode_count: u64,
    episode_ticks: u64,
    end_reason: Option<EndReason>,
}

impl EpisodeOrchestrator {
    #[must_use]
    pub fn new(config: &EpisodeConfig) -> Self {
        Self {
            phase: EpisodePhase::Active,
            auto_reset: config.auto_reset,
            reset_delay: config.reset_delay(),
            remaining_delay: Duration::ZERO,
            episode_count: 0,
            episode_ticks: 0,
            end_reason: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    /// Whether the gate is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    #[must_use]
    pub fn auto_reset(&self) -> bool {
        self.auto_reset
    }

    pub fn set_auto_reset(&mut self, enabled: bool) {
        self.auto_reset = enabled;
    }

    /// Number of completed episodes.
    #[must_use]
    pub fn episode_count(&self) -> u64 {
        self.episode_count
    }

    /// Ticks elapsed in the current episode.
    #[must_use]
    pub fn episode_ticks(&self) -> u64 {
        self.episode_ticks
    }

    /// Reason the current episode is ending, if it is.
    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Closes the gate and schedules a reset.
    ///
    /// Returns `false` without any effect unless the episode is active and
    /// automatic reset is enabled. Terminal conditions detected by several sources
    /// in the same tick therefore end the episode exactly once.
    pub fn request_end(&mut self, reason: EndReason) -> bool {
        if !self.phase.is_active() || !self.auto_reset {
            debug!(%reason, phase = ?self.phase, "ignoring episode end request");
            return false;
        }
        self.phase = EpisodePhase::Ending;
        self.end_reason = Some(reason);
        true
    }

    /// Counts one tick of the active episode and returns the new tick count.
    pub fn record_tick(&mut self) -> u64 {
        if self.phase.is_active() {
            self.episode_ticks += 1;
        }
        self.episode_ticks
    }

    /// Advances the reset sequence by `dt` and returns the stage that must run now.
    pub fn poll(&mut self, dt: Duration) -> Option<ResetStage> {
        match self.phase {
            EpisodePhase::Active => None,
            EpisodePhase::Ending => {
                self.phase = EpisodePhase::Resetting;
                self.remaining_delay = self.reset_delay;
                Some(ResetStage::Prepare)
            }
            EpisodePhase::Resetting => {
                self.remaining_delay = self.remaining_delay.saturating_sub(dt);
                self.remaining_delay.is_zero().then_some(ResetStage::Finish)
            }
        }
    }

    /// Advances the episode counter and returns the new count.
    pub fn advance_episode(&mut self) -> u64 {
        self.episode_count += 1;
        self.episode_count
    }

    /// Reopens the gate for a fresh episode.
    pub fn reopen(&mut self) {
        self.phase = EpisodePhase::Active;
        self.episode_ticks = 0;
        self.end_reason = None;
        self.remaining_delay = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(20);

    fn orchestrator(reset_delay_secs: f32) -> EpisodeOrchestrator {
        EpisodeOrchestrator::new(&EpisodeConfig {
            reset_delay_secs,
            ..EpisodeConfig::default()
        })
    }

    #[test]
    fn test_initial_phase_is_active() {
        let mut o = orchestrator(0.0);
        assert!(o.is_active());
        assert_eq!(o.poll(TICK), None);
        assert_eq!(o.episode_count(), 0);
    }

    #[test]
    fn test_second_request_is_ignored() {
        let mut o = orchestrator(0.0);
        assert!(o.request_end(EndReason::Kill));
        assert!(!o.request_end(EndReason::BoundaryViolation));
        assert_eq!(o.phase(), EpisodePhase::Ending);
        assert_eq!(o.end_reason(), Some(EndReason::Kill));
    }

    #[test]
    fn test_requests_ignored_while_resetting() {
        let mut o = orchestrator(1.0);
        o.request_end(EndReason::External);
        assert_eq!(o.poll(TICK), Some(ResetStage::Prepare));
        assert!(!o.request_end(EndReason::Kill));
        assert_eq!(o.phase(), EpisodePhase::Resetting);
    }

    #[test]
    fn test_disabled_auto_reset_keeps_gate_open() {
        let mut o = orchestrator(0.0);
        o.set_auto_reset(false);
        assert!(!o.request_end(EndReason::Kill));
        assert!(o.is_active());
    }

    #[test]
    fn test_zero_delay_finishes_on_next_poll() {
        let mut o = orchestrator(0.0);
        o.request_end(EndReason::Kill);
        assert_eq!(o.poll(TICK), Some(ResetStage::Prepare));
        assert_eq!(o.poll(Duration::ZERO), Some(ResetStage::Finish));
        o.reopen();
        assert!(o.is_active());
        assert_eq!(o.end_reason(), None);
    }

    #[test]
    fn test_delay_spans_multiple_polls() {
        let mut o = orchestrator(0.05);
        o.request_end(EndReason::TimeLimit);
        assert_eq!(o.poll(TICK), Some(ResetStage::Prepare));
        assert_eq!(o.poll(TICK), None);
        assert_eq!(o.poll(TICK), None);
        assert_eq!(o.poll(TICK), Some(ResetStage::Finish));
    }

    #[test]
    fn test_ticks_count_only_while_active() {
        let mut o = orchestrator(0.0);
        o.record_tick();
        o.record_tick();
        assert_eq!(o.episode_ticks(), 2);
        o.request_end(EndReason::External);
        assert_eq!(o.record_tick(), 2);
        o.poll(TICK);
        o.reopen();
        assert_eq!(o.episode_ticks(), 0);
    }

    #[test]
    fn test_unrepresentable_durations_are_rejected() {
        for (config, name) in [
            (
                EpisodeConfig {
                    reset_delay_secs: 1e20,
                    ..EpisodeConfig::default()
                },
                "episode.reset_delay_secs",
            ),
            (
                EpisodeConfig {
                    invulnerability_secs: 1e20,
                    ..EpisodeConfig::default()
                },
                "episode.invulnerability_secs",
            ),
        ] {
            assert_eq!(
                config.validate(),
                Err(ConfigError::DurationOutOfRange { name, value: 1e20 })
            );
        }
    }

    #[test]
    fn test_duration_accessors_saturate() {
        let config = EpisodeConfig {
            reset_delay_secs: 1e20,
            invulnerability_secs: -1.0,
            ..EpisodeConfig::default()
        };
        assert_eq!(config.reset_delay(), Duration::MAX);
        assert_eq!(config.invulnerability(), Duration::ZERO);
        assert_eq!(
            EpisodeConfig::default().invulnerability(),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_advance_episode_counts_up() {
        let mut o = orchestrator(0.0);
        assert_eq!(o.advance_episode(), 1);
        assert_eq!(o.advance_episode(), 2);
        assert_eq!(o.episode_count(), 2);
    }
}
