use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skirmish_engine::{ArenaConfig, ArenaSettings, EffectiveSettings, EndReason, EpisodeSummary};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub seed: u64,
    pub config: ArenaConfig,
    pub final_settings: ArenaSettings,
    pub totals: SimulationTotals,
    pub episodes: Vec<EpisodeSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SimulationTotals {
    pub episodes: usize,
    pub kills: usize,
    pub boundary_violations: usize,
    pub time_limits: usize,
    pub kill_rate: f32,
    pub mean_ticks: f32,
}

impl SimulationTotals {
    #[expect(clippy::cast_precision_loss)]
    pub fn from_episodes(episodes: &[EpisodeSummary]) -> Self {
        let count_reason = |reason: EndReason| {
            episodes
                .iter()
                .filter(|e| e.end_reason == Some(reason))
                .count()
        };
        let total_ticks: u64 = episodes.iter().map(|e| e.ticks).sum();
        let (kill_rate, mean_ticks) = if episodes.is_empty() {
            (0.0, 0.0)
        } else {
            let n = episodes.len() as f32;
            (
                count_reason(EndReason::Kill) as f32 / n,
                total_ticks as f32 / n,
            )
        };
        Self {
            episodes: episodes.len(),
            kills: count_reason(EndReason::Kill),
            boundary_violations: count_reason(EndReason::BoundaryViolation),
            time_limits: count_reason(EndReason::TimeLimit),
            kill_rate,
            mean_ticks,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSettingsReport {
    pub episode: u64,
    pub settings: EffectiveSettings,
    pub soft_radius: f32,
    pub hard_radius: f32,
    pub spawn_radius: f32,
}
