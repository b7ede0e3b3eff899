use std::{path::PathBuf, time::Duration};

use chrono::Utc;
use glam::Vec3;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use skirmish_engine::{Arena, ArenaConfig, EpisodeSummary, Ship, TeamId, TrainingAgent};
use skirmish_training::{
    obstacle_field::{ObstacleField, ObstacleFieldConfig},
    pilot::{PilotConfig, ScriptedPilot},
};
use tracing::{info, warn};

use crate::{
    command::SettingsArg,
    schema::report::{SimulationReport, SimulationTotals},
    sink::TracingSink,
    util,
};

/// Episode length used when neither the config nor the command line limits it.
const DEFAULT_EPISODE_TICKS: u64 = 3000;

/// Distance between ships of one team in the starting formation.
const FORMATION_SPACING: f32 = 4.0;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    #[clap(flatten)]
    settings: SettingsArg,
    /// Number of episodes to run
    #[arg(long, default_value_t = 10)]
    episodes: usize,
    /// Ships on each of the two teams
    #[arg(long, default_value_t = 1)]
    ships_per_team: usize,
    /// Simulation step in milliseconds
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,
    /// Tick limit per episode, replacing the configured one
    #[arg(long)]
    max_episode_ticks: Option<u64>,
    /// Random seed, replacing the configured one
    #[arg(long)]
    seed: Option<u64>,
    /// Pilot configuration JSON file
    #[arg(long)]
    pilot: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        settings,
        episodes,
        ships_per_team,
        tick_ms,
        max_episode_ticks,
        seed,
        pilot,
        output,
    } = arg;

    let mut config = settings.load_config()?;
    if let Some(limit) = max_episode_ticks {
        config.episode.max_episode_ticks = *limit;
    }
    if config.episode.max_episode_ticks == 0 {
        warn!(
            ticks = DEFAULT_EPISODE_TICKS,
            "unlimited episodes cannot be simulated, applying tick limit"
        );
        config.episode.max_episode_ticks = DEFAULT_EPISODE_TICKS;
    }
    let seed = seed
        .or(config.seed)
        .unwrap_or_else(|| rand::rng().random());
    config.seed = Some(seed);

    let pilot_config: PilotConfig = match pilot {
        Some(path) => util::read_json_file("pilot config", path)?,
        None => PilotConfig::default(),
    };

    let started_at = Utc::now();
    let mut arena = build_arena(&config, settings, seed)?;
    let mut pilots = register_teams(&mut arena, *ships_per_team, pilot_config)?;
    info!(
        seed,
        episodes,
        ships = pilots.len(),
        arena_size = arena.arena_size(),
        "starting simulation"
    );

    let dt = Duration::from_millis(*tick_ms);
    let mut rng = Pcg32::seed_from_u64(seed.wrapping_add(1));
    let mut summaries: Vec<EpisodeSummary> = Vec::with_capacity(*episodes);
    while summaries.len() < *episodes {
        for pilot in &mut pilots {
            pilot.step(&mut arena, dt, &mut rng)?;
        }
        arena.tick(dt);

        if arena.episode_count() > summaries.len() as u64
            && let Some(summary) = arena.last_summary()
        {
            print_progress(summary);
            summaries.push(summary.clone());
        }
    }

    let report = SimulationReport {
        started_at,
        finished_at: Utc::now(),
        seed,
        config,
        final_settings: arena.settings().to_settings(),
        totals: SimulationTotals::from_episodes(&summaries),
        episodes: summaries,
    };
    util::save_json(&report, output.as_deref())?;
    Ok(())
}

fn build_arena(config: &ArenaConfig, settings: &SettingsArg, seed: u64) -> anyhow::Result<Arena> {
    let mut arena = Arena::new(config)?
        .with_override_settings(settings.load_override()?)
        .with_population(Box::new(ObstacleField::new(
            ObstacleFieldConfig::default(),
            seed,
        )))
        .with_metrics_sink(Box::new(TracingSink));
    if let Some(params) = settings.load_parameters()? {
        arena = arena.with_parameter_source(Box::new(params));
    }
    Ok(arena)
}

/// Registers two opposing teams in line formation on either side of the center.
fn register_teams(
    arena: &mut Arena,
    ships_per_team: usize,
    pilot_config: PilotConfig,
) -> anyhow::Result<Vec<ScriptedPilot>> {
    let offset = arena.arena_size() * 0.3;
    let center = arena.center_position();
    let mut pilots = vec![];
    for (team, side) in [(TeamId(0), -1.0), (TeamId(1), 1.0)] {
        for slot in 0..ships_per_team {
            #[expect(clippy::cast_precision_loss)]
            let lateral = (slot as f32 - (ships_per_team - 1) as f32 / 2.0) * FORMATION_SPACING;
            let position = center + Vec3::new(side * offset, 0.0, lateral);
            let id = arena.register(
                Box::new(Ship::new(team).at(position)),
                Some(Box::new(TrainingAgent::new())),
            );
            pilots.push(ScriptedPilot::new(id, pilot_config)?);
        }
    }
    Ok(pilots)
}

fn print_progress(summary: &EpisodeSummary) {
    let reason = summary
        .end_reason
        .map_or_else(|| "unknown".to_owned(), |reason| reason.to_string());
    let rewards = summary
        .agents
        .iter()
        .map(|agent| agent.cumulative_reward.unwrap_or(0.0))
        .collect::<Vec<_>>();
    eprintln!(
        "Episode #{:4}: {reason:<18} ticks {:5}  kill rate {:.3}  rewards {rewards:.3?}",
        summary.episode, summary.ticks, summary.kill_rate,
    );
}
