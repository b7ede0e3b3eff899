use std::{cell::RefCell, rc::Rc, time::Duration};

use glam::Vec3;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use skirmish_engine::{
    Arena, ArenaConfig, ArenaPopulation, EndReason, Ship, TeamId, TrainingAgent,
};
use skirmish_training::{
    curriculum::{Curriculum, Lesson},
    obstacle_field::{ObstacleField, ObstacleFieldConfig},
    pilot::{PilotConfig, ScriptedPilot},
};

const TICK: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
struct SharedField(Rc<RefCell<ObstacleField>>);

impl ArenaPopulation for SharedField {
    fn set_anchor(&mut self, center: Vec3) {
        self.0.borrow_mut().set_anchor(center);
    }

    fn set_density(&mut self, density: f32) {
        self.0.borrow_mut().set_density(density);
    }

    fn respawn_obstacles(&mut self) {
        self.0.borrow_mut().respawn_obstacles();
    }
}

fn curriculum() -> Curriculum {
    Curriculum::new(vec![
        Lesson::new("close quarters", 0)
            .with_value("arena_size", 30.0)
            .with_value("obstacle_density", 0.25),
        Lesson::new("open field", 2)
            .with_value("arena_size", 60.0)
            .with_value("obstacle_density", 0.75)
            .with_value("opponent_difficulty", 1.0),
    ])
}

#[test]
fn curriculum_drives_arena_and_population() {
    let field = SharedField(Rc::new(RefCell::new(ObstacleField::new(
        ObstacleFieldConfig::default(),
        11,
    ))));
    let mut config = ArenaConfig {
        seed: Some(11),
        ..ArenaConfig::default()
    };
    config.episode.max_episode_ticks = 50;

    let mut arena = Arena::new(&config)
        .unwrap()
        .with_parameter_source(Box::new(curriculum()))
        .with_population(Box::new(field.clone()));
    assert_eq!(arena.arena_size(), 30.0);
    assert_eq!(field.0.borrow().obstacles().len(), 10);

    let mut sizes = vec![arena.arena_size()];
    while arena.episode_count() < 3 {
        let before = arena.episode_count();
        arena.tick(TICK);
        if arena.episode_count() > before {
            sizes.push(arena.arena_size());
        }
    }

    assert_eq!(sizes, [30.0, 30.0, 60.0, 60.0]);
    assert_eq!(field.0.borrow().density(), 0.75);
    assert_eq!(field.0.borrow().obstacles().len(), 30);
    assert_eq!(
        arena.last_summary().unwrap().end_reason,
        Some(EndReason::TimeLimit)
    );
}

#[test]
fn scripted_duel_runs_to_completion() {
    let mut config = ArenaConfig {
        seed: Some(3),
        ..ArenaConfig::default()
    };
    config.episode.max_episode_ticks = 2000;
    config.episode.invulnerability_secs = 0.0;

    let mut arena = Arena::new(&config).unwrap();
    let mut pilots = vec![];
    for (team, x) in [(TeamId(0), -15.0), (TeamId(1), 15.0)] {
        let id = arena.register(
            Box::new(Ship::new(team).at(Vec3::new(x, 0.0, 0.0))),
            Some(Box::new(TrainingAgent::new())),
        );
        pilots.push(ScriptedPilot::new(id, PilotConfig::default()).unwrap());
    }

    let mut rng = Pcg32::seed_from_u64(3);
    let mut summaries = vec![];
    while summaries.len() < 5 {
        for pilot in &mut pilots {
            pilot.step(&mut arena, TICK, &mut rng).unwrap();
        }
        arena.tick(TICK);
        if arena.episode_count() > summaries.len() as u64 {
            summaries.push(arena.last_summary().unwrap().clone());
        }
    }

    for summary in &summaries {
        assert!(summary.end_reason.is_some());
        assert!(summary.ticks <= 2000);
        assert_eq!(summary.agents.len(), 2);
        if summary.end_reason == Some(EndReason::Kill) {
            let rewards: Vec<f32> = summary
                .agents
                .iter()
                .map(|agent| agent.cumulative_reward.unwrap())
                .collect();
            assert!(rewards.iter().any(|r| (r - 1.0).abs() < 1e-5));
            assert!(rewards.iter().any(|r| (r + 1.0).abs() < 1e-5));
        }
    }
    let episodes: Vec<u64> = summaries.iter().map(|s| s.episode).collect();
    assert_eq!(episodes, [0, 1, 2, 3, 4]);
}
