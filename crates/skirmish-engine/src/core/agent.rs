use std::fmt;

/// The trainer-facing side of a combatant.
///
/// The arena only ever adds reward deltas; absolute targets such as the terminal
/// win/loss signal are reached by adding `target - cumulative_reward()`.
pub trait AgentController: fmt::Debug {
    fn add_reward(&mut self, delta: f32);

    /// Reward accumulated since the last episode began.
    fn cumulative_reward(&self) -> f32;

    /// Signals the start of a new episode and clears per-episode state.
    fn notify_episode_begin(&mut self);
}

/// In-process [`AgentController`] that keeps its reward locally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingAgent {
    cumulative_reward: f32,
    reward_count: usize,
    episodes_begun: u64,
}

impl TrainingAgent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reward deltas received in the current episode.
    #[must_use]
    pub fn reward_count(&self) -> usize {
        self.reward_count
    }

    #[must_use]
    pub fn episodes_begun(&self) -> u64 {
        self.episodes_begun
    }
}

impl AgentController for TrainingAgent {
    fn add_reward(&mut self, delta: f32) {
        self.cumulative_reward += delta;
        self.reward_count += 1;
    }

    fn cumulative_reward(&self) -> f32 {
        self.cumulative_reward
    }

    fn notify_episode_begin(&mut self) {
        self.cumulative_reward = 0.0;
        self.reward_count = 0;
        self.episodes_begun += 1;
    }
}
