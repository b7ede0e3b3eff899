use std::{f32::consts::TAU, time::Duration};

use glam::Vec3;
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use tracing::{debug, info, warn};

use crate::{
    AgentController, ArenaConfig, ArenaError, ArenaEvent, ArenaPopulation, ArenaSettings,
    BoundaryMonitor, BoundaryZone, Combatant, CombatantId, ConfigError, DamageReport,
    EffectiveSettings, EndReason, EpisodeOrchestrator, EpisodePhase, EpisodeSummary, EventBus,
    MetricsAggregator, MetricsSink, ParameterSource, ResetStage, RewardAdministrator,
    RewardChange, RewardGrant, Roster, SettingsResolver, SubscriptionId, planar_distance,
};

/// A bounded simulation owning combatants, their agents, and episode state.
#[derive(Debug)]
pub struct Arena {
    center: Vec3,
    roster: Roster,
    resolver: SettingsResolver,
    settings: EffectiveSettings,
    boundary: BoundaryMonitor,
    rewards: RewardAdministrator,
    orchestrator: EpisodeOrchestrator,
    metrics: MetricsAggregator,
    events: EventBus,
    parameters: Option<Box<dyn ParameterSource>>,
    population: Option<Box<dyn ArenaPopulation>>,
    sink: Option<Box<dyn MetricsSink>>,
    spawn_radius_fraction: f32,
    invulnerability: Duration,
    max_episode_ticks: u64,
    rng: Pcg32,
    last_summary: Option<EpisodeSummary>,
}

impl Arena {
    /// Builds an arena centered at the origin.
    ///
    /// Fails when the configuration is malformed, most notably when the hard
    /// boundary multiplier does not exceed the soft one.
    pub fn new(config: &ArenaConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let resolver = SettingsResolver::new(config.defaults);
        let settings = resolver.resolve(None);
        let boundary = BoundaryMonitor::new(config.boundary, &settings)?;
        let rng = match config.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_rng(&mut rand::rng()),
        };

        Ok(Self {
            center: Vec3::ZERO,
            roster: Roster::new(),
            resolver,
            settings,
            boundary,
            rewards: RewardAdministrator::new(config.reward),
            orchestrator: EpisodeOrchestrator::new(&config.episode),
            metrics: MetricsAggregator::new(&config.metrics),
            events: EventBus::new(),
            parameters: None,
            population: None,
            sink: None,
            spawn_radius_fraction: config.episode.spawn_radius_fraction,
            invulnerability: config.episode.invulnerability(),
            max_episode_ticks: config.episode.max_episode_ticks,
            rng,
            last_summary: None,
        })
    }

    #[must_use]
    pub fn with_center(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    /// Attaches the trainer's parameter source and re-resolves the current settings
    /// against it.
    #[must_use]
    pub fn with_parameter_source(mut self, mut source: Box<dyn ParameterSource>) -> Self {
        source.prepare(self.orchestrator.episode_count());
        self.parameters = Some(source);
        self.refresh_settings();
        self
    }

    /// Installs a manager override for the current episode as well as later ones.
    #[must_use]
    pub fn with_override_settings(mut self, settings: Option<ArenaSettings>) -> Self {
        self.resolver.set_override(settings);
        self.refresh_settings();
        self
    }

    /// Attaches the obstacle collaborator and populates it for the current episode.
    #[must_use]
    pub fn with_population(mut self, population: Box<dyn ArenaPopulation>) -> Self {
        self.population = Some(population);
        self.populate();
        self
    }

    #[must_use]
    pub fn with_metrics_sink(mut self, sink: Box<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Adds a combatant, optionally controlled by a trainable agent.
    ///
    /// A newly registered agent is told that its episode has begun.
    pub fn register(
        &mut self,
        combatant: Box<dyn Combatant>,
        agent: Option<Box<dyn AgentController>>,
    ) -> CombatantId {
        let trainable = agent.is_some();
        let id = self.roster.push(combatant, agent);
        if trainable {
            if let Some(agent) = self.roster.agent_mut(id) {
                agent.notify_episode_begin();
            }
            self.metrics.track(id);
        }
        debug!(%id, trainable, "registered combatant");
        id
    }

    pub fn remove_combatant(&mut self, id: CombatantId) -> Option<Box<dyn Combatant>> {
        self.roster.remove_combatant(id)
    }

    pub fn remove_agent(&mut self, id: CombatantId) -> Option<Box<dyn AgentController>> {
        self.roster.remove_agent(id)
    }

    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub fn combatant(&self, id: CombatantId) -> Option<&dyn Combatant> {
        self.roster.combatant(id)
    }

    #[must_use]
    pub fn agent(&self, id: CombatantId) -> Option<&dyn AgentController> {
        self.roster.agent(id)
    }

    /// Whether rewards and boundary checks are currently accumulated.
    #[must_use]
    pub fn is_episode_active(&self) -> bool {
        self.orchestrator.is_active()
    }

    #[must_use]
    pub fn phase(&self) -> EpisodePhase {
        self.orchestrator.phase()
    }

    #[must_use]
    pub fn center_position(&self) -> Vec3 {
        self.center
    }

    #[must_use]
    pub fn arena_size(&self) -> f32 {
        self.settings.arena_size()
    }

    #[must_use]
    pub fn settings(&self) -> &EffectiveSettings {
        &self.settings
    }

    #[must_use]
    pub fn boundary(&self) -> &BoundaryMonitor {
        &self.boundary
    }

    #[must_use]
    pub fn rewards(&self) -> &RewardAdministrator {
        &self.rewards
    }

    #[must_use]
    pub fn metrics(&self) -> &MetricsAggregator {
        &self.metrics
    }

    /// Number of completed episodes.
    #[must_use]
    pub fn episode_count(&self) -> u64 {
        self.orchestrator.episode_count()
    }

    #[must_use]
    pub fn episode_ticks(&self) -> u64 {
        self.orchestrator.episode_ticks()
    }

    /// Summary emitted by the most recent flush.
    #[must_use]
    pub fn last_summary(&self) -> Option<&EpisodeSummary> {
        self.last_summary.as_ref()
    }

    /// Replaces the manager override. Takes effect from the next episode.
    pub fn set_override_settings(&mut self, settings: Option<ArenaSettings>) {
        self.resolver.set_override(settings);
    }

    pub fn set_auto_reset(&mut self, enabled: bool) {
        self.orchestrator.set_auto_reset(enabled);
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ArenaEvent) + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Ends the current episode and schedules a reset.
    ///
    /// Only the first request of an active episode has any effect; the rest
    /// return `false`.
    pub fn request_end(&mut self, reason: EndReason) -> bool {
        if !self.orchestrator.request_end(reason) {
            return false;
        }
        let episode = self.orchestrator.episode_count();
        info!(episode, %reason, ticks = self.orchestrator.episode_ticks(), "episode ended");
        self.events.publish(&ArenaEvent::EpisodeEnded { episode, reason });
        true
    }

    /// Externally requested reset. Same gate as [`request_end`](Self::request_end).
    pub fn reset_arena(&mut self) -> bool {
        self.request_end(EndReason::External)
    }

    /// Moves a live combatant. Dead combatants stay where they fell.
    pub fn steer(
        &mut self,
        id: CombatantId,
        position: Vec3,
        heading: f32,
    ) -> Result<(), ArenaError> {
        self.combatant_entry(id)?.set_transform(position, heading);
        Ok(())
    }

    /// Routes damage to `victim` and administers rewards for it.
    ///
    /// Returns `Ok(None)` when the combatant ignored the damage (dead, invulnerable,
    /// or a non-positive amount). Rewards and metrics are only recorded while the
    /// episode is active, but events are always published.
    pub fn apply_damage(
        &mut self,
        victim: CombatantId,
        attacker: Option<CombatantId>,
        amount: f32,
    ) -> Result<Option<DamageReport>, ArenaError> {
        let Some(report) = self.combatant_entry(victim)?.take_damage(amount) else {
            return Ok(None);
        };

        self.events.publish(&ArenaEvent::Damaged {
            victim,
            attacker,
            amount: report.amount,
        });
        if self.orchestrator.is_active() {
            let grants = self
                .rewards
                .on_damaged(victim, attacker, &report, &self.roster);
            self.roster.apply(&grants);
            self.metrics.record_damage(attacker, victim, report.amount);
        }

        if report.killed {
            info!(%victim, killer = ?attacker, "combatant destroyed");
            self.events.publish(&ArenaEvent::Died {
                victim,
                killer: attacker,
            });
            if self.orchestrator.is_active() {
                let grants = self.rewards.on_died(victim, attacker, &self.roster);
                self.roster.apply(&grants);
                self.metrics.record_kill();
                self.request_end(EndReason::Kill);
            }
        }

        Ok(Some(report))
    }

    /// Advances the arena by one fixed simulation step.
    pub fn tick(&mut self, dt: Duration) {
        for id in self.roster.ids() {
            if let Some(combatant) = self.roster.combatant_mut(id) {
                combatant.advance(dt);
            }
        }

        self.drive_reset(dt);
        if !self.orchestrator.is_active() {
            return;
        }

        let ticks = self.orchestrator.record_tick();
        let sample_distances = self.metrics.record_tick();

        let grants = self.rewards.existence_penalties(&self.roster);
        self.roster.apply(&grants);

        self.sweep_boundary();
        if !self.orchestrator.is_active() {
            return;
        }

        if sample_distances {
            self.sample_distances();
        }
        if self.max_episode_ticks > 0 && ticks >= self.max_episode_ticks {
            self.request_end(EndReason::TimeLimit);
        }
    }

    fn combatant_entry(
        &mut self,
        id: CombatantId,
    ) -> Result<&mut (dyn Combatant + 'static), ArenaError> {
        if !self.roster.contains(id) {
            return Err(ArenaError::UnknownCombatant { id });
        }
        self.roster
            .combatant_mut(id)
            .ok_or(ArenaError::MissingCombatant { id })
    }

    fn sweep_boundary(&mut self) {
        let agents: Vec<CombatantId> = self.roster.trainable_ids().collect();
        for id in agents {
            let Some(combatant) = self.roster.combatant(id).filter(|c| c.is_alive()) else {
                continue;
            };
            let distance = planar_distance(combatant.position(), self.center);
            match self.boundary.classify(distance) {
                BoundaryZone::Inside => {}
                BoundaryZone::Soft { penalty, .. } => {
                    if penalty > 0.0 {
                        self.roster
                            .apply(&[RewardGrant::new(id, RewardChange::Delta(-penalty))]);
                    }
                }
                BoundaryZone::Hard => {
                    info!(%id, distance, "combatant crossed the hard boundary");
                    let grants = self.rewards.on_boundary_violation(id, &self.roster);
                    self.roster.apply(&grants);
                    self.request_end(EndReason::BoundaryViolation);
                    break;
                }
            }
        }
    }

    fn sample_distances(&mut self) {
        let arena_size = self.settings.arena_size();
        for id in self.roster.trainable_ids() {
            if let Some(combatant) = self.roster.combatant(id).filter(|c| c.is_alive()) {
                let distance = planar_distance(combatant.position(), self.center);
                self.metrics.record_distance(distance / arena_size);
            }
        }
    }

    fn drive_reset(&mut self, dt: Duration) {
        let mut dt = dt;
        while let Some(stage) = self.orchestrator.poll(dt) {
            match stage {
                ResetStage::Prepare => {
                    self.prepare_reset();
                    dt = Duration::ZERO;
                }
                ResetStage::Finish => {
                    self.finish_reset();
                    break;
                }
            }
        }
    }

    /// Runs the reset steps that precede the delay.
    fn prepare_reset(&mut self) {
        let finished = self.orchestrator.episode_count();
        let rewards = self.roster.cumulative_rewards();
        let sink = self
            .sink
            .as_deref_mut()
            .map(|sink| sink as &mut dyn MetricsSink);
        let summary = self
            .metrics
            .flush(finished, self.orchestrator.end_reason(), &rewards, sink);
        self.last_summary = Some(summary);

        let episode = self.orchestrator.advance_episode();
        self.events.publish(&ArenaEvent::EpisodeReset { episode });

        if let Some(parameters) = self.parameters.as_deref_mut() {
            parameters.prepare(episode);
        }
        self.refresh_settings();
        debug!(episode, "prepared episode reset");
    }

    /// Runs the reset steps that follow the delay and reopens the gate.
    fn finish_reset(&mut self) {
        self.populate();
        self.respawn_combatants();
        self.begin_agent_episodes();
        self.rewards.begin_episode();
        self.metrics.reset();
        self.orchestrator.reopen();
        info!(
            episode = self.orchestrator.episode_count(),
            arena_size = self.settings.arena_size(),
            "episode started"
        );
    }

    fn refresh_settings(&mut self) {
        let resolved = self.resolver.resolve(self.parameters.as_deref());
        if let Err(err) = resolved.to_settings().validate() {
            warn!(%err, "keeping previous arena settings");
            return;
        }
        self.settings = resolved;
        self.boundary.configure(&self.settings);
    }

    fn populate(&mut self) {
        let Some(population) = self.population.as_deref_mut() else {
            debug!("no arena population attached, skipping obstacle respawn");
            return;
        };
        population.set_anchor(self.center);
        population.set_density(self.settings.obstacle_density());
        population.respawn_obstacles();
    }

    fn respawn_combatants(&mut self) {
        let radius = self.spawn_radius_fraction * self.settings.arena_size();
        for id in self.roster.ids() {
            let (position, heading) = spawn_point(&mut self.rng, self.center, radius);
            let Some(combatant) = self.roster.combatant_mut(id) else {
                debug!(%id, "skipping reset of missing combatant");
                continue;
            };
            combatant.reset(position, heading);
            combatant.set_temporary_invulnerability(self.invulnerability);
        }
    }

    fn begin_agent_episodes(&mut self) {
        for id in self.roster.ids() {
            if let Some(agent) = self.roster.agent_mut(id) {
                agent.notify_episode_begin();
            }
        }
    }
}

/// Uniform random point in the disc of `radius` around `center`, and a heading.
fn spawn_point<R>(rng: &mut R, center: Vec3, radius: f32) -> (Vec3, f32)
where
    R: Rng,
{
    let distance = radius * rng.random::<f32>().sqrt();
    let angle = rng.random_range(0.0..TAU);
    let heading = rng.random_range(0.0..TAU);
    let offset = Vec3::new(distance * angle.cos(), 0.0, distance * angle.sin());
    (center + offset, heading)
}
