use crate::{AgentController, Combatant, CombatantId, RewardGrant, TeamId};

/// One roster slot: a combatant and, when it is trainable, its agent.
///
/// Either half may be missing. Slots are never removed so ids stay stable.
#[derive(Debug, Default)]
pub struct Participant {
    combatant: Option<Box<dyn Combatant>>,
    agent: Option<Box<dyn AgentController>>,
}

/// Combatants and agents owned by one arena, indexed by [`CombatantId`].
#[derive(Debug, Default)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        combatant: Box<dyn Combatant>,
        agent: Option<Box<dyn AgentController>>,
    ) -> CombatantId {
        let id = CombatantId(self.participants.len());
        self.participants.push(Participant {
            combatant: Some(combatant),
            agent,
        });
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = CombatantId> + use<> {
        (0..self.participants.len()).map(CombatantId)
    }

    #[must_use]
    pub fn contains(&self, id: CombatantId) -> bool {
        id.0 < self.participants.len()
    }

    #[must_use]
    pub fn combatant(&self, id: CombatantId) -> Option<&dyn Combatant> {
        self.participants.get(id.0)?.combatant.as_deref()
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut (dyn Combatant + 'static)> {
        self.participants.get_mut(id.0)?.combatant.as_deref_mut()
    }

    #[must_use]
    pub fn agent(&self, id: CombatantId) -> Option<&dyn AgentController> {
        self.participants.get(id.0)?.agent.as_deref()
    }

    pub fn agent_mut(&mut self, id: CombatantId) -> Option<&mut (dyn AgentController + 'static)> {
        self.participants.get_mut(id.0)?.agent.as_deref_mut()
    }

    pub fn remove_combatant(&mut self, id: CombatantId) -> Option<Box<dyn Combatant>> {
        self.participants.get_mut(id.0)?.combatant.take()
    }

    pub fn remove_agent(&mut self, id: CombatantId) -> Option<Box<dyn AgentController>> {
        self.participants.get_mut(id.0)?.agent.take()
    }

    #[must_use]
    pub fn team(&self, id: CombatantId) -> Option<TeamId> {
        self.combatant(id).map(|c| c.team())
    }

    /// Both halves of the slot are present.
    #[must_use]
    pub fn is_trainable(&self, id: CombatantId) -> bool {
        self.participants
            .get(id.0)
            .is_some_and(|p| p.combatant.is_some() && p.agent.is_some())
    }

    #[must_use]
    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.combatant(id).is_some_and(|c| c.is_alive())
    }

    /// Whether both combatants exist and fight for different teams.
    #[must_use]
    pub fn are_opponents(&self, a: CombatantId, b: CombatantId) -> bool {
        match (self.team(a), self.team(b)) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }

    /// Ids of trainable participants, in registration order.
    pub fn trainable_ids(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.ids().filter(|id| self.is_trainable(*id))
    }

    /// Final cumulative reward of every agent, in registration order.
    #[must_use]
    pub fn cumulative_rewards(&self) -> Vec<(CombatantId, f32)> {
        self.ids()
            .filter_map(|id| Some((id, self.agent(id)?.cumulative_reward())))
            .collect()
    }

    /// Applies reward grants. Grants for slots without an agent are dropped.
    pub fn apply(&mut self, grants: &[RewardGrant]) {
        for grant in grants {
            if let Some(agent) = self.agent_mut(grant.recipient) {
                let delta = grant.change.delta_from(agent.cumulative_reward());
                agent.add_reward(delta);
            }
        }
    }
}
