use std::fmt;

use crate::{CombatantId, EndReason};

/// Notifications published by an [`Arena`](crate::Arena) to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArenaEvent {
    Damaged {
        victim: CombatantId,
        attacker: Option<CombatantId>,
        amount: f32,
    },
    Died {
        victim: CombatantId,
        killer: Option<CombatantId>,
    },
    /// The gate closed; `episode` is the index of the episode that just ended.
    EpisodeEnded { episode: u64, reason: EndReason },
    /// The episode counter advanced; the next episode starts once the reset finishes.
    EpisodeReset { episode: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("subscription {_0}")]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&ArenaEvent)>;

/// Explicit publish/subscribe registry.
///
/// Handlers receive events until they are unsubscribed with the id returned by
/// [`EventBus::subscribe`].
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ArenaEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns `false` if the subscription was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn publish(&mut self, event: &ArenaEvent) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }
}
