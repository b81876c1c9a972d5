//! Typed event bus for domain events published by feature modules

use std::fmt;

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::entities::{GuildId, UserId};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationKind {
    Warn,
    Kick,
}

impl fmt::Display for ModerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModerationKind::Warn => write!(f, "warn"),
            ModerationKind::Kick => write!(f, "kick"),
        }
    }
}

/// Something that happened inside a feature module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    ModerationAction {
        guild_id: GuildId,
        moderator: UserId,
        target: UserId,
        kind: ModerationKind,
        reason: Option<String>,
    },
    QuoteAdded {
        guild_id: Option<GuildId>,
        author: UserId,
        key: String,
    },
    CommandsSynced {
        mutations: usize,
        clean: bool,
    },
}

/// Broadcast bus handed to modules at construction time.
/// Every subscriber sees every event published after it subscribed.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event, returning how many subscribers received it
    pub fn publish(&self, event: DomainEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                trace!("No subscribers for {:?}", event);
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let event = DomainEvent::CommandsSynced { mutations: 2, clean: true };
        assert_eq!(bus.publish(event.clone()), 2);
        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_publishing_without_subscribers_is_not_an_error() {
        let bus = EventBus::new(4);
        assert_eq!(bus.publish(DomainEvent::CommandsSynced { mutations: 0, clean: true }), 0);
    }
}
