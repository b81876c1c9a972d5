use std::fmt;

use super::interaction::Interaction;
use super::scope::GuildId;
use super::user::User;

/// Name of a gateway event handlers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Ready,
    InteractionCreate,
    MessageCreate,
    GuildMemberAdd,
    GuildMemberRemove,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Ready => "ready",
            EventKind::InteractionCreate => "interaction_create",
            EventKind::MessageCreate => "message_create",
            EventKind::GuildMemberAdd => "guild_member_add",
            EventKind::GuildMemberRemove => "guild_member_remove",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered by the gateway, already parsed
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Ready {
        user: User,
        guilds: Vec<GuildId>,
    },
    InteractionCreate(Interaction),
    MessageCreate {
        guild_id: Option<GuildId>,
        channel_id: String,
        author: User,
        content: String,
    },
    GuildMemberAdd {
        guild_id: GuildId,
        user: User,
    },
    GuildMemberRemove {
        guild_id: GuildId,
        user: User,
    },
}

impl GatewayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GatewayEvent::Ready { .. } => EventKind::Ready,
            GatewayEvent::InteractionCreate(_) => EventKind::InteractionCreate,
            GatewayEvent::MessageCreate { .. } => EventKind::MessageCreate,
            GatewayEvent::GuildMemberAdd { .. } => EventKind::GuildMemberAdd,
            GatewayEvent::GuildMemberRemove { .. } => EventKind::GuildMemberRemove,
        }
    }
}
