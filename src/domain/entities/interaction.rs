use chrono::{DateTime, Utc};
use serde::Serialize;

use super::command::OptionKind;
use super::scope::{GuildId, Scope};
use super::user::{Member, User};

/// Option value supplied by the caller, mirroring the descriptor's option tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionValue {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionValue>,
}

impl OptionValue {
    pub fn leaf(name: impl Into<String>, kind: OptionKind, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: Some(value.into()),
            options: Vec::new(),
        }
    }

    pub fn subcommand(name: impl Into<String>, options: Vec<OptionValue>) -> Self {
        Self {
            name: name.into(),
            kind: OptionKind::SubCommand,
            value: None,
            options,
        }
    }
}

/// Lookup helpers over an option list handed to a handler
pub trait OptionsExt {
    fn option(&self, name: &str) -> Option<&serde_json::Value>;
    fn option_str(&self, name: &str) -> Option<&str>;
    fn option_i64(&self, name: &str) -> Option<i64>;
}

impl OptionsExt for [OptionValue] {
    fn option(&self, name: &str) -> Option<&serde_json::Value> {
        self.iter().find(|o| o.name == name).and_then(|o| o.value.as_ref())
    }

    fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(|v| v.as_str())
    }

    fn option_i64(&self, name: &str) -> Option<i64> {
        self.option(name).and_then(|v| match v {
            serde_json::Value::String(s) => s.parse().ok(),
            other => other.as_i64(),
        })
    }
}

/// An inbound command invocation
#[derive(Debug, Clone)]
pub struct Interaction {
    pub id: String,
    pub guild_id: Option<GuildId>,
    pub channel_id: Option<String>,
    pub user: User,
    /// Absent in direct-message contexts
    pub member: Option<Member>,
    pub command_name: String,
    pub options: Vec<OptionValue>,
    pub received_at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(user: User, command_name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            guild_id: None,
            channel_id: None,
            user,
            member: None,
            command_name: command_name.into(),
            options: Vec::new(),
            received_at: Utc::now(),
        }
    }

    pub fn in_guild(mut self, guild_id: GuildId, member: Member) -> Self {
        self.guild_id = Some(guild_id);
        self.member = Some(member);
        self
    }

    pub fn with_options(mut self, options: Vec<OptionValue>) -> Self {
        self.options = options;
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Guild interactions resolve to their guild; DMs to the global scope
    pub fn scope(&self) -> Scope {
        match self.guild_id {
            Some(id) => Scope::Guild(id),
            None => Scope::Global,
        }
    }
}
