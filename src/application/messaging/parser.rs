//! Interaction parser - turns gateway payloads and console lines into interactions

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;

use crate::application::errors::BotError;
use crate::domain::entities::{
    GuildId, Interaction, Member, OptionKind, OptionValue, PermissionSet, User, UserId,
};

/// `name:value`, `name:"quoted value"`, or a bare word
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:([a-z0-9_-]+):)?(?:"([^"]*)"|(\S+))"#).expect("static pattern")
});

#[derive(Debug, Deserialize)]
struct InteractionPayload {
    id: String,
    guild_id: Option<String>,
    channel_id: Option<String>,
    member: Option<MemberPayload>,
    user: Option<UserPayload>,
    data: CommandData,
}

#[derive(Debug, Deserialize)]
struct MemberPayload {
    user: UserPayload,
    permissions: Option<String>,
    nick: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    username: Option<String>,
    #[serde(default)]
    bot: bool,
}

#[derive(Debug, Deserialize)]
struct CommandData {
    name: String,
    #[serde(default)]
    options: Vec<OptionPayload>,
}

#[derive(Debug, Deserialize)]
struct OptionPayload {
    name: String,
    #[serde(rename = "type")]
    kind: OptionKind,
    value: Option<serde_json::Value>,
    #[serde(default)]
    options: Vec<OptionPayload>,
}

impl From<OptionPayload> for OptionValue {
    fn from(payload: OptionPayload) -> Self {
        OptionValue {
            name: payload.name,
            kind: payload.kind,
            value: payload.value,
            options: payload.options.into_iter().map(Into::into).collect(),
        }
    }
}

fn snowflake(raw: &str, what: &str) -> Result<u64, BotError> {
    raw.parse()
        .map_err(|_| BotError::Parse(format!("invalid {} id '{}'", what, raw)))
}

impl UserPayload {
    fn into_user(self) -> Result<User, BotError> {
        let mut user = User::new(UserId(snowflake(&self.id, "user")?));
        user.username = self.username;
        user.is_bot = self.bot;
        Ok(user)
    }
}

/// Parses incoming interactions into structured Interaction objects
pub struct InteractionParser {
    command_prefix: String,
}

impl InteractionParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse a JSON interaction payload as delivered by the gateway
    pub fn parse_payload(&self, raw: &str) -> Result<Interaction, BotError> {
        let payload: InteractionPayload = serde_json::from_str(raw)
            .map_err(|e| BotError::Parse(format!("Failed to parse interaction: {}", e)))?;

        let (user, member) = match (payload.member, payload.user) {
            (Some(member), _) => {
                let bits = match member.permissions.as_deref() {
                    Some(bits) => bits
                        .parse()
                        .map_err(|_| BotError::Parse(format!("invalid permission bits '{}'", bits)))?,
                    None => 0,
                };
                let user = member.user.into_user()?;
                let member = Member {
                    permissions: PermissionSet::from_bits(bits),
                    nick: member.nick,
                };
                (user, Some(member))
            }
            (None, Some(user)) => (user.into_user()?, None),
            (None, None) => return Err(BotError::Parse("interaction has no invoking user".to_string())),
        };

        let guild_id = payload
            .guild_id
            .as_deref()
            .map(|id| snowflake(id, "guild").map(GuildId))
            .transpose()?;

        let mut interaction = Interaction::new(user, payload.data.name)
            .with_options(payload.data.options.into_iter().map(Into::into).collect());
        interaction.id = payload.id;
        interaction.channel_id = payload.channel_id;
        // a member without a guild cannot be gated on permissions
        if let Some(guild_id) = guild_id {
            interaction.guild_id = Some(guild_id);
            interaction.member = member;
        }
        Ok(interaction)
    }

    /// Parse a console command line such as `/quote add text:"hello there"`.
    ///
    /// The first bare word after the command name selects a subcommand; every
    /// `name:value` token becomes a string option.
    pub fn parse_line(&self, user: User, line: &str) -> Result<Interaction, BotError> {
        let line = line.trim();
        let rest = line
            .strip_prefix(self.command_prefix.as_str())
            .or_else(|| line.strip_prefix('/'))
            .ok_or_else(|| BotError::Parse(format!("commands start with '{}'", self.command_prefix)))?;

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args),
            None => (rest, ""),
        };
        if name.is_empty() {
            return Err(BotError::Parse("missing command name".to_string()));
        }

        let mut subcommand = None;
        let mut options = Vec::new();
        for token in TOKEN.captures_iter(args) {
            let value = token
                .get(2)
                .or_else(|| token.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();

            match token.get(1) {
                Some(key) => options.push(OptionValue::leaf(key.as_str(), OptionKind::String, value)),
                None if subcommand.is_none() && options.is_empty() => subcommand = Some(value),
                None => return Err(BotError::Parse(format!("unexpected argument '{}'", value))),
            }
        }

        let options = match subcommand {
            Some(sub) => vec![OptionValue::subcommand(sub, options)],
            None => options,
        };
        Ok(Interaction::new(user, name.to_lowercase()).with_options(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Permission, Scope};

    fn parser() -> InteractionParser {
        InteractionParser::new("/")
    }

    #[test]
    fn test_guild_payload_carries_member_permissions() {
        let raw = r#"{
            "id": "1001",
            "guild_id": "42",
            "channel_id": "7",
            "member": {"user": {"id": "5", "username": "mod"}, "permissions": "6"},
            "data": {"name": "mod", "options": [
                {"name": "warn", "type": 1, "options": [
                    {"name": "user", "type": 6, "value": "9"}
                ]}
            ]}
        }"#;
        let interaction = parser().parse_payload(raw).unwrap();
        assert_eq!(interaction.id, "1001");
        assert_eq!(interaction.scope(), Scope::Guild(GuildId(42)));
        assert_eq!(interaction.user.id, UserId(5));
        let member = interaction.member.unwrap();
        assert!(member.permissions.contains(Permission::KickMembers));
        assert!(member.permissions.contains(Permission::BanMembers));
        assert_eq!(interaction.options[0].kind, OptionKind::SubCommand);
        assert_eq!(interaction.options[0].options[0].name, "user");
    }

    #[test]
    fn test_dm_payload_has_no_member() {
        let raw = r#"{"id": "1", "user": {"id": "5"}, "data": {"name": "ping"}}"#;
        let interaction = parser().parse_payload(raw).unwrap();
        assert_eq!(interaction.scope(), Scope::Global);
        assert!(interaction.member.is_none());
        assert!(interaction.options.is_empty());
    }

    #[test]
    fn test_payload_without_user_is_rejected() {
        let raw = r#"{"id": "1", "data": {"name": "ping"}}"#;
        assert!(parser().parse_payload(raw).is_err());
        assert!(parser().parse_payload("not json").is_err());
    }

    #[test]
    fn test_console_line_with_subcommand_and_quoted_option() {
        let user = User::new(UserId(1));
        let interaction = parser()
            .parse_line(user, r#"/quote add text:"hello there" author:me"#)
            .unwrap();
        assert_eq!(interaction.command_name, "quote");
        let sub = &interaction.options[0];
        assert_eq!(sub.kind, OptionKind::SubCommand);
        assert_eq!(sub.name, "add");
        assert_eq!(sub.options[0].value, Some(serde_json::json!("hello there")));
        assert_eq!(sub.options[1].value, Some(serde_json::json!("me")));
    }

    #[test]
    fn test_console_line_without_subcommand() {
        let interaction = parser().parse_line(User::new(UserId(1)), "/ping").unwrap();
        assert_eq!(interaction.command_name, "ping");
        assert!(interaction.options.is_empty());

        assert!(parser().parse_line(User::new(UserId(1)), "ping").is_err());
        assert!(parser().parse_line(User::new(UserId(1)), "/warn user:1 extra").is_err());
    }
}
