//! Command descriptors - the declarative schema of a remotely invocable command

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::permission::{Permission, PermissionSet};
use super::scope::ScopeTarget;
use crate::application::errors::ConfigError;

const MAX_OPTIONS: usize = 25;
const MAX_DESCRIPTION: usize = 100;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9_-]{1,32}$").expect("static pattern")
});

/// Kind of an option node, encoded as the platform's numeric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum OptionKind {
    SubCommand,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
    /// A kind this bot does not model (e.g. subcommand groups)
    Other(u8),
}

impl From<u8> for OptionKind {
    fn from(code: u8) -> Self {
        match code {
            1 => OptionKind::SubCommand,
            3 => OptionKind::String,
            4 => OptionKind::Integer,
            5 => OptionKind::Boolean,
            6 => OptionKind::User,
            7 => OptionKind::Channel,
            8 => OptionKind::Role,
            9 => OptionKind::Mentionable,
            10 => OptionKind::Number,
            11 => OptionKind::Attachment,
            other => OptionKind::Other(other),
        }
    }
}

impl From<OptionKind> for u8 {
    fn from(kind: OptionKind) -> u8 {
        match kind {
            OptionKind::SubCommand => 1,
            OptionKind::String => 3,
            OptionKind::Integer => 4,
            OptionKind::Boolean => 5,
            OptionKind::User => 6,
            OptionKind::Channel => 7,
            OptionKind::Role => 8,
            OptionKind::Mentionable => 9,
            OptionKind::Number => 10,
            OptionKind::Attachment => 11,
            OptionKind::Other(code) => code,
        }
    }
}

/// A fixed choice offered for a leaf option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: serde_json::Value,
}

/// One node of a command's option tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

impl CommandOption {
    pub fn new(kind: OptionKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required: false,
            choices: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn subcommand(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionKind::SubCommand, name, description)
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionKind::String, name, description)
    }

    pub fn user(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionKind::User, name, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionKind::Integer, name, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_choice(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.choices.push(OptionChoice { name: name.into(), value: value.into() });
        self
    }

    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn is_subcommand(&self) -> bool {
        self.kind == OptionKind::SubCommand
    }
}

/// Declarative schema for one command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
    pub required_permissions: PermissionSet,
    pub owner_only: bool,
    pub default_enabled: bool,
    pub target: ScopeTarget,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            required_permissions: PermissionSet::new(),
            owner_only: false,
            default_enabled: true,
            target: ScopeTarget::Global,
        }
    }

    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.required_permissions.insert(permission);
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }

    pub fn disabled_by_default(mut self) -> Self {
        self.default_enabled = false;
        self
    }

    pub fn in_scope(mut self, target: ScopeTarget) -> Self {
        self.target = target;
        self
    }

    /// Whether members can use the command without an explicit grant.
    /// Commands gated on permissions are never enabled by default.
    pub fn default_permission(&self) -> bool {
        self.default_enabled && self.required_permissions.is_empty()
    }

    pub fn has_subcommands(&self) -> bool {
        self.options.iter().any(CommandOption::is_subcommand)
    }

    pub fn subcommand(&self, name: &str) -> Option<&CommandOption> {
        self.options.iter().find(|o| o.is_subcommand() && o.name == name)
    }

    pub fn subcommand_names(&self) -> impl Iterator<Item = &str> {
        self.options.iter().filter(|o| o.is_subcommand()).map(|o| o.name.as_str())
    }

    /// Check the descriptor against the platform's structural rules
    pub fn validate(&self) -> Result<(), ConfigError> {
        let malformed = |reason: String| ConfigError::MalformedDescriptor {
            name: self.name.clone(),
            reason,
        };

        if !NAME_PATTERN.is_match(&self.name) {
            return Err(malformed("name must be 1-32 characters of [a-z0-9_-]".to_string()));
        }
        check_description(&self.description).map_err(malformed)?;
        check_level(&self.options, true).map_err(malformed)
    }
}

fn check_description(description: &str) -> Result<(), String> {
    let len = description.chars().count();
    if len == 0 || len > MAX_DESCRIPTION {
        return Err(format!("description must be 1-{} characters", MAX_DESCRIPTION));
    }
    Ok(())
}

fn check_level(options: &[CommandOption], top_level: bool) -> Result<(), String> {
    if options.len() > MAX_OPTIONS {
        return Err(format!("at most {} options per level", MAX_OPTIONS));
    }

    let subcommands = options.iter().filter(|o| o.is_subcommand()).count();
    if subcommands > 0 && !top_level {
        return Err("subcommands cannot be nested".to_string());
    }
    if subcommands > 0 && subcommands != options.len() {
        return Err("subcommands cannot be mixed with other options".to_string());
    }

    let mut seen_optional = false;
    for (i, option) in options.iter().enumerate() {
        if !NAME_PATTERN.is_match(&option.name) {
            return Err(format!("option name '{}' is invalid", option.name));
        }
        if options[..i].iter().any(|o| o.name == option.name) {
            return Err(format!("option '{}' declared twice", option.name));
        }
        check_description(&option.description)
            .map_err(|e| format!("option '{}': {}", option.name, e))?;

        if option.is_subcommand() {
            check_level(&option.options, false)?;
            continue;
        }
        if !option.options.is_empty() {
            return Err(format!("leaf option '{}' cannot have nested options", option.name));
        }
        if option.required && seen_optional {
            return Err(format!("required option '{}' follows an optional one", option.name));
        }
        seen_optional |= !option.required;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_kind_codes() {
        assert_eq!(u8::from(OptionKind::SubCommand), 1);
        assert_eq!(OptionKind::from(3), OptionKind::String);
        assert_eq!(OptionKind::from(2), OptionKind::Other(2));
    }

    #[test]
    fn test_option_serializes_in_platform_shape() {
        let option = CommandOption::string("text", "Quote text").required();
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["type"], 3);
        assert_eq!(json["required"], true);
        assert!(json.get("options").is_none());
    }

    #[test]
    fn test_default_permission_follows_required_permissions() {
        let open = CommandDescriptor::new("ping", "Pong!");
        assert!(open.default_permission());
        let gated = CommandDescriptor::new("kick", "Kick a member").with_permission(Permission::KickMembers);
        assert!(!gated.default_permission());
        let disabled = CommandDescriptor::new("hidden", "Hidden").disabled_by_default();
        assert!(!disabled.default_permission());
    }

    #[test]
    fn test_validate_accepts_well_formed_subcommands() {
        let cmd = CommandDescriptor::new("quote", "Quotes")
            .with_option(CommandOption::subcommand("add", "Add a quote")
                .with_option(CommandOption::string("text", "Quote text").required()))
            .with_option(CommandOption::subcommand("random", "Random quote"));
        assert!(cmd.validate().is_ok());
        assert!(cmd.has_subcommands());
        assert_eq!(cmd.subcommand_names().collect::<Vec<_>>(), vec!["add", "random"]);
    }

    #[test]
    fn test_validate_rejects_bad_names_and_nesting() {
        assert!(CommandDescriptor::new("Ping", "Pong").validate().is_err());
        assert!(CommandDescriptor::new("ping", "").validate().is_err());

        let nested = CommandDescriptor::new("deep", "Too deep")
            .with_option(CommandOption::subcommand("a", "A")
                .with_option(CommandOption::subcommand("b", "B")));
        assert!(matches!(nested.validate(), Err(ConfigError::MalformedDescriptor { .. })));

        let mixed = CommandDescriptor::new("mixed", "Mixed")
            .with_option(CommandOption::subcommand("a", "A"))
            .with_option(CommandOption::string("b", "B"));
        assert!(mixed.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_required_after_optional() {
        let cmd = CommandDescriptor::new("warn", "Warn")
            .with_option(CommandOption::string("reason", "Reason"))
            .with_option(CommandOption::user("user", "Member").required());
        assert!(cmd.validate().is_err());
    }
}
