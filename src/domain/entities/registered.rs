use serde::{Deserialize, Serialize};

use super::command::{CommandDescriptor, CommandOption};

fn enabled() -> bool {
    true
}

/// A command as currently registered on the platform.
/// Fetched per synchronization pass and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredCommand {
    /// Platform-assigned identifier
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default = "enabled")]
    pub default_permission: bool,
}

impl RegisteredCommand {
    /// Build the registered mirror of a descriptor under the given id
    pub fn from_descriptor(id: impl Into<String>, descriptor: &CommandDescriptor) -> Self {
        Self {
            id: id.into(),
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            options: descriptor.options.clone(),
            default_permission: descriptor.default_permission(),
        }
    }

    /// Content equality with a descriptor. The remote id plays no part.
    pub fn matches(&self, descriptor: &CommandDescriptor) -> bool {
        self.description == descriptor.description
            && self.options == descriptor.options
            && self.default_permission == descriptor.default_permission()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CommandOption, Permission};

    #[test]
    fn test_equality_ignores_remote_id() {
        let d = CommandDescriptor::new("ping", "Pong!");
        let a = RegisteredCommand::from_descriptor("1", &d);
        let b = RegisteredCommand::from_descriptor("999", &d);
        assert!(a.matches(&d));
        assert!(b.matches(&d));
    }

    #[test]
    fn test_content_changes_break_equality() {
        let d = CommandDescriptor::new("ping", "Pong!");
        let registered = RegisteredCommand::from_descriptor("1", &d);

        assert!(!registered.matches(&CommandDescriptor::new("ping", "New pong!")));
        assert!(!registered.matches(&d.clone().with_option(CommandOption::string("target", "Who"))));
        assert!(!registered.matches(&d.clone().with_permission(Permission::ManageGuild)));
    }

    #[test]
    fn test_deserializes_platform_payload_with_defaults() {
        let json = r#"{"id":"123","application_id":"9","name":"ping","description":"Pong!","version":"1"}"#;
        let registered: RegisteredCommand = serde_json::from_str(json).unwrap();
        assert_eq!(registered.id, "123");
        assert!(registered.options.is_empty());
        assert!(registered.default_permission);
        assert!(registered.matches(&CommandDescriptor::new("ping", "Pong!")));
    }
}
