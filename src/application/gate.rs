//! Permission gate - decides whether a caller may run a resolved command

use std::fmt;

use crate::domain::entities::{CommandDescriptor, Member, PermissionSet, UserId};

/// Who is invoking a command, and in what membership context
#[derive(Debug, Clone, Copy)]
pub struct Caller<'a> {
    pub id: UserId,
    /// `None` when the context has no notion of membership (direct messages)
    pub member: Option<&'a Member>,
}

/// Gate outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    OwnerOnly,
    GuildOnly,
    MissingPermissions(PermissionSet),
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::OwnerOnly => "owner-only",
            DenyReason::GuildOnly => "guild-only",
            DenyReason::MissingPermissions(_) => "missing-permissions",
        }
    }

    /// Message shown to the caller
    pub fn user_message(&self) -> String {
        match self {
            DenyReason::OwnerOnly => "This command can only be used by the bot owner.".to_string(),
            DenyReason::GuildOnly => "This command can only be used inside a server.".to_string(),
            DenyReason::MissingPermissions(missing) => {
                format!("You are missing the required permissions: {}", missing)
            }
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::MissingPermissions(missing) => write!(f, "{} ({})", self.code(), missing),
            _ => f.write_str(self.code()),
        }
    }
}

/// Pure authorization check against the configured bot owner
#[derive(Debug, Clone, Copy)]
pub struct PermissionGate {
    owner_id: Option<UserId>,
}

impl PermissionGate {
    pub fn new(owner_id: Option<UserId>) -> Self {
        Self { owner_id }
    }

    fn is_owner(&self, id: UserId) -> bool {
        self.owner_id == Some(id)
    }

    pub fn check(&self, caller: &Caller<'_>, command: &CommandDescriptor) -> Decision {
        if command.owner_only && !self.is_owner(caller.id) {
            return Decision::Deny(DenyReason::OwnerOnly);
        }

        if !command.required_permissions.is_empty() {
            let Some(member) = caller.member else {
                return Decision::Deny(DenyReason::GuildOnly);
            };
            if self.is_owner(caller.id) {
                return Decision::Allow;
            }
            let missing = member.permissions.missing(&command.required_permissions);
            if !missing.is_empty() {
                return Decision::Deny(DenyReason::MissingPermissions(missing));
            }
        }

        Decision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Permission;

    const OWNER: UserId = UserId(1);
    const OTHER: UserId = UserId(2);

    fn gate() -> PermissionGate {
        PermissionGate::new(Some(OWNER))
    }

    fn member(perms: &[Permission]) -> Member {
        Member::with_permissions(perms.iter().copied().collect())
    }

    #[test]
    fn test_open_command_is_allowed_everywhere() {
        let cmd = CommandDescriptor::new("ping", "Pong!");
        assert_eq!(gate().check(&Caller { id: OTHER, member: None }, &cmd), Decision::Allow);
    }

    #[test]
    fn test_owner_only_denies_others() {
        let cmd = CommandDescriptor::new("admin", "Admin").owner_only();
        let m = member(&[Permission::Administrator]);
        assert_eq!(
            gate().check(&Caller { id: OTHER, member: Some(&m) }, &cmd),
            Decision::Deny(DenyReason::OwnerOnly)
        );
        assert!(gate().check(&Caller { id: OWNER, member: None }, &cmd).is_allowed());
    }

    #[test]
    fn test_owner_only_without_configured_owner_denies_everyone() {
        let cmd = CommandDescriptor::new("admin", "Admin").owner_only();
        let decision = PermissionGate::new(None).check(&Caller { id: OWNER, member: None }, &cmd);
        assert_eq!(decision, Decision::Deny(DenyReason::OwnerOnly));
    }

    #[test]
    fn test_permission_commands_are_guild_only_even_for_owner() {
        let cmd = CommandDescriptor::new("kick", "Kick").with_permission(Permission::KickMembers);
        assert_eq!(
            gate().check(&Caller { id: OWNER, member: None }, &cmd),
            Decision::Deny(DenyReason::GuildOnly)
        );
    }

    #[test]
    fn test_owner_bypasses_permission_checks() {
        let cmd = CommandDescriptor::new("kick", "Kick").with_permission(Permission::KickMembers);
        let m = member(&[]);
        assert!(gate().check(&Caller { id: OWNER, member: Some(&m) }, &cmd).is_allowed());
    }

    #[test]
    fn test_missing_permissions_are_reported() {
        let cmd = CommandDescriptor::new("ban", "Ban")
            .with_permission(Permission::BanMembers)
            .with_permission(Permission::KickMembers);
        let m = member(&[Permission::KickMembers]);
        let decision = gate().check(&Caller { id: OTHER, member: Some(&m) }, &cmd);
        let expected: PermissionSet = [Permission::BanMembers].into_iter().collect();
        assert_eq!(decision, Decision::Deny(DenyReason::MissingPermissions(expected)));

        let full = member(&[Permission::KickMembers, Permission::BanMembers]);
        assert!(gate().check(&Caller { id: OTHER, member: Some(&full) }, &cmd).is_allowed());
    }

    #[test]
    fn test_deny_reason_codes() {
        assert_eq!(DenyReason::OwnerOnly.code(), "owner-only");
        assert_eq!(DenyReason::GuildOnly.to_string(), "guild-only");
        let missing: PermissionSet = [Permission::BanMembers].into_iter().collect();
        assert_eq!(
            DenyReason::MissingPermissions(missing).to_string(),
            "missing-permissions (ban-members)"
        );
    }
}
