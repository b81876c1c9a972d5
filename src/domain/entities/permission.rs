//! Permission tokens a command can require from its caller

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Platform permissions a command may require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    /// Grants every other permission
    Administrator,
    ManageGuild,
    ManageRoles,
    ManageChannels,
    ManageMessages,
    KickMembers,
    BanMembers,
    ModerateMembers,
    MentionEveryone,
    ViewAuditLog,
    SendMessages,
}

impl Permission {
    pub const ALL: [Permission; 11] = [
        Permission::Administrator,
        Permission::ManageGuild,
        Permission::ManageRoles,
        Permission::ManageChannels,
        Permission::ManageMessages,
        Permission::KickMembers,
        Permission::BanMembers,
        Permission::ModerateMembers,
        Permission::MentionEveryone,
        Permission::ViewAuditLog,
        Permission::SendMessages,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Permission::Administrator => "administrator",
            Permission::ManageGuild => "manage-guild",
            Permission::ManageRoles => "manage-roles",
            Permission::ManageChannels => "manage-channels",
            Permission::ManageMessages => "manage-messages",
            Permission::KickMembers => "kick-members",
            Permission::BanMembers => "ban-members",
            Permission::ModerateMembers => "moderate-members",
            Permission::MentionEveryone => "mention-everyone",
            Permission::ViewAuditLog => "view-audit-log",
            Permission::SendMessages => "send-messages",
        }
    }

    /// Bit position in the platform's permission bitfield
    pub fn bit(&self) -> u64 {
        match self {
            Permission::KickMembers => 1 << 1,
            Permission::BanMembers => 1 << 2,
            Permission::Administrator => 1 << 3,
            Permission::ManageChannels => 1 << 4,
            Permission::ManageGuild => 1 << 5,
            Permission::ViewAuditLog => 1 << 7,
            Permission::SendMessages => 1 << 11,
            Permission::ManageMessages => 1 << 13,
            Permission::MentionEveryone => 1 << 17,
            Permission::ManageRoles => 1 << 28,
            Permission::ModerateMembers => 1 << 40,
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == token.trim())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of permissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a platform permission bitfield, ignoring bits we don't model
    pub fn from_bits(bits: u64) -> Self {
        Permission::ALL
            .into_iter()
            .filter(|p| bits & p.bit() != 0)
            .collect()
    }

    pub fn bits(&self) -> u64 {
        self.0.iter().fold(0, |acc, p| acc | p.bit())
    }

    /// Parse a comma separated list such as `ban-members,kick-members`
    pub fn parse_list(list: &str) -> Result<Self, String> {
        list.split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| Permission::parse(s).ok_or_else(|| format!("unknown permission '{}'", s.trim())))
            .collect()
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0.insert(permission);
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    /// Permissions of `required` not granted by this set.
    /// Administrator grants everything.
    pub fn missing(&self, required: &PermissionSet) -> PermissionSet {
        if self.contains(Permission::Administrator) {
            return PermissionSet::new();
        }
        PermissionSet(required.0.difference(&self.0).copied().collect())
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        PermissionSet(iter.into_iter().collect())
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|p| p.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitfield_round_trips_known_permissions() {
        let set: PermissionSet = [Permission::BanMembers, Permission::ModerateMembers].into_iter().collect();
        assert_eq!(PermissionSet::from_bits(set.bits()), set);
        // unknown bits are dropped
        assert_eq!(PermissionSet::from_bits(1 << 6), PermissionSet::new());
    }

    #[test]
    fn test_administrator_satisfies_everything() {
        let admin: PermissionSet = [Permission::Administrator].into_iter().collect();
        let required: PermissionSet = [Permission::BanMembers, Permission::ManageGuild].into_iter().collect();
        assert!(admin.missing(&required).is_empty());
    }

    #[test]
    fn test_missing_reports_difference() {
        let have: PermissionSet = [Permission::KickMembers].into_iter().collect();
        let required: PermissionSet = [Permission::KickMembers, Permission::BanMembers].into_iter().collect();
        let missing = have.missing(&required);
        assert_eq!(missing.len(), 1);
        assert!(missing.contains(Permission::BanMembers));
    }

    #[test]
    fn test_parse_list_rejects_unknown_tokens() {
        let set = PermissionSet::parse_list("ban-members, kick-members").unwrap();
        assert_eq!(set.len(), 2);
        assert!(PermissionSet::parse_list("ban-members,fly").is_err());
        assert!(PermissionSet::parse_list("").unwrap().is_empty());
    }
}
