use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a guild (an isolated community on the platform)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GuildId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(GuildId)
    }
}

/// Where a set of commands is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Global,
    Guild(GuildId),
}

impl Scope {
    pub fn guild_id(&self) -> Option<GuildId> {
        match self {
            Scope::Global => None,
            Scope::Guild(id) => Some(*id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Guild(id) => write!(f, "guild:{}", id),
        }
    }
}

/// The scope(s) a command descriptor is meant to be registered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeTarget {
    #[default]
    Global,
    /// Every guild listed in the sync configuration
    ConfiguredGuilds,
    Guild(GuildId),
}

impl ScopeTarget {
    /// Expand into concrete scopes given the configured guild list
    pub fn resolve(&self, configured: &[GuildId]) -> Vec<Scope> {
        match self {
            ScopeTarget::Global => vec![Scope::Global],
            ScopeTarget::ConfiguredGuilds => configured.iter().map(|g| Scope::Guild(*g)).collect(),
            ScopeTarget::Guild(id) => vec![Scope::Guild(*id)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_guilds_expand_to_each_guild() {
        let guilds = [GuildId(1), GuildId(2)];
        assert_eq!(
            ScopeTarget::ConfiguredGuilds.resolve(&guilds),
            vec![Scope::Guild(GuildId(1)), Scope::Guild(GuildId(2))]
        );
        assert_eq!(ScopeTarget::Global.resolve(&guilds), vec![Scope::Global]);
        assert!(ScopeTarget::ConfiguredGuilds.resolve(&[]).is_empty());
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::Global.to_string(), "global");
        assert_eq!(Scope::Guild(GuildId(42)).to_string(), "guild:42");
    }
}
