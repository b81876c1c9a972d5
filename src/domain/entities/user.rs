use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::permission::PermissionSet;

/// Platform user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(UserId)
    }
}

/// Represents a user invoking a command
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub id: UserId,
    pub username: Option<String>,
    pub is_bot: bool,
}

impl User {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            username: None,
            is_bot: false,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) => username.clone(),
            None => self.id.to_string(),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Guild membership of the caller. Only present in guild contexts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Member {
    /// Effective permissions in the channel the interaction came from
    pub permissions: PermissionSet,
    pub nick: Option<String>,
}

impl Member {
    pub fn with_permissions(permissions: PermissionSet) -> Self {
        Self {
            permissions,
            nick: None,
        }
    }
}
