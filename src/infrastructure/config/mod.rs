//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::domain::entities::{GuildId, UserId};

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub platform: PlatformConfig,
    pub sync: SyncConfig,
    #[serde(default)]
    pub modules: ModulesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
    pub owner_id: Option<UserId>,
    /// Where handler data is snapshotted; in memory only when unset
    pub data_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformConfig {
    pub application_id: Option<u64>,
    pub token: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SyncConfig {
    /// Guild scopes kept in sync besides the global scope
    pub guilds: Vec<GuildId>,
    pub on_ready: bool,
    pub interval_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModulesConfig {
    pub disabled: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "sentinel-bot".to_string(),
                prefix: "/".to_string(),
                owner_id: None,
                data_path: Some(PathBuf::from("data/store.json")),
            },
            platform: PlatformConfig {
                application_id: None,
                token: None,
                api_base: None,
            },
            sync: SyncConfig {
                guilds: Vec::new(),
                on_ready: true,
                interval_seconds: None,
            },
            modules: ModulesConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Environment variables override file values
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            self.platform.token = Some(token);
        }

        if let Ok(id) = std::env::var("BOT_APPLICATION_ID") {
            let id = id
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("BOT_APPLICATION_ID '{}'", id)))?;
            self.platform.application_id = Some(id);
        }

        if let Ok(id) = std::env::var("BOT_OWNER_ID") {
            let id = id
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("BOT_OWNER_ID '{}'", id)))?;
            self.bot.owner_id = Some(id);
        }

        if let Ok(guilds) = std::env::var("BOT_GUILDS") {
            self.sync.guilds = parse_guilds(&guilds)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.trim().is_empty() {
            return Err(ConfigError::MissingField("bot.prefix".to_string()));
        }
        if self.sync.interval_seconds == Some(0) {
            return Err(ConfigError::InvalidValue("sync.interval-seconds must be positive".to_string()));
        }
        if self.platform.token.is_some() && self.platform.application_id.is_none() {
            return Err(ConfigError::MissingField("platform.application-id".to_string()));
        }
        Ok(())
    }

    pub fn sync_interval(&self) -> Option<Duration> {
        self.sync.interval_seconds.map(Duration::from_secs)
    }

    pub fn is_module_enabled(&self, name: &str) -> bool {
        !self.modules.disabled.iter().any(|m| m == name)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Parse a comma separated guild id list
pub fn parse_guilds(list: &str) -> Result<Vec<GuildId>, ConfigError> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| ConfigError::InvalidValue(format!("guild id '{}'", s.trim())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_yaml_with_kebab_case_keys() {
        let yaml = r#"
bot:
  name: test-bot
  prefix: "/"
  owner-id: 42
platform:
  application-id: 7
  token: secret
sync:
  guilds: [100, 200]
  on-ready: true
  interval-seconds: 300
modules:
  disabled: [quotes]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.bot.owner_id, Some(UserId(42)));
        assert_eq!(config.sync.guilds, vec![GuildId(100), GuildId(200)]);
        assert_eq!(config.sync_interval(), Some(Duration::from_secs(300)));
        assert!(!config.is_module_enabled("quotes"));
        assert!(config.is_module_enabled("core"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_modules_section_is_optional() {
        let yaml = r#"
bot: { name: b, prefix: "/", owner-id: null, data-path: null }
platform: { application-id: null, token: null, api-base: null }
sync: { guilds: [], on-ready: false, interval-seconds: null }
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.modules.disabled.is_empty());
    }

    #[test]
    fn test_token_requires_application_id() {
        let mut config = Config::default();
        config.platform.token = Some("t".to_string());
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingField("platform.application-id".to_string()))
        );
    }

    #[test]
    fn test_default_config_round_trips_through_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.bot.name, "sentinel-bot");
        assert!(config.sync.on_ready);
    }

    #[test]
    fn test_guild_lists() {
        assert_eq!(parse_guilds("1, 2,").unwrap(), vec![GuildId(1), GuildId(2)]);
        assert!(parse_guilds("1,x").is_err());
    }
}
