//! Feature modules - each contributes commands, event handlers and jobs

pub mod admin;
pub mod general;
pub mod moderation;
pub mod modlog;
pub mod quotes;
pub mod stats;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::application::compose::{compose, ComposedState, ModuleContribution};
use crate::application::errors::ConfigError;
use crate::application::events::EventBus;
use crate::domain::entities::{GuildId, UserId};
use crate::domain::traits::Store;
use crate::infrastructure::config::Config;

/// Core trait every feature module implements
pub trait Module: Send + Sync {
    /// Unique identifier for the module
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str {
        ""
    }

    /// Build this module's commands, handlers and jobs
    fn contribute(&self, env: &ModuleEnv) -> ModuleContribution;
}

/// Shared services handed to modules when they contribute
#[derive(Clone)]
pub struct ModuleEnv {
    pub bus: EventBus,
    pub store: Arc<dyn Store>,
    pub owner_id: Option<UserId>,
    pub started_at: DateTime<Utc>,
}

impl ModuleEnv {
    pub fn new(bus: EventBus, store: Arc<dyn Store>) -> Self {
        Self {
            bus,
            store,
            owner_id: None,
            started_at: Utc::now(),
        }
    }

    pub fn with_owner(mut self, owner_id: Option<UserId>) -> Self {
        self.owner_id = owner_id;
        self
    }
}

/// Summary of a registered module
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub name: String,
    pub description: String,
}

/// Ordered set of modules; order decides composition order
#[derive(Default)]
pub struct ModuleSet {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, refusing a second module with the same name
    pub fn register<M: Module + 'static>(&mut self, module: M) -> Result<(), ConfigError> {
        let name = module.name().to_string();
        if self.has_module(&name) {
            return Err(ConfigError::DuplicateModule(name));
        }

        info!("Registering module: {}", name);
        self.modules.push(Arc::new(module));
        Ok(())
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m.name() == name)
    }

    pub fn list_modules(&self) -> Vec<ModuleInfo> {
        self.modules
            .iter()
            .map(|m| ModuleInfo {
                name: m.name().to_string(),
                description: m.description().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Collect every contribution and merge them
    pub fn compose(&self, env: &ModuleEnv, guilds: &[GuildId]) -> Result<ComposedState, ConfigError> {
        let contributions = self.modules.iter().map(|m| m.contribute(env)).collect();
        compose(contributions, guilds)
    }
}

/// The built-in modules, minus those disabled in config
pub fn builtin_modules(config: &Config) -> Result<ModuleSet, ConfigError> {
    let mut set = ModuleSet::new();

    macro_rules! enable {
        ($module:expr) => {{
            let module = $module;
            if config.is_module_enabled(Module::name(&module)) {
                set.register(module)?;
            } else {
                info!("Module disabled by config: {}", Module::name(&module));
            }
        }};
    }

    enable!(general::GeneralModule);
    enable!(quotes::QuotesModule);
    enable!(moderation::ModerationModule);
    enable!(modlog::ModlogModule);
    enable!(stats::StatsModule::default());
    enable!(admin::AdminModule);

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::MemoryStore;

    fn env() -> ModuleEnv {
        ModuleEnv::new(EventBus::default(), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_duplicate_module_names_are_refused() {
        let mut set = ModuleSet::new();
        set.register(general::GeneralModule).unwrap();
        assert_eq!(
            set.register(general::GeneralModule),
            Err(ConfigError::DuplicateModule("general".to_string()))
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_builtins_compose_without_conflicts() {
        let set = builtin_modules(&Config::default()).unwrap();
        assert_eq!(set.len(), 6);
        let state = set.compose(&env(), &[GuildId(1)]).unwrap();
        let names: Vec<&str> = state.commands().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["ping", "help", "quote", "warn", "kick", "admin"]);
    }

    #[test]
    fn test_disabled_modules_are_skipped() {
        let mut config = Config::default();
        config.modules.disabled = vec!["quotes".to_string(), "admin".to_string()];
        let set = builtin_modules(&config).unwrap();
        assert!(!set.has_module("quotes"));
        assert!(!set.has_module("admin"));
        assert!(set.has_module("general"));
    }
}
