//! Module composer - merges feature module contributions into one command set

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::application::errors::ConfigError;
use crate::application::handler::{
    before_hook, command_handler, event_handler, BeforeHook, CommandHandler, EventHandler,
    HandlerContext, HandlerResult, JobSpec,
};
use crate::domain::entities::{
    CommandDescriptor, EventKind, GatewayEvent, GuildId, OptionValue, Scope,
};

/// A command descriptor together with the functions that serve it
#[derive(Clone)]
pub struct CommandDefinition {
    pub descriptor: CommandDescriptor,
    /// Serves the command itself, or any subcommand without its own handler
    pub handler: Option<CommandHandler>,
    pub subcommand_handlers: HashMap<String, CommandHandler>,
    pub before_execute: Option<BeforeHook>,
}

impl CommandDefinition {
    pub fn new(descriptor: CommandDescriptor) -> Self {
        Self {
            descriptor,
            handler: None,
            subcommand_handlers: HashMap::new(),
            before_execute: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn with_handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HandlerContext, Vec<OptionValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handler = Some(command_handler(f));
        self
    }

    pub fn with_subcommand<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(HandlerContext, Vec<OptionValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.subcommand_handlers.insert(name.into(), command_handler(f));
        self
    }

    pub fn with_before<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.before_execute = Some(before_hook(f));
        self
    }

    /// Handler serving the given subcommand, falling back to the top-level handler
    pub fn handler_for(&self, subcommand: Option<&str>) -> Option<&CommandHandler> {
        subcommand
            .and_then(|name| self.subcommand_handlers.get(name))
            .or(self.handler.as_ref())
    }

    fn check(&self) -> Result<(), ConfigError> {
        self.descriptor.validate()?;
        let name = self.descriptor.name.clone();

        for subcommand in self.subcommand_handlers.keys() {
            if self.descriptor.subcommand(subcommand).is_none() {
                return Err(ConfigError::UnknownSubcommandHandler {
                    name,
                    subcommand: subcommand.clone(),
                });
            }
        }

        if self.descriptor.has_subcommands() {
            if let Some(sub) = self
                .descriptor
                .subcommand_names()
                .find(|sub| self.handler_for(Some(*sub)).is_none())
            {
                return Err(ConfigError::MissingHandler {
                    path: format!("subcommand '{}'", sub),
                    name,
                });
            }
        } else if self.handler.is_none() {
            return Err(ConfigError::MissingHandler {
                name,
                path: "the command".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut subcommands: Vec<&String> = self.subcommand_handlers.keys().collect();
        subcommands.sort();
        f.debug_struct("CommandDefinition")
            .field("descriptor", &self.descriptor)
            .field("has_handler", &self.handler.is_some())
            .field("subcommand_handlers", &subcommands)
            .field("has_before_execute", &self.before_execute.is_some())
            .finish()
    }
}

/// Everything one feature module contributes
#[derive(Clone, Default)]
pub struct ModuleContribution {
    pub commands: Vec<CommandDefinition>,
    pub handlers: HashMap<EventKind, Vec<EventHandler>>,
    pub jobs: Vec<JobSpec>,
}

impl ModuleContribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, command: CommandDefinition) -> Self {
        self.commands.push(command);
        self
    }

    pub fn on<F, Fut>(mut self, kind: EventKind, f: F) -> Self
    where
        F: Fn(GatewayEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handlers.entry(kind).or_default().push(event_handler(f));
        self
    }

    pub fn job(mut self, job: JobSpec) -> Self {
        self.jobs.push(job);
        self
    }
}

/// The merged, read-only result of composition
pub struct ComposedState {
    commands: Vec<Arc<CommandDefinition>>,
    handlers: HashMap<EventKind, Vec<EventHandler>>,
    jobs: Vec<JobSpec>,
    guilds: Vec<GuildId>,
    index: HashMap<Scope, HashMap<String, Arc<CommandDefinition>>>,
}

/// Merge module contributions in input order.
///
/// Commands are concatenated and must have unique names within every scope
/// they resolve to. Event handlers for the same event are concatenated in
/// module order; no module can replace another's handlers.
pub fn compose(
    modules: Vec<ModuleContribution>,
    guilds: &[GuildId],
) -> Result<ComposedState, ConfigError> {
    let mut configured: Vec<GuildId> = Vec::with_capacity(guilds.len());
    for guild in guilds {
        if !configured.contains(guild) {
            configured.push(*guild);
        }
    }

    let mut commands = Vec::new();
    let mut handlers: HashMap<EventKind, Vec<EventHandler>> = HashMap::new();
    let mut jobs = Vec::new();
    let mut index: HashMap<Scope, HashMap<String, Arc<CommandDefinition>>> = HashMap::new();

    for module in modules {
        for command in module.commands {
            command.check()?;
            let command = Arc::new(command);

            let scopes = command.descriptor.target.resolve(&configured);
            if scopes.is_empty() {
                warn!(
                    "Command /{} targets configured guilds but none are configured, it will not be synced",
                    command.name()
                );
            }
            for scope in scopes {
                let names = index.entry(scope).or_default();
                if names.contains_key(command.name()) {
                    return Err(ConfigError::DuplicateCommandName {
                        name: command.name().to_string(),
                        scope,
                    });
                }
                names.insert(command.name().to_string(), command.clone());
            }
            commands.push(command);
        }

        for (kind, module_handlers) in module.handlers {
            handlers.entry(kind).or_default().extend(module_handlers);
        }
        jobs.extend(module.jobs);
    }

    Ok(ComposedState {
        commands,
        handlers,
        jobs,
        guilds: configured,
        index,
    })
}

impl ComposedState {
    pub fn commands(&self) -> &[Arc<CommandDefinition>] {
        &self.commands
    }

    pub fn handlers(&self, kind: EventKind) -> &[EventHandler] {
        self.handlers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn jobs(&self) -> &[JobSpec] {
        &self.jobs
    }

    pub fn guilds(&self) -> &[GuildId] {
        &self.guilds
    }

    /// Desired registry state per scope.
    ///
    /// The global scope and every configured guild are always present, even
    /// when nothing targets them, so stale remote commands get removed.
    pub fn desired(&self) -> BTreeMap<Scope, Vec<CommandDescriptor>> {
        let mut desired: BTreeMap<Scope, Vec<CommandDescriptor>> = BTreeMap::new();
        desired.insert(Scope::Global, Vec::new());
        for guild in &self.guilds {
            desired.insert(Scope::Guild(*guild), Vec::new());
        }

        for command in &self.commands {
            for scope in command.descriptor.target.resolve(&self.guilds) {
                desired.entry(scope).or_default().push(command.descriptor.clone());
            }
        }
        desired
    }

    /// Find the command an interaction in `scope` refers to.
    /// Guild registrations shadow same-named global ones.
    pub fn lookup(&self, scope: Scope, name: &str) -> Option<Arc<CommandDefinition>> {
        let global = || self.index.get(&Scope::Global).and_then(|n| n.get(name));
        let found = match scope {
            Scope::Global => global(),
            Scope::Guild(_) => self.index.get(&scope).and_then(|n| n.get(name)).or_else(global),
        };
        found.cloned()
    }

    /// Commands reachable from `scope`, sorted by name
    pub fn visible(&self, scope: Scope) -> Vec<Arc<CommandDefinition>> {
        let mut by_name: BTreeMap<&str, Arc<CommandDefinition>> = BTreeMap::new();
        let scopes = match scope {
            Scope::Global => vec![Scope::Global],
            Scope::Guild(_) => vec![Scope::Global, scope],
        };
        for scope in scopes {
            if let Some(names) = self.index.get(&scope) {
                for (name, command) in names {
                    by_name.insert(name.as_str(), command.clone());
                }
            }
        }
        by_name.into_values().collect()
    }
}
