use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use sentinel_bot::application::compose::ComposedState;
use sentinel_bot::application::errors::{BotError, ConfigError};
use sentinel_bot::application::events::EventBus;
use sentinel_bot::application::gate::PermissionGate;
use sentinel_bot::application::messaging::InteractionDispatcher;
use sentinel_bot::application::scheduler::spawn_jobs;
use sentinel_bot::application::services::BotService;
use sentinel_bot::application::sync::Synchronizer;
use sentinel_bot::domain::entities::{GuildId, Member, PermissionSet, User, UserId};
use sentinel_bot::domain::traits::{CommandRegistry, Store};
use sentinel_bot::infrastructure::adapters::console::{ConsoleAdapter, ConsoleResponder, ConsoleSession};
use sentinel_bot::infrastructure::config::Config;
use sentinel_bot::infrastructure::registry::{HttpRegistry, MemoryRegistry};
use sentinel_bot::infrastructure::storage::MemoryStore;
use sentinel_bot::modules::{builtin_modules, ModuleEnv};

#[derive(Parser)]
#[command(name = "sentinel-bot")]
#[command(about = "Slash-command control plane for a chat bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync commands, then serve interactions typed on the console
    Run {
        /// Simulate a guild; without it input arrives as a direct message
        #[arg(long)]
        guild: Option<u64>,
        /// Simulated caller id
        #[arg(long, default_value_t = 1)]
        user: u64,
        /// Caller permissions in the guild, e.g. kick-members,moderate-members
        #[arg(long)]
        permissions: Option<String>,
    },
    /// Run one synchronization pass and print the report
    Sync {
        /// Only show what would change
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the desired command set per scope as JSON
    Commands,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> Result<(), BotError> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("sentinel-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
        command => {
            let config = load_config(&cli.config, cli.token)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async move {
                match command {
                    Commands::Run { guild, user, permissions } => {
                        run_bot(config, guild.map(GuildId), UserId(user), permissions).await
                    }
                    Commands::Sync { dry_run } => sync_once(config, dry_run).await,
                    Commands::Commands => print_commands(config).await,
                    Commands::Version | Commands::InitConfig => Ok(()),
                }
            })
        }
    }
}

fn load_config(path: &str, token_override: Option<String>) -> Result<Config, ConfigError> {
    let mut config = if Path::new(path).exists() {
        Config::load(path)?
    } else {
        tracing::info!("No config at {}, using defaults and environment", path);
        Config::load_env()?
    };

    if let Some(token) = token_override {
        config.platform.token = Some(token);
        config.validate()?;
    }
    Ok(config)
}

/// Everything built from config before the gateway starts
struct Bot {
    commands: Arc<ComposedState>,
    synchronizer: Arc<Synchronizer>,
    bus: EventBus,
}

async fn build(config: &Config, extra_guild: Option<GuildId>) -> Result<Bot, BotError> {
    let store: Arc<dyn Store> = match &config.bot.data_path {
        Some(path) => Arc::new(MemoryStore::open(path).await?),
        None => Arc::new(MemoryStore::new()),
    };
    let bus = EventBus::default();
    let env = ModuleEnv::new(bus.clone(), store).with_owner(config.bot.owner_id);

    let mut guilds = config.sync.guilds.clone();
    if let Some(guild) = extra_guild.filter(|g| !guilds.contains(g)) {
        tracing::info!("Adding console guild {} to the synced scopes", guild);
        guilds.push(guild);
    }

    let modules = builtin_modules(config)?;
    for module in modules.list_modules() {
        tracing::debug!("Module {}: {}", module.name, module.description);
    }
    let commands = Arc::new(modules.compose(&env, &guilds)?);
    tracing::info!(
        "Composed {} commands from {} modules",
        commands.commands().len(),
        modules.len()
    );

    let registry: Arc<dyn CommandRegistry> = match (&config.platform.token, config.platform.application_id) {
        (Some(token), Some(application_id)) => {
            let mut registry = HttpRegistry::new(token.clone(), application_id);
            if let Some(base) = &config.platform.api_base {
                registry = registry.with_api_base(base.clone());
            }
            Arc::new(registry)
        }
        _ => {
            tracing::warn!("No platform credentials configured, using an in-memory registry");
            Arc::new(MemoryRegistry::new())
        }
    };

    Ok(Bot {
        commands,
        synchronizer: Arc::new(Synchronizer::new(registry)),
        bus,
    })
}

async fn run_bot(
    config: Config,
    guild: Option<GuildId>,
    user: UserId,
    permissions: Option<String>,
) -> Result<(), BotError> {
    tracing::info!("Starting sentinel-bot: {}", config.bot.name);

    let member_permissions = match permissions {
        Some(list) => PermissionSet::parse_list(&list).map_err(ConfigError::InvalidValue)?,
        None => PermissionSet::new(),
    };

    let bot = build(&config, guild).await?;
    let dispatcher = Arc::new(InteractionDispatcher::new(
        bot.commands.clone(),
        PermissionGate::new(config.bot.owner_id),
        Arc::new(ConsoleResponder),
    ));
    let service = BotService::new(bot.commands.clone(), dispatcher, bot.synchronizer, bot.bus)
        .with_sync_on_ready(config.sync.on_ready);

    let mut background = spawn_jobs(bot.commands.jobs());
    if let Some(every) = config.sync_interval() {
        background.push(service.start_periodic_sync(every));
    }

    let session = ConsoleSession {
        user: User::new(user).with_username("console-user"),
        guild: guild.map(|id| (id, Member::with_permissions(member_permissions))),
    };
    let result = ConsoleAdapter::new(&config.bot.prefix, session).run(&service).await;

    for task in background {
        task.abort();
    }
    tracing::info!("Bot stopped");
    result
}

async fn sync_once(config: Config, dry_run: bool) -> Result<(), BotError> {
    let bot = build(&config, None).await?;
    let desired = bot.commands.desired();

    if !dry_run {
        let report = bot.synchronizer.synchronize(&desired).await;
        let rendered = serde_json::to_string_pretty(&report).map_err(|e| BotError::Parse(e.to_string()))?;
        println!("{}", rendered);
        if !report.is_clean() {
            tracing::warn!("Sync finished with errors");
        }
        return Ok(());
    }

    for (scope, descriptors) in &desired {
        match bot.synchronizer.preview(*scope, descriptors).await {
            Ok(actions) => {
                println!("[{}]", scope);
                for action in actions {
                    println!("  {:<9} /{}", action.verb(), action.name());
                }
            }
            Err(e) => println!("[{}] cannot list registered commands: {}", scope, e),
        }
    }
    Ok(())
}

async fn print_commands(config: Config) -> Result<(), BotError> {
    let bot = build(&config, None).await?;

    let desired: BTreeMap<String, Vec<serde_json::Value>> = bot
        .commands
        .desired()
        .into_iter()
        .map(|(scope, descriptors)| {
            let rendered = descriptors
                .iter()
                .map(|d| {
                    json!({
                        "name": d.name,
                        "description": d.description,
                        "options": d.options,
                        "default_permission": d.default_permission(),
                        "required_permissions": d.required_permissions,
                        "owner_only": d.owner_only,
                    })
                })
                .collect();
            (scope.to_string(), rendered)
        })
        .collect();

    let rendered = serde_json::to_string_pretty(&desired).map_err(|e| BotError::Parse(e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}

fn init_config() -> Result<(), BotError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
