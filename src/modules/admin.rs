//! Owner-only administration

use chrono::{DateTime, Utc};

use crate::application::compose::{CommandDefinition, ModuleContribution};
use crate::application::handler::{HandlerContext, HandlerResult};
use crate::domain::entities::{CommandDescriptor, CommandOption, UserId};
use crate::modules::{Module, ModuleEnv};

pub struct AdminModule;

impl Module for AdminModule {
    fn name(&self) -> &str {
        "admin"
    }

    fn description(&self) -> &str {
        "Bot owner tools"
    }

    fn contribute(&self, env: &ModuleEnv) -> ModuleContribution {
        let descriptor = CommandDescriptor::new("admin", "Bot owner tools")
            .owner_only()
            .with_option(CommandOption::subcommand("status", "Uptime and composed state"))
            .with_option(CommandOption::subcommand("jobs", "List scheduled jobs"));
        let (started_at, owner) = (env.started_at, env.owner_id);

        ModuleContribution::new().command(
            CommandDefinition::new(descriptor)
                .with_subcommand("status", move |ctx, _options| status(ctx, started_at, owner))
                .with_subcommand("jobs", |ctx, _options| jobs(ctx)),
        )
    }
}

fn uptime(since: DateTime<Utc>) -> String {
    let secs = (Utc::now() - since).num_seconds().max(0);
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

async fn status(ctx: HandlerContext, started_at: DateTime<Utc>, owner: Option<UserId>) -> HandlerResult {
    let state = &ctx.commands;
    let owner = owner.map(|id| format!("<@{}>", id)).unwrap_or_else(|| "unset".to_string());
    let report = format!(
        "Uptime: {}\nOwner: {}\nCommands: {}\nConfigured guilds: {}\nJobs: {}",
        uptime(started_at),
        owner,
        state.commands().len(),
        state.guilds().len(),
        state.jobs().len()
    );
    ctx.reply_ephemeral(report).await
}

async fn jobs(ctx: HandlerContext) -> HandlerResult {
    let jobs = ctx.commands.jobs();
    if jobs.is_empty() {
        return ctx.reply_ephemeral("No scheduled jobs.").await;
    }
    let lines: Vec<String> = jobs
        .iter()
        .map(|job| format!("{} every {:?}", job.name, job.interval))
        .collect();
    ctx.reply_ephemeral(lines.join("\n")).await
}
