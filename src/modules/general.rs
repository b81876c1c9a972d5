//! General commands: ping and help

use chrono::Utc;

use crate::application::compose::{CommandDefinition, ModuleContribution};
use crate::application::handler::{HandlerContext, HandlerResult};
use crate::domain::entities::{CommandDescriptor, OptionValue};
use crate::modules::{Module, ModuleEnv};

pub struct GeneralModule;

impl Module for GeneralModule {
    fn name(&self) -> &str {
        "general"
    }

    fn description(&self) -> &str {
        "Liveness check and command listing"
    }

    fn contribute(&self, _env: &ModuleEnv) -> ModuleContribution {
        ModuleContribution::new()
            .command(
                CommandDefinition::new(CommandDescriptor::new("ping", "Check that the bot is alive"))
                    .with_handler(ping),
            )
            .command(
                CommandDefinition::new(CommandDescriptor::new("help", "List the available commands"))
                    .with_handler(help),
            )
    }
}

async fn ping(ctx: HandlerContext, _options: Vec<OptionValue>) -> HandlerResult {
    let latency = Utc::now() - ctx.interaction.received_at;
    ctx.reply(format!("Pong! ({} ms)", latency.num_milliseconds().max(0))).await
}

async fn help(ctx: HandlerContext, _options: Vec<OptionValue>) -> HandlerResult {
    let scope = ctx.interaction.scope();
    let mut lines = vec!["Available commands:".to_string()];

    for command in ctx.commands.visible(scope) {
        let descriptor = &command.descriptor;
        let mut line = format!("/{} - {}", descriptor.name, descriptor.description);
        let subcommands: Vec<&str> = descriptor.subcommand_names().collect();
        if !subcommands.is_empty() {
            line.push_str(&format!(" [{}]", subcommands.join(", ")));
        }
        if descriptor.owner_only {
            line.push_str(" (owner)");
        }
        lines.push(line);
    }

    ctx.reply_ephemeral(lines.join("\n")).await
}
