//! Moderation commands. Actions are recorded and announced on the bus;
//! modlog and other listeners take it from there.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::application::compose::{CommandDefinition, ModuleContribution};
use crate::application::errors::{HandlerError, StorageError};
use crate::application::events::{DomainEvent, EventBus, ModerationKind};
use crate::application::handler::{HandlerContext, HandlerResult};
use crate::domain::entities::{
    CommandDescriptor, CommandOption, GuildId, OptionValue, OptionsExt, Permission, UserId,
};
use crate::domain::traits::Store;
use crate::modules::{Module, ModuleEnv};

#[derive(Debug, Serialize, Deserialize)]
struct CaseRecord {
    kind: String,
    moderator: UserId,
    target: UserId,
    reason: Option<String>,
    at: chrono::DateTime<Utc>,
}

pub struct ModerationModule;

impl Module for ModerationModule {
    fn name(&self) -> &str {
        "moderation"
    }

    fn description(&self) -> &str {
        "Warn and kick members"
    }

    fn contribute(&self, env: &ModuleEnv) -> ModuleContribution {
        let warn = CommandDescriptor::new("warn", "Warn a member")
            .with_permission(Permission::ModerateMembers)
            .with_option(CommandOption::user("user", "Member to warn").required())
            .with_option(CommandOption::string("reason", "Why"));
        let kick = CommandDescriptor::new("kick", "Kick a member from the guild")
            .with_permission(Permission::KickMembers)
            .with_option(CommandOption::user("user", "Member to kick").required())
            .with_option(CommandOption::string("reason", "Why"));

        let (warn_store, warn_bus) = (env.store.clone(), env.bus.clone());
        let (kick_store, kick_bus) = (env.store.clone(), env.bus.clone());

        ModuleContribution::new()
            .command(
                CommandDefinition::new(warn)
                    .with_before(not_self)
                    .with_handler(move |ctx, options| {
                        moderate(ctx, options, ModerationKind::Warn, warn_store.clone(), warn_bus.clone())
                    }),
            )
            .command(
                CommandDefinition::new(kick)
                    .with_before(not_self)
                    .with_handler(move |ctx, options| {
                        moderate(ctx, options, ModerationKind::Kick, kick_store.clone(), kick_bus.clone())
                    }),
            )
    }
}

/// Accepts a raw id or a `<@id>` / `<@!id>` mention
fn parse_target(raw: &str) -> Option<UserId> {
    raw.trim()
        .trim_start_matches("<@")
        .trim_start_matches('!')
        .trim_end_matches('>')
        .parse()
        .ok()
}

fn target(options: &[OptionValue]) -> Result<UserId, HandlerError> {
    if let Some(id) = options.option_str("user").and_then(parse_target) {
        return Ok(id);
    }
    match options.option_i64("user") {
        Some(id) if id > 0 => Ok(UserId(id as u64)),
        _ => Err(HandlerError::Rejected("Name a member, e.g. user:<@123>.".to_string())),
    }
}

async fn not_self(ctx: HandlerContext) -> HandlerResult {
    let target = target(&ctx.interaction.options)?;
    if target == ctx.interaction.user.id {
        return Err(HandlerError::Rejected("You cannot moderate yourself.".to_string()));
    }
    Ok(())
}

async fn moderate(
    ctx: HandlerContext,
    options: Vec<OptionValue>,
    kind: ModerationKind,
    store: Arc<dyn Store>,
    bus: EventBus,
) -> HandlerResult {
    let guild_id: GuildId = ctx
        .interaction
        .guild_id
        .ok_or_else(|| HandlerError::Rejected("This only works inside a guild.".to_string()))?;
    let target = target(&options)?;
    let reason = options.option_str("reason").map(str::to_string);

    let record = CaseRecord {
        kind: kind.to_string(),
        moderator: ctx.interaction.user.id,
        target,
        reason: reason.clone(),
        at: Utc::now(),
    };
    let key = format!(
        "case:{}:{}:{}-{}",
        guild_id,
        target,
        record.at.timestamp_millis(),
        &uuid::Uuid::new_v4().simple().to_string()[..8]
    );
    let raw = serde_json::to_string(&record)
        .map_err(|e| HandlerError::Storage(StorageError::Serialization(e.to_string())))?;
    store.set(&key, &raw).await?;

    let cases = store.scan(&format!("case:{}:{}:", guild_id, target)).await?.len();

    bus.publish(DomainEvent::ModerationAction {
        guild_id,
        moderator: record.moderator,
        target,
        kind,
        reason: reason.clone(),
    });

    let verb = match kind {
        ModerationKind::Warn => "warned",
        ModerationKind::Kick => "kicked",
    };
    let because = reason.map(|r| format!(": {}", r)).unwrap_or_default();
    ctx.reply(format!("<@{}> was {}{} (case #{})", target, verb, because, cases)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::application::compose::compose;
    use crate::application::errors::BotError;
    use crate::domain::entities::{Interaction, Member, OptionKind, PermissionSet, User};
    use crate::domain::traits::{Responder, Response};
    use crate::infrastructure::storage::MemoryStore;

    #[derive(Default)]
    struct Replies(Mutex<Vec<String>>);

    #[async_trait]
    impl Responder for Replies {
        async fn respond(&self, _interaction: &Interaction, response: Response) -> Result<(), BotError> {
            self.0.lock().unwrap().push(response.content);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_back_to_back_cases_are_all_kept() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let replies = Arc::new(Replies::default());
        let commands = Arc::new(compose(vec![], &[]).unwrap());
        let options = vec![OptionValue::leaf("user", OptionKind::User, "4")];
        let interaction = Arc::new(
            Interaction::new(User::new(UserId(3)), "warn")
                .in_guild(GuildId(10), Member::with_permissions(PermissionSet::new()))
                .with_options(options.clone()),
        );

        for _ in 0..2 {
            let ctx = HandlerContext {
                interaction: interaction.clone(),
                responder: replies.clone(),
                commands: commands.clone(),
                subcommand: None,
            };
            moderate(ctx, options.clone(), ModerationKind::Warn, store.clone(), EventBus::default())
                .await
                .unwrap();
        }

        assert_eq!(store.scan("case:10:4:").await.unwrap().len(), 2);
        let replies = replies.0.lock().unwrap();
        assert!(replies[0].ends_with("(case #1)"));
        assert!(replies[1].ends_with("(case #2)"));
    }

    #[test]
    fn test_targets_accept_mentions_and_ids() {
        assert_eq!(parse_target("<@42>"), Some(UserId(42)));
        assert_eq!(parse_target("<@!42>"), Some(UserId(42)));
        assert_eq!(parse_target("42"), Some(UserId(42)));
        assert_eq!(parse_target("someone"), None);
    }
}
