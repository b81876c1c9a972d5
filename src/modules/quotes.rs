//! Quote book: `quote add | random | search`, kept per guild in the store

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::compose::{CommandDefinition, ModuleContribution};
use crate::application::errors::{HandlerError, StorageError};
use crate::application::events::{DomainEvent, EventBus};
use crate::application::handler::{HandlerContext, HandlerResult};
use crate::domain::entities::{
    CommandDescriptor, CommandOption, Interaction, OptionValue, OptionsExt, ScopeTarget, UserId,
};
use crate::domain::traits::Store;
use crate::modules::{Module, ModuleEnv};

const MAX_QUOTE_LEN: usize = 500;
const MAX_SEARCH_RESULTS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Quote {
    text: String,
    author: UserId,
    added_at: DateTime<Utc>,
}

pub struct QuotesModule;

impl Module for QuotesModule {
    fn name(&self) -> &str {
        "quotes"
    }

    fn description(&self) -> &str {
        "Per-guild quote book"
    }

    fn contribute(&self, env: &ModuleEnv) -> ModuleContribution {
        let descriptor = CommandDescriptor::new("quote", "Save and recall memorable quotes")
            .in_scope(ScopeTarget::ConfiguredGuilds)
            .with_option(
                CommandOption::subcommand("add", "Save a quote")
                    .with_option(CommandOption::string("text", "The quote").required()),
            )
            .with_option(CommandOption::subcommand("random", "Show a random quote"))
            .with_option(
                CommandOption::subcommand("search", "Find quotes containing a phrase")
                    .with_option(CommandOption::string("query", "Phrase to look for").required()),
            );

        let (add_store, bus) = (env.store.clone(), env.bus.clone());
        let random_store = env.store.clone();
        let search_store = env.store.clone();

        ModuleContribution::new().command(
            CommandDefinition::new(descriptor)
                .with_subcommand("add", move |ctx, options| {
                    add(ctx, options, add_store.clone(), bus.clone())
                })
                .with_subcommand("random", move |ctx, _options| random(ctx, random_store.clone()))
                .with_subcommand("search", move |ctx, options| {
                    search(ctx, options, search_store.clone())
                }),
        )
    }
}

/// Quotes are partitioned by guild; direct messages share one book
fn book_prefix(interaction: &Interaction) -> String {
    match interaction.guild_id {
        Some(guild) => format!("quote:{}:", guild),
        None => "quote:dm:".to_string(),
    }
}

async fn load_book(store: &dyn Store, prefix: &str) -> Result<Vec<(String, Quote)>, HandlerError> {
    store
        .scan(prefix)
        .await?
        .into_iter()
        .map(|(key, raw)| {
            serde_json::from_str(&raw)
                .map(|quote| (key, quote))
                .map_err(|e| HandlerError::Storage(StorageError::Serialization(e.to_string())))
        })
        .collect()
}

async fn add(ctx: HandlerContext, options: Vec<OptionValue>, store: Arc<dyn Store>, bus: EventBus) -> HandlerResult {
    let text = options
        .option_str("text")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| HandlerError::Rejected("Give me something to quote.".to_string()))?;
    if text.chars().count() > MAX_QUOTE_LEN {
        return Err(HandlerError::Rejected(format!(
            "Quotes are limited to {} characters.",
            MAX_QUOTE_LEN
        )));
    }

    let quote = Quote {
        text: text.to_string(),
        author: ctx.interaction.user.id,
        added_at: Utc::now(),
    };
    let key = format!(
        "{}{}-{}",
        book_prefix(&ctx.interaction),
        quote.added_at.timestamp_millis(),
        &uuid::Uuid::new_v4().simple().to_string()[..8]
    );
    let raw = serde_json::to_string(&quote)
        .map_err(|e| HandlerError::Storage(StorageError::Serialization(e.to_string())))?;
    store.set(&key, &raw).await?;
    debug!("Stored quote {}", key);

    bus.publish(DomainEvent::QuoteAdded {
        guild_id: ctx.interaction.guild_id,
        author: quote.author,
        key,
    });
    ctx.reply(format!("Saved: \"{}\"", quote.text)).await
}

async fn random(ctx: HandlerContext, store: Arc<dyn Store>) -> HandlerResult {
    let book = load_book(store.as_ref(), &book_prefix(&ctx.interaction)).await?;
    if book.is_empty() {
        return ctx.reply("No quotes yet. Add one with /quote add.").await;
    }

    let pick = (uuid::Uuid::new_v4().as_u128() % book.len() as u128) as usize;
    let (_, quote) = &book[pick];
    ctx.reply(format!("\"{}\" (added by <@{}>)", quote.text, quote.author)).await
}

async fn search(ctx: HandlerContext, options: Vec<OptionValue>, store: Arc<dyn Store>) -> HandlerResult {
    let query = options
        .option_str("query")
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| HandlerError::Rejected("Tell me what to search for.".to_string()))?;

    let book = load_book(store.as_ref(), &book_prefix(&ctx.interaction)).await?;
    let hits: Vec<&Quote> = book
        .iter()
        .map(|(_, quote)| quote)
        .filter(|quote| quote.text.to_lowercase().contains(&query))
        .collect();

    if hits.is_empty() {
        return ctx.reply(format!("No quotes matching '{}'.", query)).await;
    }

    let mut lines = vec![format!("{} match(es):", hits.len())];
    lines.extend(
        hits.iter()
            .take(MAX_SEARCH_RESULTS)
            .map(|quote| format!("- \"{}\"", quote.text)),
    );
    ctx.reply(lines.join("\n")).await
}
