//! Moderation log: once connected, follows the event bus and logs what happens

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::application::compose::ModuleContribution;
use crate::application::events::{DomainEvent, EventBus};
use crate::application::handler::HandlerResult;
use crate::domain::entities::{EventKind, GatewayEvent};
use crate::modules::{Module, ModuleEnv};

pub struct ModlogModule;

impl Module for ModlogModule {
    fn name(&self) -> &str {
        "modlog"
    }

    fn description(&self) -> &str {
        "Logs moderation and bookkeeping events"
    }

    fn contribute(&self, env: &ModuleEnv) -> ModuleContribution {
        let bus = env.bus.clone();
        // Ready fires again on reconnect; follow the bus only once
        let following = Arc::new(AtomicBool::new(false));

        ModuleContribution::new()
            .on(EventKind::Ready, move |_event| {
                let bus = bus.clone();
                let following = following.clone();
                async move {
                    if !following.swap(true, Ordering::SeqCst) {
                        tokio::spawn(follow(bus));
                    }
                    Ok(())
                }
            })
            .on(EventKind::GuildMemberAdd, membership)
            .on(EventKind::GuildMemberRemove, membership)
    }
}

async fn follow(bus: EventBus) {
    let mut events = bus.subscribe();
    info!("Modlog following the event bus");

    loop {
        match events.recv().await {
            Ok(event) => record(&event),
            Err(RecvError::Lagged(missed)) => warn!("Modlog lagged, {} events missed", missed),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn membership(event: GatewayEvent) -> HandlerResult {
    match event {
        GatewayEvent::GuildMemberAdd { guild_id, user } => info!("[modlog] guild {}: {} joined", guild_id, user),
        GatewayEvent::GuildMemberRemove { guild_id, user } => info!("[modlog] guild {}: {} left", guild_id, user),
        _ => {}
    }
    Ok(())
}

fn record(event: &DomainEvent) {
    match event {
        DomainEvent::ModerationAction {
            guild_id,
            moderator,
            target,
            kind,
            reason,
        } => info!(
            "[modlog] guild {}: {} by {} on {} ({})",
            guild_id,
            kind,
            moderator,
            target,
            reason.as_deref().unwrap_or("no reason")
        ),
        DomainEvent::QuoteAdded { guild_id, author, key } => match guild_id {
            Some(guild) => info!("[modlog] guild {}: quote {} added by {}", guild, key, author),
            None => info!("[modlog] quote {} added by {} in DM", key, author),
        },
        DomainEvent::CommandsSynced { mutations, clean } => {
            info!("[modlog] commands synced: {} change(s), clean: {}", mutations, clean)
        }
    }
}
