use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::compose::ComposedState;
use crate::application::events::{DomainEvent, EventBus};
use crate::application::messaging::{DispatchOutcome, InteractionDispatcher};
use crate::application::sync::{SyncReport, Synchronizer};
use crate::domain::entities::GatewayEvent;

/// Tasks started while handling one gateway event
pub struct Handled {
    pub dispatch: Option<JoinHandle<DispatchOutcome>>,
    pub listeners: Vec<JoinHandle<()>>,
}

/// Service for processing gateway events: syncs on ready, dispatches
/// interactions and fans every event out to the composed handlers
pub struct BotService {
    commands: Arc<ComposedState>,
    dispatcher: Arc<InteractionDispatcher>,
    synchronizer: Arc<Synchronizer>,
    bus: EventBus,
    sync_on_ready: bool,
}

impl BotService {
    pub fn new(
        commands: Arc<ComposedState>,
        dispatcher: Arc<InteractionDispatcher>,
        synchronizer: Arc<Synchronizer>,
        bus: EventBus,
    ) -> Self {
        Self {
            commands,
            dispatcher,
            synchronizer,
            bus,
            sync_on_ready: true,
        }
    }

    pub fn with_sync_on_ready(mut self, enabled: bool) -> Self {
        self.sync_on_ready = enabled;
        self
    }

    /// Run one synchronization pass over every desired scope
    pub async fn sync(&self) -> SyncReport {
        let report = self.synchronizer.synchronize(&self.commands.desired()).await;
        self.bus.publish(DomainEvent::CommandsSynced {
            mutations: report.mutations(),
            clean: report.is_clean(),
        });
        report
    }

    /// Keep the registry converged by re-running passes on an interval
    pub fn start_periodic_sync(&self, every: Duration) -> JoinHandle<()> {
        info!("Periodic command sync every {:?}", every);
        self.synchronizer.clone().spawn_periodic(self.commands.desired(), every)
    }

    /// Process one gateway event
    pub async fn handle_event(&self, event: GatewayEvent) -> Handled {
        let mut dispatch = None;

        match &event {
            GatewayEvent::Ready { user, guilds } => {
                info!("Connected as {} ({} guilds)", user, guilds.len());
                if self.sync_on_ready {
                    let report = self.sync().await;
                    if !report.is_clean() {
                        warn!("Initial command sync finished with errors");
                    }
                }
            }
            GatewayEvent::InteractionCreate(interaction) => {
                dispatch = Some(self.dispatcher.spawn(interaction.clone()));
            }
            _ => {}
        }

        let kind = event.kind();
        let listeners = self
            .commands
            .handlers(kind)
            .iter()
            .map(|handler| {
                let run = handler(event.clone());
                tokio::spawn(async move {
                    if let Err(e) = run.await {
                        warn!("Event handler for {} failed: {}", kind, e);
                    }
                })
            })
            .collect();

        Handled { dispatch, listeners }
    }
}
