//! Interaction dispatcher - routes interactions to command handlers

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::application::compose::{CommandDefinition, ComposedState};
use crate::application::errors::HandlerError;
use crate::application::gate::{Caller, Decision, DenyReason, PermissionGate};
use crate::application::handler::{HandlerContext, HandlerFuture};
use crate::domain::entities::{Interaction, OptionKind, OptionValue};
use crate::domain::traits::{Responder, Response};

const FAILURE_NOTICE: &str = "Something went wrong while running this command.";

/// Terminal state of one interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched,
    Denied(DenyReason),
    /// The before-execute hook or the handler refused with a caller-facing message
    Rejected(String),
    UnknownCommand,
    /// A subcommand-bearing command arrived without a valid subcommand
    Malformed,
    HandlerFailed,
}

/// Outcome of subcommand resolution
struct Resolved<'a> {
    command: &'a CommandDefinition,
    subcommand: Option<String>,
    options: Vec<OptionValue>,
}

/// Interaction dispatcher. Shared read-only across concurrent dispatches.
pub struct InteractionDispatcher {
    commands: Arc<ComposedState>,
    gate: PermissionGate,
    responder: Arc<dyn Responder>,
}

impl InteractionDispatcher {
    pub fn new(commands: Arc<ComposedState>, gate: PermissionGate, responder: Arc<dyn Responder>) -> Self {
        Self {
            commands,
            gate,
            responder,
        }
    }

    /// Dispatch on its own task so slow handlers never hold up other interactions
    pub fn spawn(self: &Arc<Self>, interaction: Interaction) -> JoinHandle<DispatchOutcome> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.dispatch(interaction).await })
    }

    /// Run one interaction through lookup, subcommand resolution, the gate and the handler
    pub async fn dispatch(&self, interaction: Interaction) -> DispatchOutcome {
        let scope = interaction.scope();

        let Some(command) = self.commands.lookup(scope, &interaction.command_name) else {
            warn!("[{}] Unknown command /{} from {}", scope, interaction.command_name, interaction.user);
            return DispatchOutcome::UnknownCommand;
        };

        let Some(resolved) = resolve(&command, &interaction.options) else {
            warn!(
                "[{}] /{} invoked without a valid subcommand by {}",
                scope, interaction.command_name, interaction.user
            );
            return DispatchOutcome::Malformed;
        };

        let Some(handler) = resolved.command.handler_for(resolved.subcommand.as_deref()).cloned() else {
            warn!("[{}] No handler for /{}", scope, interaction.command_name);
            return DispatchOutcome::UnknownCommand;
        };

        let caller = Caller {
            id: interaction.user.id,
            member: interaction.member.as_ref(),
        };
        if let Decision::Deny(reason) = self.gate.check(&caller, &resolved.command.descriptor) {
            debug!("[{}] Denied /{} for {}: {}", scope, interaction.command_name, interaction.user, reason);
            self.respond(&interaction, Response::ephemeral(reason.user_message())).await;
            return DispatchOutcome::Denied(reason);
        }

        let path = match &resolved.subcommand {
            Some(sub) => format!("{} {}", interaction.command_name, sub),
            None => interaction.command_name.clone(),
        };
        let before = resolved.command.before_execute.clone();
        let options = resolved.options;
        let interaction = Arc::new(interaction);
        let ctx = HandlerContext {
            interaction: interaction.clone(),
            responder: self.responder.clone(),
            commands: self.commands.clone(),
            subcommand: resolved.subcommand,
        };

        if let Some(hook) = before {
            if let Err(e) = isolate(hook(ctx.clone())).await {
                return self.fail(&interaction, &path, e).await;
            }
        }

        match isolate(handler(ctx, options)).await {
            Ok(()) => {
                info!("[{}] /{} handled for {}", scope, path, interaction.user);
                DispatchOutcome::Dispatched
            }
            Err(e) => self.fail(&interaction, &path, e).await,
        }
    }

    async fn fail(&self, interaction: &Interaction, path: &str, error: HandlerError) -> DispatchOutcome {
        match error {
            HandlerError::Rejected(message) => {
                debug!("[{}] /{} rejected: {}", interaction.scope(), path, message);
                self.respond(interaction, Response::ephemeral(message.clone())).await;
                DispatchOutcome::Rejected(message)
            }
            other => {
                error!(
                    "[{}] /{} failed for {} (interaction {}): {}",
                    interaction.scope(),
                    path,
                    interaction.user,
                    interaction.id,
                    other
                );
                self.respond(interaction, Response::ephemeral(FAILURE_NOTICE)).await;
                DispatchOutcome::HandlerFailed
            }
        }
    }

    async fn respond(&self, interaction: &Interaction, response: Response) {
        if let Err(e) = self.responder.respond(interaction, response).await {
            warn!("[{}] Failed to respond to interaction {}: {}", interaction.scope(), interaction.id, e);
        }
    }
}

/// Descend into the selected subcommand, if the command declares any.
/// Returns `None` when a subcommand is required but missing or undeclared.
fn resolve<'a>(command: &'a CommandDefinition, options: &[OptionValue]) -> Option<Resolved<'a>> {
    if !command.descriptor.has_subcommands() {
        return Some(Resolved {
            command,
            subcommand: None,
            options: options.to_vec(),
        });
    }

    let selected = options.first().filter(|o| o.kind == OptionKind::SubCommand)?;
    command.descriptor.subcommand(&selected.name)?;
    Some(Resolved {
        command,
        subcommand: Some(selected.name.clone()),
        options: selected.options.clone(),
    })
}

/// Run a handler future on its own task, turning panics into errors
async fn isolate(future: HandlerFuture) -> Result<(), HandlerError> {
    match tokio::spawn(future).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(HandlerError::Failed("handler panicked".to_string())),
        Err(e) => Err(HandlerError::Failed(e.to_string())),
    }
}
