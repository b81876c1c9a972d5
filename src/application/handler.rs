//! Handler function values - what feature modules plug into the dispatcher

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::application::compose::ComposedState;
use crate::application::errors::HandlerError;
use crate::domain::entities::{GatewayEvent, Interaction, OptionValue};
use crate::domain::traits::{Responder, Response};

/// Boxed future returned by every handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Handler result
pub type HandlerResult = Result<(), HandlerError>;

/// Command handler: receives the interaction context and its resolved options
pub type CommandHandler = Arc<dyn Fn(HandlerContext, Vec<OptionValue>) -> HandlerFuture + Send + Sync>;

/// Runs after the permission gate and before the command handler.
/// An error stops the invocation.
pub type BeforeHook = Arc<dyn Fn(HandlerContext) -> HandlerFuture + Send + Sync>;

/// Gateway event handler
pub type EventHandler = Arc<dyn Fn(GatewayEvent) -> HandlerFuture + Send + Sync>;

/// Scheduled job body
pub type JobFn = Arc<dyn Fn() -> HandlerFuture + Send + Sync>;

pub fn command_handler<F, Fut>(f: F) -> CommandHandler
where
    F: Fn(HandlerContext, Vec<OptionValue>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx, options| Box::pin(f(ctx, options)))
}

pub fn before_hook<F, Fut>(f: F) -> BeforeHook
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

pub fn event_handler<F, Fut>(f: F) -> EventHandler
where
    F: Fn(GatewayEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |event| Box::pin(f(event)))
}

/// Context handed to command handlers
#[derive(Clone)]
pub struct HandlerContext {
    pub interaction: Arc<Interaction>,
    pub responder: Arc<dyn Responder>,
    /// Read-only view of every composed command
    pub commands: Arc<ComposedState>,
    /// Name of the selected subcommand, if any
    pub subcommand: Option<String>,
}

impl HandlerContext {
    pub async fn reply(&self, content: impl Into<String>) -> HandlerResult {
        self.send(Response::public(content)).await
    }

    pub async fn reply_ephemeral(&self, content: impl Into<String>) -> HandlerResult {
        self.send(Response::ephemeral(content)).await
    }

    async fn send(&self, response: Response) -> HandlerResult {
        self.responder
            .respond(&self.interaction, response)
            .await
            .map_err(|e| HandlerError::Response(e.to_string()))
    }
}

/// A background job contributed by a module
#[derive(Clone)]
pub struct JobSpec {
    pub name: String,
    pub interval: Duration,
    pub run: JobFn,
}

impl JobSpec {
    pub fn new<F, Fut>(name: impl Into<String>, interval: Duration, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            interval,
            run: Arc::new(move || Box::pin(f())),
        }
    }
}

impl std::fmt::Debug for JobSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSpec")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .finish()
    }
}
