use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::Interaction;

/// Responder trait - abstraction for answering an interaction on the platform
#[async_trait]
pub trait Responder: Send + Sync {
    /// Send a single response to the interaction
    async fn respond(&self, interaction: &Interaction, response: Response) -> Result<(), BotError>;
}

/// Reply to an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub content: String,
    /// Visible only to the caller
    pub ephemeral: bool,
}

impl Response {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}
