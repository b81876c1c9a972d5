use async_trait::async_trait;

use crate::application::errors::RegistryError;
use crate::domain::entities::{CommandDescriptor, RegisteredCommand, Scope};

/// Registry trait - the platform's hosted list of registered commands
#[async_trait]
pub trait CommandRegistry: Send + Sync {
    /// List every command registered in a scope
    async fn list_commands(&self, scope: Scope) -> Result<Vec<RegisteredCommand>, RegistryError>;

    /// Register a new command
    async fn create_command(
        &self,
        scope: Scope,
        descriptor: &CommandDescriptor,
    ) -> Result<RegisteredCommand, RegistryError>;

    /// Overwrite an existing command in place
    async fn update_command(
        &self,
        scope: Scope,
        id: &str,
        descriptor: &CommandDescriptor,
    ) -> Result<RegisteredCommand, RegistryError>;

    /// Remove a command
    async fn delete_command(&self, scope: Scope, id: &str) -> Result<(), RegistryError>;
}
