//! In-process command registry for local development and tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::application::errors::RegistryError;
use crate::domain::entities::{CommandDescriptor, RegisteredCommand, Scope};
use crate::domain::traits::CommandRegistry;

/// A call made against the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    List(Scope),
    Create { scope: Scope, name: String },
    Update { scope: Scope, id: String },
    Delete { scope: Scope, id: String },
}

impl RegistryCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, RegistryCall::List(_))
    }
}

/// Registry that keeps commands in memory and records every call
pub struct MemoryRegistry {
    scopes: RwLock<HashMap<Scope, Vec<RegisteredCommand>>>,
    calls: RwLock<Vec<RegistryCall>>,
    list_failures: RwLock<HashMap<Scope, RegistryError>>,
    name_failures: RwLock<HashMap<String, RegistryError>>,
    next_id: AtomicU64,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
            list_failures: RwLock::new(HashMap::new()),
            name_failures: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1000),
        }
    }

    /// Replace a scope's registered commands
    pub async fn seed(&self, scope: Scope, commands: Vec<RegisteredCommand>) {
        self.scopes.write().await.insert(scope, commands);
    }

    pub async fn commands(&self, scope: Scope) -> Vec<RegisteredCommand> {
        self.scopes.read().await.get(&scope).cloned().unwrap_or_default()
    }

    pub async fn calls(&self) -> Vec<RegistryCall> {
        self.calls.read().await.clone()
    }

    pub async fn mutations(&self) -> Vec<RegistryCall> {
        self.calls.read().await.iter().filter(|c| c.is_mutation()).cloned().collect()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Make listing a scope fail until cleared
    pub async fn fail_listing(&self, scope: Scope, error: RegistryError) {
        self.list_failures.write().await.insert(scope, error);
    }

    /// Make every mutating call touching `name` fail until cleared
    pub async fn fail_command(&self, name: impl Into<String>, error: RegistryError) {
        self.name_failures.write().await.insert(name.into(), error);
    }

    pub async fn clear_failures(&self) {
        self.list_failures.write().await.clear();
        self.name_failures.write().await.clear();
    }

    async fn record(&self, call: RegistryCall) {
        self.calls.write().await.push(call);
    }

    async fn check_name(&self, name: &str) -> Result<(), RegistryError> {
        match self.name_failures.read().await.get(name) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRegistry for MemoryRegistry {
    async fn list_commands(&self, scope: Scope) -> Result<Vec<RegisteredCommand>, RegistryError> {
        self.record(RegistryCall::List(scope)).await;
        if let Some(error) = self.list_failures.read().await.get(&scope) {
            return Err(error.clone());
        }
        Ok(self.commands(scope).await)
    }

    async fn create_command(
        &self,
        scope: Scope,
        descriptor: &CommandDescriptor,
    ) -> Result<RegisteredCommand, RegistryError> {
        self.record(RegistryCall::Create { scope, name: descriptor.name.clone() }).await;
        self.check_name(&descriptor.name).await?;

        let mut scopes = self.scopes.write().await;
        let commands = scopes.entry(scope).or_default();
        if commands.iter().any(|c| c.name == descriptor.name) {
            return Err(RegistryError::Conflict(descriptor.name.clone()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let registered = RegisteredCommand::from_descriptor(id, descriptor);
        commands.push(registered.clone());
        Ok(registered)
    }

    async fn update_command(
        &self,
        scope: Scope,
        id: &str,
        descriptor: &CommandDescriptor,
    ) -> Result<RegisteredCommand, RegistryError> {
        self.record(RegistryCall::Update { scope, id: id.to_string() }).await;
        self.check_name(&descriptor.name).await?;

        let mut scopes = self.scopes.write().await;
        let existing = scopes
            .get_mut(&scope)
            .and_then(|commands| commands.iter_mut().find(|c| c.id == id))
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        *existing = RegisteredCommand::from_descriptor(id, descriptor);
        Ok(existing.clone())
    }

    async fn delete_command(&self, scope: Scope, id: &str) -> Result<(), RegistryError> {
        self.record(RegistryCall::Delete { scope, id: id.to_string() }).await;

        let mut scopes = self.scopes.write().await;
        let commands = scopes
            .get_mut(&scope)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let position = commands
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let name = commands[position].name.clone();
        drop(scopes);
        self.check_name(&name).await?;

        let mut scopes = self.scopes.write().await;
        if let Some(commands) = scopes.get_mut(&scope) {
            commands.retain(|c| c.id != id);
        }
        Ok(())
    }
}
