//! Application layer errors

use std::time::Duration;
use thiserror::Error;

use crate::domain::entities::Scope;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors. Fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Duplicate command name '{name}' in scope {scope}")]
    DuplicateCommandName { name: String, scope: Scope },

    #[error("Malformed descriptor '{name}': {reason}")]
    MalformedDescriptor { name: String, reason: String },

    #[error("Command '{name}' has no handler for {path}")]
    MissingHandler { name: String, path: String },

    #[error("Command '{name}' registers a handler for undeclared subcommand '{subcommand}'")]
    UnknownSubcommandHandler { name: String, subcommand: String },

    #[error("Module '{0}' already registered")]
    DuplicateModule(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Remote command registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown registry error: {0}")]
    Unknown(String),
}

/// Errors raised by business-logic handlers
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Refusal meant to be shown to the caller verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Response failed: {0}")]
    Response(String),

    #[error("Execution failed: {0}")]
    Failed(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
