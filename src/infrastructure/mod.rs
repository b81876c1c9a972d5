//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Registry: Command registry clients (HTTP, in-memory)
//! - Storage: Key/value persistence for handlers
//! - Adapters: Platform integrations (console)

pub mod adapters;
pub mod config;
pub mod registry;
pub mod storage;
