//! Domain layer - Core types of the command control plane
//!
//! This layer contains:
//! - Entities: Descriptors, scopes, permissions, interactions
//! - Traits: Abstractions for infrastructure (CommandRegistry, Responder, Store)

pub mod entities;
pub mod traits;
