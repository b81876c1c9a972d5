//! Application layer - Use cases of the command control plane
//!
//! This layer contains:
//! - Compose: Merging feature modules into one command set
//! - Gate: Permission decisions
//! - Sync: Registry reconciliation
//! - Messaging: Interaction parsing and dispatching
//! - Services: Gateway event orchestration
//! - Errors: Domain-specific errors

pub mod compose;
pub mod errors;
pub mod events;
pub mod gate;
pub mod handler;
pub mod messaging;
pub mod scheduler;
pub mod services;
pub mod sync;
