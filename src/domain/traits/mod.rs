//! Domain traits - Abstractions for infrastructure implementations

pub mod registry;
pub mod responder;
pub mod store;

pub use registry::CommandRegistry;
pub use responder::{Responder, Response};
pub use store::Store;
