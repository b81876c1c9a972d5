//! Command registry clients

pub mod http;
pub mod memory;

pub use http::HttpRegistry;
pub use memory::{MemoryRegistry, RegistryCall};
