//! sentinel-bot - command control plane for a chat-platform bot
//!
//! Feature modules declare commands; the synchronizer keeps the platform's
//! registered commands converged with them and the dispatcher routes
//! interactions to handlers under a permission gate.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod modules;
