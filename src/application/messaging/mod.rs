//! Interaction handling - parsing and dispatching inbound commands

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{DispatchOutcome, InteractionDispatcher};
pub use parser::InteractionParser;
