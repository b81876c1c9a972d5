//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod gateway;
pub mod interaction;
pub mod permission;
pub mod registered;
pub mod scope;
pub mod user;

pub use command::{CommandDescriptor, CommandOption, OptionChoice, OptionKind};
pub use gateway::{EventKind, GatewayEvent};
pub use interaction::{Interaction, OptionValue, OptionsExt};
pub use permission::{Permission, PermissionSet};
pub use registered::RegisteredCommand;
pub use scope::{GuildId, Scope, ScopeTarget};
pub use user::{Member, User, UserId};
