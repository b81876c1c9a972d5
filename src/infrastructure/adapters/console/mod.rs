//! Console adapter for development/testing
//!
//! Each stdin line is treated as an interaction from a simulated caller.
//! Lines starting with `{` are parsed as raw JSON interaction payloads.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::errors::BotError;
use crate::application::messaging::InteractionParser;
use crate::application::services::BotService;
use crate::domain::entities::{GatewayEvent, GuildId, Interaction, Member, User};
use crate::domain::traits::{Responder, Response};

/// Who the console is pretending to be
#[derive(Debug, Clone)]
pub struct ConsoleSession {
    pub user: User,
    /// Guild context; `None` simulates a direct message
    pub guild: Option<(GuildId, Member)>,
}

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    parser: InteractionParser,
    session: ConsoleSession,
}

impl ConsoleAdapter {
    pub fn new(prefix: impl Into<String>, session: ConsoleSession) -> Self {
        Self {
            parser: InteractionParser::new(prefix),
            session,
        }
    }

    /// Turn one input line into an interaction
    pub fn interaction(&self, line: &str) -> Result<Interaction, BotError> {
        if line.trim_start().starts_with('{') {
            return self.parser.parse_payload(line);
        }

        let mut interaction = self
            .parser
            .parse_line(self.session.user.clone(), line)?
            .with_channel("console");
        if let Some((guild_id, member)) = &self.session.guild {
            interaction = interaction.in_guild(*guild_id, member.clone());
        }
        Ok(interaction)
    }

    /// Read stdin until EOF, feeding every line to the bot service
    pub async fn run(&self, service: &BotService) -> Result<(), BotError> {
        let ready = GatewayEvent::Ready {
            user: User::new(self.session.user.id).with_username("console"),
            guilds: self.session.guild.iter().map(|(id, _)| *id).collect(),
        };
        service.handle_event(ready).await;

        let where_ = match &self.session.guild {
            Some((id, _)) => format!("guild {}", id),
            None => "a direct message".to_string(),
        };
        println!("Console ready as {} in {}. Type /help, Ctrl-D to quit.", self.session.user, where_);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match self.interaction(&line) {
                Ok(interaction) => {
                    let handled = service.handle_event(GatewayEvent::InteractionCreate(interaction)).await;
                    // keep console output in input order
                    if let Some(dispatch) = handled.dispatch {
                        if let Ok(outcome) = dispatch.await {
                            tracing::debug!("Dispatch outcome: {:?}", outcome);
                        }
                    }
                }
                Err(e) => println!("[ERROR] {}", e),
            }
        }
        Ok(())
    }
}

/// Prints responses to stdout
pub struct ConsoleResponder;

#[async_trait]
impl Responder for ConsoleResponder {
    async fn respond(&self, interaction: &Interaction, response: Response) -> Result<(), BotError> {
        let marker = if response.ephemeral { " (only you)" } else { "" };
        println!("[BOT{} -> /{}] {}", marker, interaction.command_name, response.content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{PermissionSet, Scope, UserId};

    #[test]
    fn test_lines_pick_up_session_context() {
        let session = ConsoleSession {
            user: User::new(UserId(9)),
            guild: Some((GuildId(5), Member::with_permissions(PermissionSet::from_bits(2)))),
        };
        let adapter = ConsoleAdapter::new("/", session);
        let interaction = adapter.interaction("/ping").unwrap();
        assert_eq!(interaction.scope(), Scope::Guild(GuildId(5)));
        assert_eq!(interaction.user.id, UserId(9));
        assert!(interaction.member.is_some());
    }

    #[test]
    fn test_json_lines_are_parsed_as_payloads() {
        let session = ConsoleSession { user: User::new(UserId(9)), guild: None };
        let adapter = ConsoleAdapter::new("/", session);
        let interaction = adapter
            .interaction(r#"{"id": "3", "user": {"id": "11"}, "data": {"name": "ping"}}"#)
            .unwrap();
        assert_eq!(interaction.user.id, UserId(11));
        assert_eq!(interaction.scope(), Scope::Global);
    }
}
