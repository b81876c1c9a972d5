//! HTTP command registry speaking the platform's application-command REST API

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::errors::RegistryError;
use crate::domain::entities::{CommandDescriptor, CommandOption, RegisteredCommand, Scope};
use crate::domain::traits::CommandRegistry;

/// Platform REST API base URL
pub const API_BASE: &str = "https://discord.com/api/v10";

#[derive(Serialize)]
struct CommandBody<'a> {
    name: &'a str,
    description: &'a str,
    options: &'a [CommandOption],
    default_permission: bool,
}

impl<'a> From<&'a CommandDescriptor> for CommandBody<'a> {
    fn from(descriptor: &'a CommandDescriptor) -> Self {
        Self {
            name: &descriptor.name,
            description: &descriptor.description,
            options: &descriptor.options,
            default_permission: descriptor.default_permission(),
        }
    }
}

#[derive(Deserialize)]
struct RateLimitBody {
    retry_after: Option<f64>,
}

/// Registry client backed by the platform's REST API
pub struct HttpRegistry {
    client: Client,
    api_base: String,
    application_id: u64,
    token: String,
}

impl HttpRegistry {
    pub fn new(token: impl Into<String>, application_id: u64) -> Self {
        Self {
            client: Client::new(),
            api_base: API_BASE.to_string(),
            application_id,
            token: token.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn commands_url(&self, scope: Scope) -> String {
        match scope {
            Scope::Global => format!("{}/applications/{}/commands", self.api_base, self.application_id),
            Scope::Guild(guild) => format!(
                "{}/applications/{}/guilds/{}/commands",
                self.api_base, self.application_id, guild
            ),
        }
    }

    fn command_url(&self, scope: Scope, id: &str) -> String {
        format!("{}/{}", self.commands_url(scope), id)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bot {}", self.token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RegistryError> {
        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::Unknown(format!("request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status(status, &body))
    }

    async fn json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, RegistryError> {
        response
            .json()
            .await
            .map_err(|e| RegistryError::Unknown(format!("invalid response body: {}", e)))
    }
}

/// Map a failed HTTP status to the registry error taxonomy
fn map_status(status: StatusCode, body: &str) -> RegistryError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RegistryError::Unauthorized,
        StatusCode::NOT_FOUND => RegistryError::NotFound(body.to_string()),
        StatusCode::CONFLICT => RegistryError::Conflict(body.to_string()),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = serde_json::from_str::<RateLimitBody>(body)
                .ok()
                .and_then(|b| b.retry_after)
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64);
            RegistryError::RateLimited { retry_after }
        }
        other => RegistryError::Unknown(format!("HTTP {}: {}", other, body)),
    }
}

#[async_trait]
impl CommandRegistry for HttpRegistry {
    async fn list_commands(&self, scope: Scope) -> Result<Vec<RegisteredCommand>, RegistryError> {
        let response = self.send(self.request(Method::GET, self.commands_url(scope))).await?;
        Self::json(response).await
    }

    async fn create_command(
        &self,
        scope: Scope,
        descriptor: &CommandDescriptor,
    ) -> Result<RegisteredCommand, RegistryError> {
        let request = self
            .request(Method::POST, self.commands_url(scope))
            .json(&CommandBody::from(descriptor));
        Self::json(self.send(request).await?).await
    }

    async fn update_command(
        &self,
        scope: Scope,
        id: &str,
        descriptor: &CommandDescriptor,
    ) -> Result<RegisteredCommand, RegistryError> {
        let request = self
            .request(Method::PATCH, self.command_url(scope, id))
            .json(&CommandBody::from(descriptor));
        Self::json(self.send(request).await?).await
    }

    async fn delete_command(&self, scope: Scope, id: &str) -> Result<(), RegistryError> {
        self.send(self.request(Method::DELETE, self.command_url(scope, id))).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::GuildId;

    #[test]
    fn test_urls_per_scope() {
        let registry = HttpRegistry::new("token", 12).with_api_base("http://localhost:9000/api/");
        assert_eq!(
            registry.commands_url(Scope::Global),
            "http://localhost:9000/api/applications/12/commands"
        );
        assert_eq!(
            registry.command_url(Scope::Guild(GuildId(7)), "55"),
            "http://localhost:9000/api/applications/12/guilds/7/commands/55"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status(StatusCode::UNAUTHORIZED, ""), RegistryError::Unauthorized);
        assert_eq!(map_status(StatusCode::FORBIDDEN, ""), RegistryError::Unauthorized);
        assert!(matches!(map_status(StatusCode::NOT_FOUND, "gone"), RegistryError::NotFound(_)));
        assert!(matches!(map_status(StatusCode::CONFLICT, ""), RegistryError::Conflict(_)));
        assert!(matches!(map_status(StatusCode::BAD_GATEWAY, ""), RegistryError::Unknown(_)));
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS, r#"{"retry_after": 1.5, "global": false}"#),
            RegistryError::RateLimited { retry_after: Some(Duration::from_millis(1500)) }
        );
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            RegistryError::RateLimited { retry_after: None }
        );
    }

    #[test]
    fn test_body_carries_derived_default_permission() {
        let descriptor = CommandDescriptor::new("kick", "Kick a member")
            .with_permission(crate::domain::entities::Permission::KickMembers);
        let body = serde_json::to_value(CommandBody::from(&descriptor)).unwrap();
        assert_eq!(body["name"], "kick");
        assert_eq!(body["default_permission"], false);
        assert!(body["options"].as_array().unwrap().is_empty());
    }
}
