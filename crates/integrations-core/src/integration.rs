//! Integration registry and per-integration credential setup.
//!
//! Each registered integration maps a display name to the endpoint identifier
//! used in server paths and to the handler that gathers its credentials.
//! Adding an integration means registering an entry; nothing else changes.

use crate::client::{ClientError, IntegrationClient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Everything a setup handler is given to produce credentials.
#[derive(Debug, Clone)]
pub struct SetupContext {
    pub user: String,
    pub org: String,
    pub endpoint_id: String,
    pub params: Map<String, Value>,
    /// Free-text input typed into the setup form (an access token, for instance).
    pub input: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetupStep {
    /// The user must open this URL before the setup can be finished.
    OpenUrl(String),
    Credentials(Value),
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("an access token is required")]
    MissingInput,
    #[error("no authorization is pending")]
    NotStarted,
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl SetupError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(err) => err.user_message("Failed to connect integration"),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupKind {
    #[default]
    Oauth,
    Token,
}

/// Capability contract for an integration's credential flow.
#[async_trait]
pub trait CredentialSetup: Send + Sync {
    fn kind(&self) -> SetupKind;

    /// Label of the free-text input the form shows, if the flow takes one.
    fn input_label(&self) -> Option<&'static str> {
        None
    }

    async fn begin(&self, client: &IntegrationClient, ctx: &SetupContext) -> Result<SetupStep, SetupError>;

    async fn finish(&self, client: &IntegrationClient, ctx: &SetupContext) -> Result<Value, SetupError>;
}

/// Credentials pasted by the user as a bare access token.
pub struct TokenSetup;

#[async_trait]
impl CredentialSetup for TokenSetup {
    fn kind(&self) -> SetupKind {
        SetupKind::Token
    }

    fn input_label(&self) -> Option<&'static str> {
        Some("Access Token")
    }

    async fn begin(&self, _client: &IntegrationClient, ctx: &SetupContext) -> Result<SetupStep, SetupError> {
        let token = ctx.input.trim();
        if token.is_empty() {
            return Err(SetupError::MissingInput);
        }
        Ok(SetupStep::Credentials(json!({ "access_token": token })))
    }

    async fn finish(&self, _client: &IntegrationClient, _ctx: &SetupContext) -> Result<Value, SetupError> {
        Err(SetupError::NotStarted)
    }
}

/// Server-mediated OAuth: the server hands out an authorization URL and
/// later releases the credentials its callback stored.
pub struct OAuthSetup;

#[async_trait]
impl CredentialSetup for OAuthSetup {
    fn kind(&self) -> SetupKind {
        SetupKind::Oauth
    }

    async fn begin(&self, client: &IntegrationClient, ctx: &SetupContext) -> Result<SetupStep, SetupError> {
        let url = client.authorize(&ctx.endpoint_id, &ctx.user, &ctx.org).await?;
        tracing::info!(endpoint = %ctx.endpoint_id, "authorization started");
        Ok(SetupStep::OpenUrl(url))
    }

    async fn finish(&self, client: &IntegrationClient, ctx: &SetupContext) -> Result<Value, SetupError> {
        let credentials = client
            .fetch_credentials(&ctx.endpoint_id, &ctx.user, &ctx.org)
            .await?;
        tracing::info!(endpoint = %ctx.endpoint_id, "credentials received");
        Ok(credentials)
    }
}

pub fn setup_for(kind: SetupKind) -> Arc<dyn CredentialSetup> {
    match kind {
        SetupKind::Oauth => Arc::new(OAuthSetup),
        SetupKind::Token => Arc::new(TokenSetup),
    }
}

#[derive(Clone)]
pub struct IntegrationEntry {
    pub name: String,
    pub endpoint_id: String,
    pub setup: Arc<dyn CredentialSetup>,
}

/// Integration declared in the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub setup: SetupKind,
}

#[derive(Clone)]
pub struct IntegrationRegistry {
    entries: Vec<IntegrationEntry>,
}

impl Default for IntegrationRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("Notion", "notion", Arc::new(OAuthSetup));
        registry.register("Airtable", "airtable", Arc::new(OAuthSetup));
        registry.register("HubSpot", "hubspot", Arc::new(OAuthSetup));
        registry
    }
}

impl IntegrationRegistry {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Default integrations followed by those declared in configuration.
    pub fn with_configured(configured: &[IntegrationConfig]) -> Self {
        let mut registry = Self::default();
        for config in configured {
            registry.register(&config.name, &config.endpoint, setup_for(config.setup));
        }
        registry
    }

    /// Registers an integration, replacing any entry with the same name.
    pub fn register(&mut self, name: &str, endpoint_id: &str, setup: Arc<dyn CredentialSetup>) {
        let entry = IntegrationEntry {
            name: name.to_string(),
            endpoint_id: endpoint_id.to_string(),
            setup,
        };
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, name: &str) -> Option<&IntegrationEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn endpoint_id(&self, name: &str) -> Option<&str> {
        self.get(name).map(|e| e.endpoint_id.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cycles through `None` and every registered name, in registration order.
    pub fn next_name(&self, current: Option<&str>) -> Option<String> {
        let position = current.and_then(|name| self.entries.iter().position(|e| e.name == name));
        let next = match position {
            None => 0,
            Some(i) => i + 1,
        };
        self.entries.get(next).map(|e| e.name.clone())
    }

    pub fn previous_name(&self, current: Option<&str>) -> Option<String> {
        let position = current.and_then(|name| self.entries.iter().position(|e| e.name == name));
        match position {
            None => self.entries.last().map(|e| e.name.clone()),
            Some(0) => None,
            Some(i) => self.entries.get(i - 1).map(|e| e.name.clone()),
        }
    }
}
