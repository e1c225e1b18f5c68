use reqwest::{multipart::Form, Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Message shown when a failed request carries no usable `detail`.
pub const LOAD_FAILURE_FALLBACK: &str = "Failed to load data";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Server { status: u16, detail: Option<String> },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// The server-reported `detail`, when the error body carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// HTTP client for the integrations server.
#[derive(Debug, Clone)]
pub struct IntegrationClient {
    client: Client,
    base_url: String,
}

impl IntegrationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let base_url = if base_url.starts_with("http") {
            base_url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", base_url.trim_end_matches('/'))
        };

        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint_url(&self, endpoint_id: &str, action: &str) -> String {
        format!("{}/integrations/{}/{}", self.base_url, endpoint_id, action)
    }

    /// Posts the credentials as a JSON string in the `credentials` form field
    /// and returns the payload untouched. A body that is not JSON comes back
    /// as a JSON string.
    pub async fn load(&self, endpoint_id: &str, credentials: &Value) -> Result<Value, ClientError> {
        let form = Form::new().text("credentials", serde_json::to_string(credentials)?);

        let response = self
            .client
            .post(self.endpoint_url(endpoint_id, "load"))
            .multipart(form)
            .send()
            .await?;

        let body = success_body(response).await?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    /// Starts a server-mediated OAuth flow and returns the URL the user has to open.
    pub async fn authorize(&self, endpoint_id: &str, user: &str, org: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(self.endpoint_url(endpoint_id, "authorize"))
            .multipart(identity_form(user, org))
            .send()
            .await?;

        let body = success_body(response).await?;
        match serde_json::from_str::<Value>(&body) {
            Ok(Value::String(url)) => Ok(url),
            _ => Ok(body.trim().to_string()),
        }
    }

    /// Collects the credentials the server stored once the OAuth callback completed.
    pub async fn fetch_credentials(&self, endpoint_id: &str, user: &str, org: &str) -> Result<Value, ClientError> {
        let response = self
            .client
            .post(self.endpoint_url(endpoint_id, "credentials"))
            .multipart(identity_form(user, org))
            .send()
            .await?;

        let body = success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn identity_form(user: &str, org: &str) -> Form {
    Form::new()
        .text("user_id", user.to_string())
        .text("org_id", org.to_string())
}

async fn success_body(response: Response) -> Result<String, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.text().await?);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%status, "integrations server rejected request");
    Err(ClientError::Server {
        status: status.as_u16(),
        detail: error_detail(&body),
    })
}

/// Extracts a non-empty string `detail` from an error body.
fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()?
        .detail?
        .as_str()
        .filter(|detail| !detail.is_empty())
        .map(str::to_owned)
}
