use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::types::{ChatMessage, ChatReply, ModelListing};
use crate::constants::HTTP_CONNECT_TIMEOUT_SECS;
use crate::utils::ServiceError;

/// Operations the generation flow needs from the inference server
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// List locally available models. Also used as the reachability probe.
    async fn list_models(&self) -> Result<ModelListing, ServiceError>;

    /// Download a model. Blocks until the server reports completion.
    async fn pull_model(&self, model: &str) -> Result<(), ServiceError>;

    /// Run a single non-streaming chat completion
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatReply, ServiceError>;
}

/// HTTP client for a local Ollama instance
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a client for a base URL such as `http://localhost:11434`.
    ///
    /// Only the connect phase is bounded; pulls and generations may take as long
    /// as the server needs.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_body(response: reqwest::Response) -> Result<String, ServiceError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: error_text(&body),
            });
        }
        Ok(body)
    }
}

/// Pull the `error` field out of an error body, or return the body unchanged
fn error_text(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl InferenceService for OllamaClient {
    async fn list_models(&self) -> Result<ModelListing, ServiceError> {
        let response = self.client.get(self.url("/api/tags")).send().await?;
        let body = Self::read_body(response).await?;
        serde_json::from_str::<ModelListing>(&body).map_err(|e| ServiceError::Decode(e.to_string()))
    }

    async fn pull_model(&self, model: &str) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.url("/api/pull"))
            .json(&json!({ "model": model, "stream": false }))
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        // The server can answer 200 and still report a failure in the body.
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            if let Some(err) = value.get("error").and_then(|e| e.as_str()) {
                return Err(ServiceError::Api(err.to_string()));
            }
            if let Some(status) = value.get("status").and_then(|s| s.as_str()) {
                debug!("pull {} finished with status {}", model, status);
            }
        }
        Ok(())
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatReply, ServiceError> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&json!({
                "model": model,
                "messages": messages,
                "stream": false,
            }))
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        Ok(ChatReply::from_body(&body))
    }
}
