//! OpenAI-compatible chat client.
//!
//! Works with OpenAI and with local runners that expose the same API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::backend::BackendDescriptor;
use super::error::LlmError;

/// A model that turns a system and user prompt into a reply.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Chat client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAICompatibleModel {
    client: Client,
    backend: BackendDescriptor,
}

impl OpenAICompatibleModel {
    #[must_use]
    pub fn new(client: Client, backend: BackendDescriptor) -> Self {
        Self { client, backend }
    }

    pub fn backend(&self) -> &BackendDescriptor {
        &self.backend
    }
}

#[async_trait]
impl ChatModel for OpenAICompatibleModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.backend.endpoint().trim_end_matches('/')
        );

        let request = ChatRequest {
            model: self.backend.model(),
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.backend.temperature(),
            max_tokens: self.backend.max_tokens(),
        };

        let mut req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(key) = self.backend.credential() {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        tracing::debug!(
            backend = %self.backend.kind(),
            model = %self.backend.model(),
            "Sending chat completion request"
        );

        let response = req.json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, message });
        }

        let body: ChatResponse = response.json().await?;
        first_content(body)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn first_content(body: ChatResponse) -> Result<String, LlmError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or(LlmError::EmptyResponse)
}
