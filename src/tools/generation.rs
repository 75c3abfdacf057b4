//! Text generation capability.
//!
//! The pipeline treats generation as an opaque `generate(prompt, settings) -> text`
//! function. Tools that need a language model (the intent classifier) receive
//! an `Arc<dyn TextGenerator>`.

use super::ToolError;
use crate::state::GenerationSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const GENERATION_TIMEOUT_MS: u64 = 60_000;

#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, settings: &GenerationSettings)
        -> Result<String, ToolError>;
}

/// Generator speaking the OpenAI `/v1/chat/completions` protocol.
///
/// Works against OpenAI, Ollama, vLLM, LM Studio and any other compatible server.
pub struct OpenAiCompatibleGenerator {
    /// Base URL (e.g., "https://api.openai.com")
    base_url: String,
    api_key: Option<String>,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
}

impl OpenAiCompatibleGenerator {
    pub fn new(base_url: String, api_key: Option<String>, client: Arc<Client>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleGenerator {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn generate(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, ToolError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: settings.temperature,
            top_p: settings.top_p,
            presence_penalty: settings.presence_penalty,
            frequency_penalty: settings.frequency_penalty,
            max_tokens: settings.max_tokens,
        };

        let mut request = self
            .client
            .post(&url)
            .json(&body)
            .timeout(Duration::from_millis(GENERATION_TIMEOUT_MS));
        if let Some(key) = &self.api_key {
            request = request.header("authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ToolError::from_reqwest(e, GENERATION_TIMEOUT_MS))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            ToolError::InvalidResponse(format!("Failed to parse completion response: {}", e))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ToolError::InvalidResponse("completion has no content".to_string()))
    }
}
