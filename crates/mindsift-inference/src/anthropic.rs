//! Anthropic Messages API backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use mindsift_core::defaults;
use mindsift_core::{AiProvider, CompletionBackend, CompletionOptions, Error, Result};

/// Configuration for the Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key sent in the `x-api-key` header.
    pub api_key: String,
    /// Model to use for completions.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl AnthropicConfig {
    /// Config for a given key and model against the production endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: defaults::ANTHROPIC_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            timeout_seconds: defaults::PROVIDER_TIMEOUT_SECS,
        }
    }

    /// Override the base URL (local proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicError,
}

#[derive(Deserialize)]
struct AnthropicError {
    message: String,
}

/// Completion backend over the Anthropic Messages API.
pub struct AnthropicBackend {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicBackend {
    /// Create a new Anthropic backend with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::ProviderCall(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }
}

#[async_trait]
impl CompletionBackend for AnthropicBackend {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Anthropic completion request"
        );

        let request = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let url = format!(
            "{}/v1/messages",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", defaults::ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ProviderCall(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<AnthropicErrorResponse>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::ProviderCall(format!(
                "Anthropic returned {}: {}",
                status, message
            )));
        }

        let result: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::ProviderCall(format!("Failed to parse response: {}", e)))?;

        let text = result
            .content
            .first()
            .map(|block| block.text.clone())
            .unwrap_or_default();

        debug!(response_len = text.len(), "Anthropic completion done");
        Ok(text)
    }

    fn provider(&self) -> AiProvider {
        AiProvider::Claude
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
