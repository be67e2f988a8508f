//! OpenAI chat-completions backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use mindsift_core::defaults;
use mindsift_core::{AiProvider, CompletionBackend, CompletionOptions, Error, Result};

/// Configuration for the OpenAI backend.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key sent as a Bearer token.
    pub api_key: String,
    /// Model to use for completions.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl OpenAiConfig {
    /// Config for a given key and model against the production endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: defaults::OPENAI_URL.to_string(),
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
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Deserialize)]
struct OpenAiError {
    message: String,
}

/// Completion backend over the OpenAI chat-completions API.
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::ProviderCall(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "OpenAI completion request"
        );

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ProviderCall(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<OpenAiErrorResponse>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::ProviderCall(format!(
                "OpenAI returned {}: {}",
                status, message
            )));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::ProviderCall(format!("Failed to parse response: {}", e)))?;

        let text = result
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default();

        debug!(response_len = text.len(), "OpenAI completion done");
        Ok(text)
    }

    fn provider(&self) -> AiProvider {
        AiProvider::OpenAi
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OpenAiConfig::new("sk-test", "gpt-4o-mini");
        assert_eq!(config.base_url, defaults::OPENAI_URL);
        assert_eq!(config.timeout_seconds, defaults::PROVIDER_TIMEOUT_SECS);
    }

    #[test]
    fn test_backend_reports_vendor_and_model() {
        let backend = OpenAiBackend::new(OpenAiConfig::new("sk-test", "gpt-test")).unwrap();
        assert_eq!(backend.provider(), AiProvider::OpenAi);
        assert_eq!(backend.model_name(), "gpt-test");
    }
}
