//! API key validation.
//!
//! Used at key-registration time only: issues a minimal real completion
//! (≤10 tokens) against the vendor and reports the outcome without
//! persisting anything.

use tracing::debug;

use mindsift_core::defaults;
use mindsift_core::{AiProvider, CompletionBackend, CompletionOptions, Result};

use crate::anthropic::{AnthropicBackend, AnthropicConfig};
use crate::openai::{OpenAiBackend, OpenAiConfig};

/// Outcome of a key-validation probe.
#[derive(Debug, Clone)]
pub struct ApiKeyValidation {
    pub valid: bool,
    pub error: Option<String>,
}

fn probe_options() -> CompletionOptions {
    CompletionOptions {
        temperature: 0.0,
        max_tokens: defaults::VALIDATION_MAX_TOKENS,
    }
}

/// Probe a backend with a minimal completion call.
pub async fn validate_backend(backend: &dyn CompletionBackend) -> ApiKeyValidation {
    match backend.complete("Hi", &probe_options()).await {
        Ok(_) => ApiKeyValidation {
            valid: true,
            error: None,
        },
        Err(e) => ApiKeyValidation {
            valid: false,
            error: Some(e.to_string()),
        },
    }
}

/// Validate an API key against its vendor's production endpoint.
pub async fn validate_api_key(provider: AiProvider, api_key: &str) -> Result<ApiKeyValidation> {
    validate_api_key_at(provider, api_key, None).await
}

/// Validate an API key, optionally against a non-default base URL.
pub async fn validate_api_key_at(
    provider: AiProvider,
    api_key: &str,
    base_url: Option<&str>,
) -> Result<ApiKeyValidation> {
    debug!(provider = provider.as_str(), "Validating API key");

    let backend: Box<dyn CompletionBackend> = match provider {
        AiProvider::Claude => {
            let mut config = AnthropicConfig::new(api_key, defaults::CLAUDE_MODEL);
            if let Some(url) = base_url {
                config = config.with_base_url(url);
            }
            Box::new(AnthropicBackend::new(config)?)
        }
        AiProvider::OpenAi => {
            let mut config = OpenAiConfig::new(api_key, defaults::OPENAI_MODEL);
            if let Some(url) = base_url {
                config = config.with_base_url(url);
            }
            Box::new(OpenAiBackend::new(config)?)
        }
    };

    Ok(validate_backend(backend.as_ref()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    #[tokio::test]
    async fn test_valid_key_reports_valid() {
        let backend = MockBackend::new().with_response("OK");
        let validation = validate_backend(&backend).await;
        assert!(validation.valid);
        assert!(validation.error.is_none());
    }

    #[tokio::test]
    async fn test_invalid_key_reports_error() {
        let backend = MockBackend::new().failing_with("invalid x-api-key");
        let validation = validate_backend(&backend).await;
        assert!(!validation.valid);
        assert!(validation.error.unwrap().contains("invalid x-api-key"));
    }

    #[tokio::test]
    async fn test_probe_is_tiny() {
        let backend = MockBackend::new().with_response("OK");
        validate_backend(&backend).await;

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].max_tokens <= defaults::VALIDATION_MAX_TOKENS);
    }
}
