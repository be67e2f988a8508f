//! Deterministic mock completion backend for tests.
//!
//! Returns canned responses keyed by prompt substring, records every call
//! for assertions, and can be told to fail to exercise error paths.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mindsift_core::{AiProvider, AiSettings, CompletionBackend, CompletionOptions, Error, Result};

use crate::resolve::ProviderResolver;

/// One recorded completion call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug)]
struct Inner {
    default_response: String,
    /// (prompt substring, response) pairs checked in insertion order.
    mapped_responses: Vec<(String, String)>,
    fail_with: Option<String>,
    calls: Vec<MockCall>,
}

/// Mock backend with builder-style configuration.
#[derive(Clone)]
pub struct MockBackend {
    provider: AiProvider,
    inner: Arc<Mutex<Inner>>,
}

impl MockBackend {
    /// Create a mock backend posing as the Claude vendor.
    pub fn new() -> Self {
        Self {
            provider: AiProvider::Claude,
            inner: Arc::new(Mutex::new(Inner {
                default_response: "{\"skip\": true}".to_string(),
                mapped_responses: Vec::new(),
                fail_with: None,
                calls: Vec::new(),
            })),
        }
    }

    /// Pose as a different vendor.
    pub fn with_provider(mut self, provider: AiProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Set the response returned when no mapping matches.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.inner.lock().unwrap().default_response = response.into();
        self
    }

    /// Return `response` for prompts containing `prompt_contains`.
    pub fn with_response_for(
        self,
        prompt_contains: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.inner
            .lock()
            .unwrap()
            .mapped_responses
            .push((prompt_contains.into(), response.into()));
        self
    }

    /// Make every call fail with a provider error.
    pub fn failing_with(self, message: impl Into<String>) -> Self {
        self.inner.lock().unwrap().fail_with = Some(message.into());
        self
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of completion calls made.
    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().calls.len()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(MockCall {
            prompt: prompt.to_string(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        });

        if let Some(message) = &inner.fail_with {
            return Err(Error::ProviderCall(message.clone()));
        }

        for (needle, response) in &inner.mapped_responses {
            if prompt.contains(needle.as_str()) {
                return Ok(response.clone());
            }
        }

        Ok(inner.default_response.clone())
    }

    fn provider(&self) -> AiProvider {
        self.provider
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Resolver handing out clones of one mock backend, or refusing outright.
pub struct MockResolver {
    backend: Option<MockBackend>,
}

impl MockResolver {
    /// Always resolve to the given backend.
    pub fn with_backend(backend: MockBackend) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Always fail resolution with `NoProviderConfigured`.
    pub fn unconfigured() -> Self {
        Self { backend: None }
    }
}

impl ProviderResolver for MockResolver {
    fn resolve(&self, _settings: &AiSettings) -> Result<Box<dyn CompletionBackend>> {
        match &self.backend {
            Some(backend) => Ok(Box::new(backend.clone())),
            None => Err(Error::NoProviderConfigured),
        }
    }
}
