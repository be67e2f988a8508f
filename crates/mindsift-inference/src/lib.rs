//! # mindsift-inference
//!
//! LLM provider abstraction for mindsift note processing.
//!
//! This crate provides:
//! - Anthropic and OpenAI implementations of the
//!   [`CompletionBackend`](mindsift_core::CompletionBackend) trait
//! - Per-user provider resolution via [`ClientFactory`]
//! - API key validation probes
//! - A deterministic mock backend for tests
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mindsift_crypto::{Vault, VaultConfig};
//! use mindsift_inference::{ClientFactory, ProviderResolver};
//! use mindsift_core::{AiSettings, CompletionOptions};
//! # use uuid::Uuid;
//!
//! # async fn run() -> mindsift_core::Result<()> {
//! let vault = Arc::new(Vault::new(&VaultConfig::from_env()?)?);
//! let factory = ClientFactory::from_env(vault);
//!
//! let settings = AiSettings::for_user(Uuid::new_v4());
//! let backend = factory.resolve(&settings)?;
//! let text = backend.complete("Hello", &CompletionOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod anthropic;
pub mod mock;
pub mod openai;
pub mod resolve;
pub mod validate;

// Re-export core types
pub use mindsift_core::{AiProvider, CompletionBackend, CompletionOptions};

pub use anthropic::{AnthropicBackend, AnthropicConfig};
pub use mock::{MockBackend, MockResolver};
pub use openai::{OpenAiBackend, OpenAiConfig};
pub use resolve::{ClientFactory, ProviderResolver};
pub use validate::{validate_api_key, validate_api_key_at, validate_backend, ApiKeyValidation};
