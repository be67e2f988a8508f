//! Per-user provider resolution.
//!
//! Turns a user's stored settings into a concrete [`CompletionBackend`].
//! The order deliberately prefers an explicit non-default selection over
//! silent fallback, then falls back toward the vendor with an
//! environment-level default key:
//!
//! 1. selected provider is OpenAI and a stored key decrypts → OpenAI
//! 2. a stored Claude key decrypts → Claude
//! 3. a process-wide `ANTHROPIC_API_KEY` exists → Claude, with the
//!    user's configured model and temperature
//! 4. otherwise `NoProviderConfigured`
//!
//! A stored key that fails to decrypt is fatal for the resolution — it
//! never silently falls through to a weaker path.

use std::sync::Arc;

use tracing::debug;

use mindsift_core::defaults;
use mindsift_core::{AiProvider, AiSettings, CompletionBackend, Error, Result};
use mindsift_crypto::Vault;

use crate::anthropic::{AnthropicBackend, AnthropicConfig};
use crate::openai::{OpenAiBackend, OpenAiConfig};

/// Resolution of user settings into a concrete completion backend.
///
/// The seam between the pipeline and the vendor clients; tests substitute
/// a canned resolver here.
pub trait ProviderResolver: Send + Sync {
    fn resolve(&self, settings: &AiSettings) -> Result<Box<dyn CompletionBackend>>;
}

/// Factory resolving completion backends for users.
///
/// Constructed once per worker context with an explicit vault and
/// fallback key; there is no hidden process-wide client state.
pub struct ClientFactory {
    vault: Arc<Vault>,
    env_claude_key: Option<String>,
    /// Base-URL overrides, used by tests to point at local servers.
    anthropic_base_url: Option<String>,
    openai_base_url: Option<String>,
}

impl ClientFactory {
    /// Create a factory with no environment fallback key.
    pub fn new(vault: Arc<Vault>) -> Self {
        Self {
            vault,
            env_claude_key: None,
            anthropic_base_url: None,
            openai_base_url: None,
        }
    }

    /// Create a factory reading the Claude fallback key from
    /// `ANTHROPIC_API_KEY`.
    pub fn from_env(vault: Arc<Vault>) -> Self {
        let env_claude_key = std::env::var(defaults::ENV_ANTHROPIC_API_KEY)
            .ok()
            .filter(|key| !key.is_empty());
        Self::new(vault).with_env_claude_key(env_claude_key)
    }

    /// Set the process-wide Claude fallback key.
    pub fn with_env_claude_key(mut self, key: Option<String>) -> Self {
        self.env_claude_key = key;
        self
    }

    /// Point the Anthropic backend at a different base URL.
    pub fn with_anthropic_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.anthropic_base_url = Some(base_url.into());
        self
    }

    /// Point the OpenAI backend at a different base URL.
    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = Some(base_url.into());
        self
    }

    fn resolve_settings(&self, settings: &AiSettings) -> Result<Box<dyn CompletionBackend>> {
        // (1) explicit OpenAI selection with a stored key
        if settings.provider == AiProvider::OpenAi {
            if let Some(sealed) = settings.key_for(AiProvider::OpenAi) {
                let api_key = self.vault.decrypt(sealed)?;
                debug!(user_id = %settings.user_id, provider = "openai", "Resolved stored key");
                return self.openai_backend(api_key, settings);
            }
        }

        // (2) stored Claude key
        if let Some(sealed) = settings.key_for(AiProvider::Claude) {
            let api_key = self.vault.decrypt(sealed)?;
            debug!(user_id = %settings.user_id, provider = "claude", "Resolved stored key");
            return self.anthropic_backend(api_key, settings);
        }

        // (3) process-wide Claude fallback
        if let Some(api_key) = &self.env_claude_key {
            debug!(user_id = %settings.user_id, provider = "claude", "Resolved environment key");
            return self.anthropic_backend(api_key.clone(), settings);
        }

        // (4) nothing usable
        Err(Error::NoProviderConfigured)
    }

    fn anthropic_backend(
        &self,
        api_key: String,
        settings: &AiSettings,
    ) -> Result<Box<dyn CompletionBackend>> {
        let mut config = AnthropicConfig::new(api_key, settings.claude_model.clone());
        if let Some(base_url) = &self.anthropic_base_url {
            config = config.with_base_url(base_url.clone());
        }
        Ok(Box::new(AnthropicBackend::new(config)?))
    }

    fn openai_backend(
        &self,
        api_key: String,
        settings: &AiSettings,
    ) -> Result<Box<dyn CompletionBackend>> {
        let mut config = OpenAiConfig::new(api_key, settings.openai_model.clone());
        if let Some(base_url) = &self.openai_base_url {
            config = config.with_base_url(base_url.clone());
        }
        Ok(Box::new(OpenAiBackend::new(config)?))
    }
}

impl ProviderResolver for ClientFactory {
    fn resolve(&self, settings: &AiSettings) -> Result<Box<dyn CompletionBackend>> {
        self.resolve_settings(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindsift_crypto::{KdfParams, VaultConfig};
    use uuid::Uuid;

    fn test_vault() -> Arc<Vault> {
        let config = VaultConfig::new("resolver-test-passphrase").with_kdf(KdfParams::low_memory());
        Arc::new(Vault::new(&config).unwrap())
    }

    fn settings_with(
        vault: &Vault,
        provider: AiProvider,
        claude_key: Option<&str>,
        openai_key: Option<&str>,
    ) -> AiSettings {
        let mut settings = AiSettings::for_user(Uuid::new_v4());
        settings.provider = provider;
        settings.claude_key = claude_key.map(|k| vault.encrypt(k).unwrap());
        settings.openai_key = openai_key.map(|k| vault.encrypt(k).unwrap());
        settings.ai_enabled = true;
        settings
    }

    #[test]
    fn test_openai_selection_with_stored_key_wins() {
        let vault = test_vault();
        let factory = ClientFactory::new(vault.clone());
        let settings = settings_with(&vault, AiProvider::OpenAi, Some("ck"), Some("ok"));

        let backend = factory.resolve(&settings).unwrap();
        assert_eq!(backend.provider(), AiProvider::OpenAi);
    }

    #[test]
    fn test_openai_selection_without_key_falls_back_to_claude() {
        let vault = test_vault();
        let factory = ClientFactory::new(vault.clone());
        let settings = settings_with(&vault, AiProvider::OpenAi, Some("ck"), None);

        let backend = factory.resolve(&settings).unwrap();
        assert_eq!(backend.provider(), AiProvider::Claude);
    }

    #[test]
    fn test_claude_selection_ignores_openai_key() {
        let vault = test_vault();
        let factory = ClientFactory::new(vault.clone());
        // Selected Claude, only OpenAI key stored, no env key: resolution
        // does not silently use the unselected vendor's key.
        let settings = settings_with(&vault, AiProvider::Claude, None, Some("ok"));

        let result = factory.resolve(&settings);
        assert!(matches!(result, Err(Error::NoProviderConfigured)));
    }

    #[test]
    fn test_env_fallback_used_when_no_stored_keys() {
        let vault = test_vault();
        let factory =
            ClientFactory::new(vault.clone()).with_env_claude_key(Some("env-key".to_string()));
        let settings = settings_with(&vault, AiProvider::Claude, None, None);

        let backend = factory.resolve(&settings).unwrap();
        assert_eq!(backend.provider(), AiProvider::Claude);
        // Env fallback still honors the user's model selection.
        assert_eq!(backend.model_name(), settings.claude_model);
    }

    #[test]
    fn test_no_provider_configured() {
        let vault = test_vault();
        let factory = ClientFactory::new(vault.clone());
        let settings = settings_with(&vault, AiProvider::Claude, None, None);

        assert!(matches!(
            factory.resolve(&settings),
            Err(Error::NoProviderConfigured)
        ));
    }

    #[test]
    fn test_corrupt_stored_key_is_fatal_not_fallback() {
        let vault = test_vault();
        let factory =
            ClientFactory::new(vault.clone()).with_env_claude_key(Some("env-key".to_string()));
        let mut settings = settings_with(&vault, AiProvider::Claude, Some("ck"), None);

        // Corrupt the stored blob: resolution must fail rather than slide
        // to the environment key.
        let mut bytes = hex::decode(&settings.claude_key.as_ref().unwrap().ciphertext).unwrap();
        bytes[0] ^= 0x01;
        settings.claude_key.as_mut().unwrap().ciphertext = hex::encode(bytes);

        assert!(matches!(
            factory.resolve(&settings),
            Err(Error::Credential(_))
        ));
    }
}
