//! AI settings store implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use mindsift_core::{
    AiProvider, AiSettings, EncryptedSecret, Error, Result, SettingsStore,
};

/// PostgreSQL implementation of [`SettingsStore`].
pub struct PgSettingsStore {
    pool: Pool<Postgres>,
}

impl PgSettingsStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: PgRow) -> AiSettings {
        let user_id: Uuid = row.get("user_id");
        let provider: String = row.get("provider");

        let key_slot = |key: Option<String>, iv: Option<String>| match (key, iv) {
            (Some(ciphertext), Some(iv)) => Some(EncryptedSecret { ciphertext, iv }),
            _ => None,
        };

        AiSettings {
            user_id,
            provider: AiProvider::parse(&provider).unwrap_or(AiProvider::Claude),
            claude_model: row.get("claude_model"),
            openai_model: row.get("openai_model"),
            temperature: row.get("temperature"),
            auto_process: row.get("auto_process"),
            custom_prompt: row.get("custom_prompt"),
            ai_enabled: row.get("ai_enabled"),
            claude_key: key_slot(row.get("claude_key"), row.get("claude_key_iv")),
            openai_key: key_slot(row.get("openai_key"), row.get("openai_key_iv")),
        }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn fetch(&self, user_id: Uuid) -> Result<AiSettings> {
        let row = sqlx::query(
            "SELECT user_id, provider, claude_model, openai_model, temperature,
                    auto_process, custom_prompt, ai_enabled,
                    claude_key, claude_key_iv, openai_key, openai_key_iv
             FROM ai_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row
            .map(Self::parse_row)
            .unwrap_or_else(|| AiSettings::for_user(user_id)))
    }

    async fn update(&self, settings: &AiSettings) -> Result<()> {
        sqlx::query(
            "INSERT INTO ai_settings
                 (user_id, provider, claude_model, openai_model, temperature,
                  auto_process, custom_prompt, ai_enabled,
                  claude_key, claude_key_iv, openai_key, openai_key_iv, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             ON CONFLICT (user_id) DO UPDATE SET
                 provider = EXCLUDED.provider,
                 claude_model = EXCLUDED.claude_model,
                 openai_model = EXCLUDED.openai_model,
                 temperature = EXCLUDED.temperature,
                 auto_process = EXCLUDED.auto_process,
                 custom_prompt = EXCLUDED.custom_prompt,
                 ai_enabled = EXCLUDED.ai_enabled,
                 claude_key = EXCLUDED.claude_key,
                 claude_key_iv = EXCLUDED.claude_key_iv,
                 openai_key = EXCLUDED.openai_key,
                 openai_key_iv = EXCLUDED.openai_key_iv,
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(settings.user_id)
        .bind(settings.provider.as_str())
        .bind(&settings.claude_model)
        .bind(&settings.openai_model)
        .bind(settings.temperature)
        .bind(settings.auto_process)
        .bind(&settings.custom_prompt)
        .bind(settings.ai_enabled)
        .bind(settings.claude_key.as_ref().map(|k| k.ciphertext.clone()))
        .bind(settings.claude_key.as_ref().map(|k| k.iv.clone()))
        .bind(settings.openai_key.as_ref().map(|k| k.ciphertext.clone()))
        .bind(settings.openai_key.as_ref().map(|k| k.iv.clone()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn store_api_key(
        &self,
        user_id: Uuid,
        provider: AiProvider,
        key: EncryptedSecret,
    ) -> Result<()> {
        let mut settings = self.fetch(user_id).await?;
        settings.set_key(provider, Some(key));
        settings.ai_enabled = true;
        self.update(&settings).await
    }

    async fn remove_api_key(&self, user_id: Uuid, provider: AiProvider) -> Result<()> {
        let mut settings = self.fetch(user_id).await?;
        settings.set_key(provider, None);

        // Active-provider invariant: the selection must point at a provider
        // with a usable key, or AI turns off.
        if settings.provider == provider {
            if settings.key_for(provider.other()).is_some() {
                settings.provider = provider.other();
            } else {
                settings.ai_enabled = false;
            }
        }

        self.update(&settings).await
    }
}
