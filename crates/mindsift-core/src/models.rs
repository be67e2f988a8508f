//! Domain models for mindsift.
//!
//! Notes are raw captured text; Ideas are the structured records the AI
//! extraction produces from them. Enum string forms match the wire/storage
//! representation used by the web tier, so `as_str`/`parse` round-trip
//! through both the database and JSON payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

pub use mindsift_crypto::EncryptedSecret;

use crate::defaults;

// =============================================================================
// NOTE
// =============================================================================

/// Where a note came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteOrigin {
    /// Entered directly by the user.
    Manual,
    /// Imported by the external note-sync worker.
    Sync,
}

impl NoteOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Sync => "SYNC",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MANUAL" => Some(Self::Manual),
            "SYNC" => Some(Self::Sync),
            _ => None,
        }
    }
}

/// Position of a note in the extraction state machine.
///
/// `PENDING → PROCESSING → {COMPLETED, FAILED, SKIPPED}`. The terminal
/// states are re-enterable via reprocess, which moves the note back to
/// `PROCESSING` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Skipped,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            "SKIPPED" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Whether the state machine is done with this note (until a reprocess).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

/// Semantic outcome of extraction, distinct from processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AiDecision {
    Extracted,
    Skipped,
    Error,
}

impl AiDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extracted => "EXTRACTED",
            Self::Skipped => "SKIPPED",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "EXTRACTED" => Some(Self::Extracted),
            "SKIPPED" => Some(Self::Skipped),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A raw ingested note awaiting or having undergone AI classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub origin: NoteOrigin,
    pub status: ProcessingStatus,
    pub ai_decision: Option<AiDecision>,
    /// Raw model output, retained for diagnosis.
    pub ai_response: Option<String>,
    pub processing_error: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for creating a note. New notes always start `PENDING`.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub origin: NoteOrigin,
}

// =============================================================================
// IDEA
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdeaCategory {
    Business,
    Ai,
    Finance,
    #[default]
    Thought,
}

impl IdeaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Business => "BUSINESS",
            Self::Ai => "AI",
            Self::Finance => "FINANCE",
            Self::Thought => "THOUGHT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUSINESS" => Some(Self::Business),
            "AI" => Some(Self::Ai),
            "FINANCE" => Some(Self::Finance),
            "THOUGHT" => Some(Self::Thought),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdeaPotential {
    High,
    #[default]
    Medium,
    Low,
}

impl IdeaPotential {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdeaType {
    Platform,
    Product,
    Service,
    Tool,
    #[default]
    Concept,
    Insight,
    Wisdom,
    Tip,
}

impl IdeaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "PLATFORM",
            Self::Product => "PRODUCT",
            Self::Service => "SERVICE",
            Self::Tool => "TOOL",
            Self::Concept => "CONCEPT",
            Self::Insight => "INSIGHT",
            Self::Wisdom => "WISDOM",
            Self::Tip => "TIP",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PLATFORM" => Some(Self::Platform),
            "PRODUCT" => Some(Self::Product),
            "SERVICE" => Some(Self::Service),
            "TOOL" => Some(Self::Tool),
            "CONCEPT" => Some(Self::Concept),
            "INSIGHT" => Some(Self::Insight),
            "WISDOM" => Some(Self::Wisdom),
            "TIP" => Some(Self::Tip),
            _ => None,
        }
    }
}

/// Workflow status of an idea. The pipeline only ever writes `NEW`;
/// later transitions belong to the surrounding system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdeaStatus {
    #[default]
    New,
    InProgress,
    Review,
    Implemented,
    Archived,
}

impl IdeaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::InProgress => "IN_PROGRESS",
            Self::Review => "REVIEW",
            Self::Implemented => "IMPLEMENTED",
            Self::Archived => "ARCHIVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Self::New),
            "IN_PROGRESS" => Some(Self::InProgress),
            "REVIEW" => Some(Self::Review),
            "IMPLEMENTED" => Some(Self::Implemented),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// A structured record extracted from a note.
///
/// The `note_id` back-reference is a lookup relation, not ownership:
/// deleting the note does not cascade to its ideas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub user_id: Uuid,
    pub note_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub category: IdeaCategory,
    pub potential: IdeaPotential,
    pub kind: IdeaType,
    pub status: IdeaStatus,
    pub next_steps: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for creating an idea.
#[derive(Debug, Clone)]
pub struct NewIdea {
    pub user_id: Uuid,
    pub note_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub category: IdeaCategory,
    pub potential: IdeaPotential,
    pub kind: IdeaType,
    pub next_steps: Vec<String>,
}

/// A globally unique tag name shared across all users and ideas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// AI SETTINGS / PROVIDER CREDENTIALS
// =============================================================================

/// One of the two supported LLM vendors.
///
/// Claude is the vendor with an environment-level fallback key
/// (`ANTHROPIC_API_KEY`); OpenAI keys are always per-user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AiProvider {
    Claude,
    #[serde(rename = "OPENAI")]
    OpenAi,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "CLAUDE",
            Self::OpenAi => "OPENAI",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CLAUDE" => Some(Self::Claude),
            "OPENAI" => Some(Self::OpenAi),
            _ => None,
        }
    }

    /// The other vendor, used for key-removal failover.
    pub fn other(&self) -> Self {
        match self {
            Self::Claude => Self::OpenAi,
            Self::OpenAi => Self::Claude,
        }
    }
}

/// Per-user AI configuration and encrypted provider credentials.
#[derive(Debug, Clone)]
pub struct AiSettings {
    pub user_id: Uuid,
    /// Active provider selection.
    pub provider: AiProvider,
    pub claude_model: String,
    pub openai_model: String,
    pub temperature: f32,
    /// Enqueue a processing job automatically on ingestion.
    pub auto_process: bool,
    /// Custom processing prompt; must contain the content placeholder.
    pub custom_prompt: Option<String>,
    pub ai_enabled: bool,
    pub claude_key: Option<EncryptedSecret>,
    pub openai_key: Option<EncryptedSecret>,
}

impl AiSettings {
    /// Default settings for a user with no stored configuration.
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            provider: AiProvider::Claude,
            claude_model: defaults::CLAUDE_MODEL.to_string(),
            openai_model: defaults::OPENAI_MODEL.to_string(),
            temperature: defaults::TEMPERATURE,
            auto_process: true,
            custom_prompt: None,
            ai_enabled: false,
            claude_key: None,
            openai_key: None,
        }
    }

    /// The stored key slot for a provider.
    pub fn key_for(&self, provider: AiProvider) -> Option<&EncryptedSecret> {
        match provider {
            AiProvider::Claude => self.claude_key.as_ref(),
            AiProvider::OpenAi => self.openai_key.as_ref(),
        }
    }

    /// The configured model for a provider.
    pub fn model_for(&self, provider: AiProvider) -> &str {
        match provider {
            AiProvider::Claude => &self.claude_model,
            AiProvider::OpenAi => &self.openai_model,
        }
    }

    /// Replace the stored key slot for a provider.
    pub fn set_key(&mut self, provider: AiProvider, key: Option<EncryptedSecret>) {
        match provider {
            AiProvider::Claude => self.claude_key = key,
            AiProvider::OpenAi => self.openai_key = key,
        }
    }
}

// =============================================================================
// QUEUE JOBS
// =============================================================================

/// Job payload for the note-processing queue.
///
/// Field names are the wire schema shared with the producing web tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingJob {
    pub note_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Action requested of the external note-sync worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncAction {
    Authenticate,
    Sync,
    ExchangeToken,
    LoginPassword,
}

/// Job payload for the external note-sync worker.
///
/// Produced here, consumed entirely outside this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJob {
    pub user_id: Uuid,
    pub action: SyncAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_password: Option<String>,
}

/// Which queue a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Processing,
    Sync,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Sync => "sync",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(Self::Processing),
            "sync" => Some(Self::Sync),
            _ => None,
        }
    }
}

/// Delivery state of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A row in the durable job queue.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub payload: JsonValue,
    pub status: JobStatus,
    /// Delivery attempts so far (0 before the first claim).
    pub attempt: i32,
    pub max_retries: i32,
    pub error: Option<String>,
    /// Earliest time the job may be claimed; pushed forward by backoff.
    pub next_run_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Decode the payload as a processing job.
    pub fn processing_payload(&self) -> crate::Result<ProcessingJob> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_status_roundtrip() {
        for status in [
            ProcessingStatus::Pending,
            ProcessingStatus::Processing,
            ProcessingStatus::Completed,
            ProcessingStatus::Failed,
            ProcessingStatus::Skipped,
        ] {
            assert_eq!(ProcessingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProcessingStatus::parse("bogus"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ProcessingStatus::Pending.is_terminal());
        assert!(!ProcessingStatus::Processing.is_terminal());
        assert!(ProcessingStatus::Completed.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
        assert!(ProcessingStatus::Skipped.is_terminal());
    }

    #[test]
    fn test_idea_enum_defaults() {
        assert_eq!(IdeaCategory::default(), IdeaCategory::Thought);
        assert_eq!(IdeaPotential::default(), IdeaPotential::Medium);
        assert_eq!(IdeaType::default(), IdeaType::Concept);
        assert_eq!(IdeaStatus::default(), IdeaStatus::New);
    }

    #[test]
    fn test_provider_other() {
        assert_eq!(AiProvider::Claude.other(), AiProvider::OpenAi);
        assert_eq!(AiProvider::OpenAi.other(), AiProvider::Claude);
    }

    #[test]
    fn test_settings_defaults() {
        let user_id = Uuid::new_v4();
        let settings = AiSettings::for_user(user_id);
        assert_eq!(settings.provider, AiProvider::Claude);
        assert!(!settings.ai_enabled);
        assert!(settings.claude_key.is_none());
        assert!(settings.openai_key.is_none());
        assert_eq!(settings.temperature, defaults::TEMPERATURE);
    }

    #[test]
    fn test_processing_job_wire_format() {
        let job = ProcessingJob {
            note_id: Uuid::nil(),
            user_id: Uuid::nil(),
            content: "hello".to_string(),
            title: None,
        };
        let json = serde_json::to_value(&job).unwrap();
        assert!(json.get("noteId").is_some());
        assert!(json.get("userId").is_some());
        // Absent title is omitted, not serialized as null.
        assert!(json.get("title").is_none());
    }

    #[test]
    fn test_sync_action_wire_format() {
        assert_eq!(
            serde_json::to_string(&SyncAction::ExchangeToken).unwrap(),
            "\"exchange-token\""
        );
        assert_eq!(
            serde_json::to_string(&SyncAction::LoginPassword).unwrap(),
            "\"login-password\""
        );
    }

    #[test]
    fn test_job_processing_payload_decode() {
        let payload = serde_json::json!({
            "noteId": Uuid::nil(),
            "userId": Uuid::nil(),
            "content": "text",
            "title": "a title",
        });
        let job = Job {
            id: Uuid::new_v4(),
            kind: JobKind::Processing,
            payload,
            status: JobStatus::Pending,
            attempt: 0,
            max_retries: 3,
            error: None,
            next_run_at: Utc::now(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        let decoded = job.processing_payload().unwrap();
        assert_eq!(decoded.title.as_deref(), Some("a title"));
    }
}
