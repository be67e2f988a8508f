//! In-memory store: an arena of records addressed by identifier.
//!
//! Implements every store trait against plain maps behind one mutex.
//! Used by pipeline unit tests and embeddable setups where Postgres is
//! not available; semantics (conditional claim, tag uniqueness, queue
//! backoff) mirror the Postgres implementations.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use mindsift_core::defaults;
use mindsift_core::{
    AiDecision, AiProvider, AiSettings, EncryptedSecret, Error, Idea, IdeaStatus, IdeaStore, Job,
    JobKind, JobQueue, JobStatus, NewIdea, NewNote, Note, NoteStore, ProcessingStatus, Result,
    SettingsStore, Tag, TagStore,
};

#[derive(Default)]
struct State {
    notes: HashMap<Uuid, Note>,
    ideas: Vec<Idea>,
    tags: HashMap<String, Tag>,
    idea_tags: HashSet<(Uuid, Uuid)>,
    settings: HashMap<Uuid, AiSettings>,
    jobs: HashMap<Uuid, Job>,
}

/// In-memory implementation of all mindsift store traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn backoff_after(attempt: i32) -> ChronoDuration {
        let exponent = attempt.saturating_sub(1).clamp(0, 16) as u32;
        ChronoDuration::milliseconds((defaults::JOB_BACKOFF_BASE_MS << exponent) as i64)
    }

    /// Snapshot of a note, for assertions.
    pub fn note(&self, id: Uuid) -> Option<Note> {
        self.inner.lock().unwrap().notes.get(&id).cloned()
    }

    /// Total number of ideas in the arena, for assertions.
    pub fn idea_count(&self) -> usize {
        self.inner.lock().unwrap().ideas.len()
    }

    /// Total number of tag rows in the arena, for assertions.
    pub fn tag_count(&self) -> usize {
        self.inner.lock().unwrap().tags.len()
    }

    /// Snapshot of a job, for assertions.
    pub fn job(&self, id: Uuid) -> Option<Job> {
        self.inner.lock().unwrap().jobs.get(&id).cloned()
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn insert(&self, note: NewNote) -> Result<Note> {
        let now = Utc::now();
        let row = Note {
            id: Uuid::now_v7(),
            user_id: note.user_id,
            title: note.title,
            content: note.content,
            origin: note.origin,
            status: ProcessingStatus::Pending,
            ai_decision: None,
            ai_response: None,
            processing_error: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .lock()
            .unwrap()
            .notes
            .insert(row.id, row.clone());
        Ok(row)
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        self.inner
            .lock()
            .unwrap()
            .notes
            .get(&id)
            .cloned()
            .ok_or(Error::NoteNotFound(id))
    }

    async fn claim_for_processing(&self, id: Uuid) -> Result<bool> {
        let mut state = self.inner.lock().unwrap();
        match state.notes.get_mut(&id) {
            Some(note) if note.status != ProcessingStatus::Processing => {
                note.status = ProcessingStatus::Processing;
                note.processing_error = None;
                note.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_completed(&self, id: Uuid, raw_response: &str) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if let Some(note) = state.notes.get_mut(&id) {
            let now = Utc::now();
            note.status = ProcessingStatus::Completed;
            note.ai_decision = Some(AiDecision::Extracted);
            note.ai_response = Some(raw_response.to_string());
            note.processing_error = None;
            note.processed_at = Some(now);
            note.updated_at = now;
        }
        Ok(())
    }

    async fn mark_skipped(&self, id: Uuid, raw_response: &str) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if let Some(note) = state.notes.get_mut(&id) {
            let now = Utc::now();
            note.status = ProcessingStatus::Skipped;
            note.ai_decision = Some(AiDecision::Skipped);
            note.ai_response = Some(raw_response.to_string());
            note.processing_error = None;
            note.processed_at = Some(now);
            note.updated_at = now;
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        decision: Option<AiDecision>,
        raw_response: Option<&str>,
    ) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if let Some(note) = state.notes.get_mut(&id) {
            let now = Utc::now();
            note.status = ProcessingStatus::Failed;
            note.ai_decision = decision;
            note.processing_error = Some(error.to_string());
            if let Some(raw) = raw_response {
                note.ai_response = Some(raw.to_string());
            }
            note.processed_at = Some(now);
            note.updated_at = now;
        }
        Ok(())
    }

    async fn list_pending(&self, user_id: Option<Uuid>, limit: i64) -> Result<Vec<Note>> {
        let state = self.inner.lock().unwrap();
        let mut pending: Vec<Note> = state
            .notes
            .values()
            .filter(|note| note.status == ProcessingStatus::Pending)
            .filter(|note| user_id.map_or(true, |uid| note.user_id == uid))
            .cloned()
            .collect();
        pending.sort_by_key(|note| note.created_at);
        pending.truncate(limit.max(0) as usize);
        Ok(pending)
    }
}

#[async_trait]
impl IdeaStore for MemoryStore {
    async fn insert(&self, idea: NewIdea) -> Result<Idea> {
        let now = Utc::now();
        let row = Idea {
            id: Uuid::now_v7(),
            user_id: idea.user_id,
            note_id: idea.note_id,
            title: idea.title,
            description: idea.description,
            category: idea.category,
            potential: idea.potential,
            kind: idea.kind,
            status: IdeaStatus::New,
            next_steps: idea.next_steps,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().unwrap().ideas.push(row.clone());
        Ok(row)
    }

    async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<Idea>> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .ideas
            .iter()
            .filter(|idea| idea.note_id == Some(note_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn upsert(&self, name: &str) -> Result<Tag> {
        if name.is_empty() {
            return Err(Error::InvalidInput("Tag name cannot be empty".into()));
        }
        let mut state = self.inner.lock().unwrap();
        let tag = state.tags.entry(name.to_string()).or_insert_with(|| Tag {
            id: Uuid::now_v7(),
            name: name.to_string(),
            created_at: Utc::now(),
        });
        Ok(tag.clone())
    }

    async fn attach_to_idea(&self, idea_id: Uuid, tag_id: Uuid) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .idea_tags
            .insert((idea_id, tag_id));
        Ok(())
    }

    async fn list_for_idea(&self, idea_id: Uuid) -> Result<Vec<Tag>> {
        let state = self.inner.lock().unwrap();
        let mut tags: Vec<Tag> = state
            .tags
            .values()
            .filter(|tag| state.idea_tags.contains(&(idea_id, tag.id)))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn fetch(&self, user_id: Uuid) -> Result<AiSettings> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .settings
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| AiSettings::for_user(user_id)))
    }

    async fn update(&self, settings: &AiSettings) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .settings
            .insert(settings.user_id, settings.clone());
        Ok(())
    }

    async fn store_api_key(
        &self,
        user_id: Uuid,
        provider: AiProvider,
        key: EncryptedSecret,
    ) -> Result<()> {
        let mut settings = SettingsStore::fetch(self, user_id).await?;
        settings.set_key(provider, Some(key));
        settings.ai_enabled = true;
        self.update(&settings).await
    }

    async fn remove_api_key(&self, user_id: Uuid, provider: AiProvider) -> Result<()> {
        let mut settings = SettingsStore::fetch(self, user_id).await?;
        settings.set_key(provider, None);

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

#[async_trait]
impl JobQueue for MemoryStore {
    async fn enqueue(&self, kind: JobKind, payload: JsonValue) -> Result<Uuid> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::now_v7(),
            kind,
            payload,
            status: JobStatus::Pending,
            attempt: 0,
            max_retries: defaults::JOB_MAX_RETRIES,
            error: None,
            next_run_at: now,
            created_at: now,
            started_at: None,
            completed_at: None,
        };
        let id = job.id;
        self.inner.lock().unwrap().jobs.insert(id, job);
        Ok(id)
    }

    async fn enqueue_batch(&self, kind: JobKind, payloads: Vec<JsonValue>) -> Result<Vec<Uuid>> {
        let mut ids = Vec::with_capacity(payloads.len());
        for payload in payloads {
            ids.push(self.enqueue(kind, payload).await?);
        }
        Ok(ids)
    }

    async fn claim_next(&self, kinds: &[JobKind]) -> Result<Option<Job>> {
        let now = Utc::now();
        let mut state = self.inner.lock().unwrap();

        let mut candidates: Vec<(DateTime<Utc>, DateTime<Utc>, Uuid)> = state
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Pending && job.next_run_at <= now)
            .filter(|job| kinds.is_empty() || kinds.contains(&job.kind))
            .map(|job| (job.next_run_at, job.created_at, job.id))
            .collect();
        candidates.sort();

        match candidates.first() {
            Some(&(_, _, id)) => {
                let job = state.jobs.get_mut(&id).ok_or(Error::Internal(
                    "claimed job disappeared from arena".to_string(),
                ))?;
                job.status = JobStatus::Running;
                job.attempt += 1;
                job.started_at = Some(now);
                Ok(Some(job.clone()))
            }
            None => Ok(None),
        }
    }

    async fn complete(&self, job_id: Uuid) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if let Some(job) = state.jobs.get_mut(&job_id) {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if let Some(job) = state.jobs.get_mut(&job_id) {
            job.error = Some(error.to_string());
            if job.attempt < job.max_retries {
                job.status = JobStatus::Pending;
                job.next_run_at = Utc::now() + Self::backoff_after(job.attempt);
                job.started_at = None;
            } else {
                job.status = JobStatus::Failed;
                job.completed_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn pending_count(&self) -> Result<i64> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Pending)
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_note(user_id: Uuid) -> NewNote {
        NewNote {
            user_id,
            title: None,
            content: "note content".to_string(),
            origin: mindsift_core::NoteOrigin::Manual,
        }
    }

    #[tokio::test]
    async fn test_note_lifecycle() {
        let store = MemoryStore::new();
        let note = NoteStore::insert(&store, new_note(Uuid::new_v4())).await.unwrap();
        assert_eq!(note.status, ProcessingStatus::Pending);

        assert!(store.claim_for_processing(note.id).await.unwrap());
        // Second claim loses while the first is in flight.
        assert!(!store.claim_for_processing(note.id).await.unwrap());

        store.mark_completed(note.id, "{}").await.unwrap();
        let note = NoteStore::fetch(&store, note.id).await.unwrap();
        assert_eq!(note.status, ProcessingStatus::Completed);
        assert_eq!(note.ai_decision, Some(AiDecision::Extracted));
        assert!(note.processed_at.is_some());

        // Terminal states are claimable again (reprocess).
        assert!(store.claim_for_processing(note.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_missing_note() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            NoteStore::fetch(&store, id).await,
            Err(Error::NoteNotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_mark_failed_keeps_existing_response() {
        let store = MemoryStore::new();
        let note = NoteStore::insert(&store, new_note(Uuid::new_v4())).await.unwrap();

        store
            .mark_failed(note.id, "parse error", None, Some("raw output"))
            .await
            .unwrap();
        store
            .mark_failed(note.id, "later failure", Some(AiDecision::Error), None)
            .await
            .unwrap();

        let note = NoteStore::fetch(&store, note.id).await.unwrap();
        assert_eq!(note.ai_response.as_deref(), Some("raw output"));
        assert_eq!(note.processing_error.as_deref(), Some("later failure"));
    }

    #[tokio::test]
    async fn test_tag_upsert_dedupes() {
        let store = MemoryStore::new();
        let a = store.upsert("mvp").await.unwrap();
        let b = store.upsert("mvp").await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(store.tag_count(), 1);

        // Case-sensitive names are distinct rows.
        store.upsert("MVP").await.unwrap();
        assert_eq!(store.tag_count(), 2);
    }

    #[tokio::test]
    async fn test_list_pending_is_oldest_first_and_scoped() {
        let store = MemoryStore::new();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        let first = NoteStore::insert(&store, new_note(user_a)).await.unwrap();
        let _second = NoteStore::insert(&store, new_note(user_b)).await.unwrap();
        let third = NoteStore::insert(&store, new_note(user_a)).await.unwrap();

        let all = store.list_pending(None, 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, first.id);

        let scoped = store.list_pending(Some(user_a), 10).await.unwrap();
        assert_eq!(scoped.len(), 2);
        assert_eq!(scoped[0].id, first.id);
        assert_eq!(scoped[1].id, third.id);

        let limited = store.list_pending(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_queue_retry_then_terminal_failure() {
        let store = MemoryStore::new();
        let id = store
            .enqueue(JobKind::Processing, serde_json::json!({"n": 1}))
            .await
            .unwrap();

        // First delivery.
        let job = store.claim_next(&[]).await.unwrap().unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.attempt, 1);

        // Failure re-queues with backoff, so an immediate claim sees nothing.
        store.fail(id, "provider down").await.unwrap();
        assert_eq!(store.pending_count().await.unwrap(), 1);
        assert!(store.claim_next(&[]).await.unwrap().is_none());

        // Exhaust the budget directly.
        {
            let mut state = store.inner.lock().unwrap();
            let job = state.jobs.get_mut(&id).unwrap();
            job.attempt = job.max_retries;
            job.status = JobStatus::Running;
        }
        store.fail(id, "still down").await.unwrap();

        let job = store.job(id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("still down"));
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_claim_filters_by_kind() {
        let store = MemoryStore::new();
        store
            .enqueue(JobKind::Sync, serde_json::json!({}))
            .await
            .unwrap();

        assert!(store
            .claim_next(&[JobKind::Processing])
            .await
            .unwrap()
            .is_none());
        assert!(store.claim_next(&[JobKind::Sync]).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_api_key_failover() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let secret = |s: &str| EncryptedSecret {
            ciphertext: s.to_string(),
            iv: "00".to_string(),
        };

        store
            .store_api_key(user_id, AiProvider::Claude, secret("c"))
            .await
            .unwrap();
        store
            .store_api_key(user_id, AiProvider::OpenAi, secret("o"))
            .await
            .unwrap();

        // Removing the active provider's key fails over to the other.
        store
            .remove_api_key(user_id, AiProvider::Claude)
            .await
            .unwrap();
        let settings = SettingsStore::fetch(&store, user_id).await.unwrap();
        assert_eq!(settings.provider, AiProvider::OpenAi);
        assert!(settings.ai_enabled);

        // Removing the last key disables AI.
        store
            .remove_api_key(user_id, AiProvider::OpenAi)
            .await
            .unwrap();
        let settings = SettingsStore::fetch(&store, user_id).await.unwrap();
        assert!(!settings.ai_enabled);
    }
}
