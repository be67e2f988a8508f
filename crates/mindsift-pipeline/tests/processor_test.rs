//! End-to-end pipeline tests over the in-memory store and mock backend.

use std::sync::Arc;

use uuid::Uuid;

use mindsift_core::{
    AiDecision, AiSettings, Error, NewNote, NoteOrigin, NoteStore, ProcessingStatus,
    SettingsStore,
};
use mindsift_db::MemoryStore;
use mindsift_inference::{MockBackend, MockResolver};
use mindsift_pipeline::{BatchRunner, NoteProcessor, ProcessOutcome};

const EXTRACTION_RESPONSE: &str = r#"{
    "skip": false,
    "title": "Invoice Tracker",
    "description": "A subscription tool for freelancers to track invoices.",
    "category": "business",
    "potential": "vysoký",
    "type": "produkt",
    "tags": ["saas", "finance"],
    "next_steps": ["Validate demand with ten freelancers"]
}"#;

fn rig(resolver: MockResolver) -> (Arc<MemoryStore>, Arc<NoteProcessor>) {
    let store = Arc::new(MemoryStore::new());
    let processor = Arc::new(NoteProcessor::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(resolver),
    ));
    (store, processor)
}

async fn seed_note(store: &MemoryStore, content: &str) -> Uuid {
    store
        .insert(NewNote {
            user_id: Uuid::new_v4(),
            title: None,
            content: content.to_string(),
            origin: NoteOrigin::Manual,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn extraction_creates_idea_with_normalized_fields() {
    let backend = MockBackend::new().with_response(EXTRACTION_RESPONSE);
    let (store, processor) = rig(MockResolver::with_backend(backend));

    let note_id = seed_note(
        &store,
        "Build a subscription tool for freelancers to track invoices",
    )
    .await;

    let outcome = processor.process(note_id).await.unwrap();
    let idea = match outcome {
        ProcessOutcome::Completed { idea } => idea,
        other => panic!("expected completion, got {:?}", other),
    };

    assert_eq!(idea.title, "Invoice Tracker");
    assert_eq!(idea.category.as_str(), "BUSINESS");
    assert_eq!(idea.potential.as_str(), "HIGH");
    assert_eq!(idea.kind.as_str(), "PRODUCT");
    assert_eq!(idea.status.as_str(), "NEW");
    assert_eq!(idea.note_id, Some(note_id));

    let tags = mindsift_core::TagStore::list_for_idea(&*store, idea.id)
        .await
        .unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["finance", "saas"]);

    let note = store.note(note_id).unwrap();
    assert_eq!(note.status, ProcessingStatus::Completed);
    assert_eq!(note.ai_decision, Some(AiDecision::Extracted));
    assert_eq!(note.ai_response.as_deref(), Some(EXTRACTION_RESPONSE));
    assert!(note.processed_at.is_some());
}

#[tokio::test]
async fn skip_response_creates_no_idea() {
    let backend = MockBackend::new().with_response(r#"{"skip": true}"#);
    let (store, processor) = rig(MockResolver::with_backend(backend));

    let note_id = seed_note(&store, "buy milk, eggs, bread").await;
    let outcome = processor.process(note_id).await.unwrap();

    assert!(matches!(outcome, ProcessOutcome::Skipped));
    assert_eq!(store.idea_count(), 0);

    let note = store.note(note_id).unwrap();
    assert_eq!(note.status, ProcessingStatus::Skipped);
    assert_eq!(note.ai_decision, Some(AiDecision::Skipped));
}

#[tokio::test]
async fn no_provider_configured_fails_note() {
    let (store, processor) = rig(MockResolver::unconfigured());

    let note_id = seed_note(&store, "an idea nobody will hear").await;
    let err = processor.process(note_id).await.unwrap_err();
    assert!(matches!(err, Error::NoProviderConfigured));

    let note = store.note(note_id).unwrap();
    assert_eq!(note.status, ProcessingStatus::Failed);
    assert_eq!(
        note.processing_error.as_deref(),
        Some("No AI provider configured")
    );
}

#[tokio::test]
async fn provider_failure_fails_note_with_error_decision() {
    let backend = MockBackend::new().failing_with("connection timed out");
    let (store, processor) = rig(MockResolver::with_backend(backend));

    let note_id = seed_note(&store, "some note").await;
    let err = processor.process(note_id).await.unwrap_err();
    assert!(matches!(err, Error::ProviderCall(_)));

    let note = store.note(note_id).unwrap();
    assert_eq!(note.status, ProcessingStatus::Failed);
    assert_eq!(note.ai_decision, Some(AiDecision::Error));
    assert!(note
        .processing_error
        .unwrap()
        .contains("connection timed out"));
}

#[tokio::test]
async fn unparsable_response_fails_note_and_keeps_raw_text() {
    let backend = MockBackend::new().with_response("I have no JSON for you today.");
    let (store, processor) = rig(MockResolver::with_backend(backend));

    let note_id = seed_note(&store, "some note").await;
    let err = processor.process(note_id).await.unwrap_err();
    assert!(matches!(err, Error::UnparsableResponse));

    let note = store.note(note_id).unwrap();
    assert_eq!(note.status, ProcessingStatus::Failed);
    assert_eq!(
        note.processing_error.as_deref(),
        Some("Failed to parse AI response")
    );
    // Raw output is retained for diagnosis.
    assert_eq!(
        note.ai_response.as_deref(),
        Some("I have no JSON for you today.")
    );
    // The parse path records no decision.
    assert_eq!(note.ai_decision, None);
}

#[tokio::test]
async fn process_never_leaves_processing_status() {
    // One success, one provider failure, one parse failure, one skip: all
    // must land terminal.
    let cases: Vec<MockBackend> = vec![
        MockBackend::new().with_response(EXTRACTION_RESPONSE),
        MockBackend::new().failing_with("boom"),
        MockBackend::new().with_response("no json"),
        MockBackend::new().with_response(r#"{"skip": true}"#),
    ];

    for backend in cases {
        let (store, processor) = rig(MockResolver::with_backend(backend));
        let note_id = seed_note(&store, "note").await;
        let _ = processor.process(note_id).await;

        let status = store.note(note_id).unwrap().status;
        assert!(status.is_terminal(), "non-terminal status: {:?}", status);
    }
}

#[tokio::test]
async fn missing_note_is_reported_not_recorded() {
    let (store, processor) = rig(MockResolver::with_backend(MockBackend::new()));

    let ghost = Uuid::new_v4();
    let err = processor.process(ghost).await.unwrap_err();
    assert!(matches!(err, Error::NoteNotFound(id) if id == ghost));
    assert_eq!(store.idea_count(), 0);
}

#[tokio::test]
async fn tag_upsert_is_idempotent_across_notes() {
    let response = r#"{"skip": false, "title": "A", "tags": ["mvp", "mvp"]}"#;
    let backend = MockBackend::new().with_response(response);
    let (store, processor) = rig(MockResolver::with_backend(backend));

    let first = seed_note(&store, "first note").await;
    let second = seed_note(&store, "second note").await;
    processor.process(first).await.unwrap();
    processor.process(second).await.unwrap();

    // Two ideas, one shared tag row.
    assert_eq!(store.idea_count(), 2);
    assert_eq!(store.tag_count(), 1);

    let first_ideas = mindsift_core::IdeaStore::list_for_note(&*store, first)
        .await
        .unwrap();
    let second_ideas = mindsift_core::IdeaStore::list_for_note(&*store, second)
        .await
        .unwrap();
    for idea in first_ideas.iter().chain(second_ideas.iter()) {
        let tags = mindsift_core::TagStore::list_for_idea(&*store, idea.id)
            .await
            .unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "mvp");
    }
}

#[tokio::test]
async fn reprocessing_failed_note_can_complete() {
    let backend = MockBackend::new().failing_with("transient outage");
    let (store, processor) = rig(MockResolver::with_backend(backend));

    let note_id = seed_note(&store, "persistent idea").await;
    processor.process(note_id).await.unwrap_err();
    assert_eq!(store.note(note_id).unwrap().status, ProcessingStatus::Failed);

    // Operator retries after the outage clears.
    let backend = MockBackend::new().with_response(EXTRACTION_RESPONSE);
    let retry_processor = NoteProcessor::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(MockResolver::with_backend(backend)),
    );

    retry_processor.process(note_id).await.unwrap();
    let note = store.note(note_id).unwrap();
    assert_eq!(note.status, ProcessingStatus::Completed);
    assert!(note.processing_error.is_none());
}

#[tokio::test]
async fn reprocessing_completed_note_appends_new_idea() {
    let backend = MockBackend::new().with_response(EXTRACTION_RESPONSE);
    let (store, processor) = rig(MockResolver::with_backend(backend));

    let note_id = seed_note(&store, "idea worth extracting twice").await;
    processor.process(note_id).await.unwrap();
    processor.process(note_id).await.unwrap();

    // Re-extraction appends; the prior idea survives.
    let ideas = mindsift_core::IdeaStore::list_for_note(&*store, note_id)
        .await
        .unwrap();
    assert_eq!(ideas.len(), 2);
}

#[tokio::test]
async fn invalid_custom_template_fails_note() {
    let backend = MockBackend::new().with_response(EXTRACTION_RESPONSE);
    let (store, processor) = rig(MockResolver::with_backend(backend));

    let note_id = seed_note(&store, "note body").await;
    let user_id = NoteStore::fetch(&*store, note_id).await.unwrap().user_id;

    let mut settings = AiSettings::for_user(user_id);
    settings.custom_prompt = Some("a template with no placeholder".to_string());
    SettingsStore::update(&*store, &settings).await.unwrap();

    let err = processor.process(note_id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidTemplate(_)));

    let note = store.note(note_id).unwrap();
    assert_eq!(note.status, ProcessingStatus::Failed);
}

#[tokio::test]
async fn custom_template_and_temperature_are_used() {
    let backend = MockBackend::new().with_response(r#"{"skip": true}"#);
    let (store, processor) = rig(MockResolver::with_backend(backend.clone()));

    let note_id = seed_note(&store, "the body").await;
    let user_id = NoteStore::fetch(&*store, note_id).await.unwrap().user_id;

    let mut settings = AiSettings::for_user(user_id);
    settings.custom_prompt = Some("CUSTOM MARKER {{NOTE_CONTENT}} END".to_string());
    settings.temperature = 0.15;
    SettingsStore::update(&*store, &settings).await.unwrap();

    processor.process(note_id).await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.starts_with("CUSTOM MARKER the body"));
    assert_eq!(calls[0].temperature, 0.15);
}

#[tokio::test]
async fn note_title_is_prefixed_into_prompt() {
    let backend = MockBackend::new().with_response(r#"{"skip": true}"#);
    let (store, processor) = rig(MockResolver::with_backend(backend.clone()));

    let note = store
        .insert(NewNote {
            user_id: Uuid::new_v4(),
            title: Some("Shopping".to_string()),
            content: "milk and eggs".to_string(),
            origin: NoteOrigin::Sync,
        })
        .await
        .unwrap();

    processor.process(note.id).await.unwrap();

    let calls = backend.calls();
    assert!(calls[0].prompt.contains("Title: Shopping\n\nmilk and eggs"));
}

#[tokio::test]
async fn batch_runner_tallies_processed_and_errors() {
    // The mock fails only for the poisoned note's content.
    let backend = MockBackend::new()
        .with_response(EXTRACTION_RESPONSE)
        .with_response_for("poisoned", "not json at all");
    let (store, processor) = rig(MockResolver::with_backend(backend));

    let user = Uuid::new_v4();
    for content in ["good note one", "poisoned note", "good note two"] {
        store
            .insert(NewNote {
                user_id: user,
                title: None,
                content: content.to_string(),
                origin: NoteOrigin::Manual,
            })
            .await
            .unwrap();
    }
    // Another user's note stays untouched when scoped.
    let other = seed_note(&store, "someone else's note").await;

    let runner = BatchRunner::new(store.clone(), processor);
    let report = runner.process_pending(Some(user), None).await.unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.errors, 1);
    assert_eq!(
        store.note(other).unwrap().status,
        ProcessingStatus::Pending
    );
}

#[tokio::test]
async fn batch_runner_honors_limit() {
    let backend = MockBackend::new().with_response(r#"{"skip": true}"#);
    let (store, processor) = rig(MockResolver::with_backend(backend));

    for i in 0..5 {
        seed_note(&store, &format!("note {i}")).await;
    }

    let runner = BatchRunner::new(store.clone(), processor);
    let report = runner.process_pending(None, Some(2)).await.unwrap();
    assert_eq!(report.processed, 2);

    let remaining = store.list_pending(None, 10).await.unwrap();
    assert_eq!(remaining.len(), 3);
}
