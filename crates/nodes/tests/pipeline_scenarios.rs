//! End-to-end pipeline scenarios against a scripted language model and an
//! in-memory record store.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use nodes::{Orchestrator, PipelineSettings, QuestionsOutcome};
use pipeline::errors::{MSG_GENERATION_FAILED, MSG_MISCONFIGURED, MSG_POLICY_FALLBACK};
use pipeline::{
    AuditKind, CompletionRequest, ErrorBody, GenerationMode, GenerationRequest, LanguageModel,
    LlmError, PipelineError, RecordStore, StoreDocument, StoreError, UserId,
};
use pretty_assertions::assert_eq;
use store::MemoryStore;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Replies with queued results in order and records every request it saw.
struct ScriptedModel {
    configured: bool,
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            configured: false,
            replies: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<CompletionRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.seen.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Transport("script exhausted".to_string())))
    }
}

/// A [`MemoryStore`] whose `persist` fails on the given call (1-based).
struct FailingStore {
    inner: MemoryStore,
    fail_on: usize,
    attempts: Mutex<usize>,
}

impl FailingStore {
    fn new(inner: MemoryStore, fail_on: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_on,
            attempts: Mutex::new(0),
        })
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn load(&self) -> Result<StoreDocument, StoreError> {
        self.inner.load().await
    }

    async fn persist(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if attempt == self.fail_on {
            return Err(StoreError::Io(std::io::Error::other(
                "/srv/taskgen/data.json: no space left on device",
            )));
        }
        self.inner.persist(document).await
    }
}

fn ok(text: &str) -> Result<String, LlmError> {
    Ok(text.to_string())
}

const APPROVE: &str = r#"{"approved": true}"#;

fn user() -> UserId {
    UserId::new("user-1").unwrap()
}

fn seeded_store(usage: u64) -> Arc<MemoryStore> {
    let mut doc = StoreDocument::default();
    doc.user_mut(&user()).ai_usage_count = usage;
    Arc::new(MemoryStore::with_document(doc))
}

fn orchestrator(model: Arc<ScriptedModel>, store: Arc<MemoryStore>) -> Orchestrator {
    Orchestrator::new(model, store, PipelineSettings::default())
}

fn entries_of(doc: &StoreDocument, kind: AuditKind) -> usize {
    doc.audit_entries().iter().filter(|e| e.kind == kind).count()
}

// ---------------------------------------------------------------------------
// Scenario 1: approved basic generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn approved_basic_generation_returns_content_and_increments_usage() {
    let model = ScriptedModel::new(vec![
        ok(APPROVE),
        ok("\"Buy fruit, vegetables and bread at the corner shop.\""),
    ]);
    let store = seeded_store(4);
    let pipeline = orchestrator(model.clone(), store.clone());

    let response = pipeline
        .generate_basic(
            GenerationRequest::new(user(), "Buy groceries")
                .with_description("")
                .with_free_prompt(""),
        )
        .await
        .expect("generation should succeed");

    assert!(response.success);
    assert_eq!(
        response.content,
        "Buy fruit, vegetables and bread at the corner shop."
    );
    assert_eq!(response.usage_count, 5);

    let doc = store.snapshot().await;
    assert_eq!(doc.usage_count(&user()), 5);
    assert_eq!(entries_of(&doc, AuditKind::Moderation), 1);
    assert_eq!(entries_of(&doc, AuditKind::Generation), 1);
    let generation = doc
        .audit_entries()
        .into_iter()
        .find(|e| e.kind == AuditKind::Generation)
        .unwrap();
    assert_eq!(generation.mode, Some(GenerationMode::Basic));

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].temperature.as_f64(), 0.0);
    assert!(calls[0].user.starts_with("Title: Buy groceries"));
}

// ---------------------------------------------------------------------------
// Scenario 2: moderation rejection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_content_returns_reason_and_leaves_usage_alone() {
    let model = ScriptedModel::new(vec![ok(
        r#"{"approved": false, "reason": "Incitement to violence is not allowed."}"#,
    )]);
    let store = seeded_store(4);
    let pipeline = orchestrator(model.clone(), store.clone());

    let err = pipeline
        .generate_basic(GenerationRequest::new(user(), "kill all members of X group"))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(
        err.to_body().reason.as_deref(),
        Some("Incitement to violence is not allowed.")
    );

    let doc = store.snapshot().await;
    assert_eq!(doc.usage_count(&user()), 4);
    assert_eq!(doc.ai_logs.len(), 1);
    assert_eq!(entries_of(&doc, AuditKind::Moderation), 1);
    assert_eq!(doc.audit_entries()[0].output["approved"], false);
    // The generator is never called.
    assert_eq!(model.calls().len(), 1);
}

#[tokio::test]
async fn rejection_without_reason_uses_policy_fallback() {
    let model = ScriptedModel::new(vec![ok(r#"{"approved": false}"#)]);
    let pipeline = orchestrator(model, seeded_store(0));

    let err = pipeline
        .generate_advanced(GenerationRequest::new(user(), "asdkjh qwe zzz"))
        .await
        .unwrap_err();

    assert_matches!(err, PipelineError::ModerationRejected { ref reason } if reason == MSG_POLICY_FALLBACK);
}

// ---------------------------------------------------------------------------
// Scenario 3: generation failure after approval
// ---------------------------------------------------------------------------

#[tokio::test]
async fn network_error_during_generation_keeps_moderation_log() {
    let model = ScriptedModel::new(vec![
        ok(APPROVE),
        Err(LlmError::Transport("connection reset".to_string())),
    ]);
    let store = seeded_store(4);
    let pipeline = orchestrator(model, store.clone());

    let err = pipeline
        .generate_basic(GenerationRequest::new(user(), "Buy groceries"))
        .await
        .unwrap_err();

    assert_matches!(err, PipelineError::Generation(_));
    assert_eq!(err.to_body().error, MSG_GENERATION_FAILED);
    assert!(!serde_json::to_string(&err.to_body())
        .unwrap()
        .contains("connection reset"));

    let doc = store.snapshot().await;
    assert_eq!(entries_of(&doc, AuditKind::Moderation), 1);
    assert_eq!(entries_of(&doc, AuditKind::Generation), 0);
    assert_eq!(doc.usage_count(&user()), 4);
}

#[tokio::test]
async fn rejected_credentials_map_to_misconfiguration() {
    let model = ScriptedModel::new(vec![
        ok(APPROVE),
        Err(LlmError::Unauthorized { status: 401 }),
    ]);
    let pipeline = orchestrator(model, seeded_store(0));

    let err = pipeline
        .generate_basic(GenerationRequest::new(user(), "Buy groceries"))
        .await
        .unwrap_err();

    assert_matches!(err, PipelineError::Configuration(_));
    assert_eq!(err.to_body().error, MSG_MISCONFIGURED);
}

// ---------------------------------------------------------------------------
// Fail-open moderation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unparseable_moderation_reply_fails_open() {
    for reply in ["", "I think this is fine.", "{approved: maybe", "[1, 2, 3]"] {
        let model = ScriptedModel::new(vec![ok(reply), ok("Walk the dog for 30 minutes.")]);
        let store = seeded_store(0);
        let pipeline = orchestrator(model, store.clone());

        let response = pipeline
            .generate_basic(GenerationRequest::new(user(), "Walk the dog"))
            .await
            .unwrap_or_else(|e| panic!("reply {reply:?} should fail open, got {e}"));

        assert_eq!(response.usage_count, 1);
        let doc = store.snapshot().await;
        assert_eq!(doc.audit_entries()[0].output["approved"], true);
    }
}

#[tokio::test]
async fn failed_moderation_call_fails_open() {
    let model = ScriptedModel::new(vec![
        Err(LlmError::Timeout),
        ok("Walk the dog for 30 minutes."),
    ]);
    let pipeline = orchestrator(model, seeded_store(0));

    let response = pipeline
        .generate_basic(GenerationRequest::new(user(), "Walk the dog"))
        .await
        .expect("moderation failure should not block generation");
    assert_eq!(response.content, "Walk the dog for 30 minutes.");
}

// ---------------------------------------------------------------------------
// Short-circuits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blank_title_is_rejected_before_any_remote_call() {
    for title in ["", "   ", "\t\n"] {
        let model = ScriptedModel::new(vec![ok(APPROVE), ok("unused")]);
        let store = seeded_store(2);
        let pipeline = orchestrator(model.clone(), store.clone());

        let err = pipeline
            .generate_basic(GenerationRequest::new(user(), title))
            .await
            .unwrap_err();

        assert_matches!(err, PipelineError::Validation);
        assert_eq!(err.status_code(), 400);
        assert!(model.calls().is_empty());
        assert_eq!(store.persist_count(), 0);
    }
}

#[tokio::test]
async fn unconfigured_model_short_circuits_without_logging() {
    let model = ScriptedModel::unconfigured();
    let store = seeded_store(0);
    let pipeline = orchestrator(model.clone(), store.clone());

    let err = pipeline
        .questions(GenerationRequest::new(user(), "Buy groceries"))
        .await
        .unwrap_err();

    assert_matches!(err, PipelineError::ServiceUnavailable);
    assert_eq!(err.status_code(), 503);
    assert!(model.calls().is_empty());
    assert_eq!(store.persist_count(), 0);
}

// ---------------------------------------------------------------------------
// Questions and advanced mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn questions_are_returned_without_accounting() {
    let model = ScriptedModel::new(vec![
        ok(APPROVE),
        ok(r#"["How many guests?", "What is the budget?", "Which date?"]"#),
    ]);
    let store = seeded_store(3);
    let pipeline = orchestrator(model, store.clone());

    let outcome = pipeline
        .questions(GenerationRequest::new(user(), "Plan birthday party"))
        .await
        .expect("questions should succeed");

    assert_matches!(outcome, QuestionsOutcome::Questions(ref r) if r.questions.len() == 3);

    let doc = store.snapshot().await;
    assert_eq!(entries_of(&doc, AuditKind::Generation), 0);
    assert_eq!(entries_of(&doc, AuditKind::Moderation), 1);
    assert_eq!(doc.usage_count(&user()), 3);
}

#[tokio::test]
async fn empty_question_list_proceeds_to_advanced_generation() {
    let model = ScriptedModel::new(vec![
        ok(APPROVE),
        ok("[]"),
        ok("Book a table for two at 8pm on Friday."),
    ]);
    let store = seeded_store(0);
    let pipeline = orchestrator(model.clone(), store.clone());

    let outcome = pipeline
        .questions(
            GenerationRequest::new(user(), "Book dinner").with_free_prompt("Friday, 8pm, two people"),
        )
        .await
        .expect("pipeline should generate directly");

    let response = match outcome {
        QuestionsOutcome::Generated(response) => response,
        QuestionsOutcome::Questions(q) => panic!("unexpected questions step: {q:?}"),
    };
    assert_eq!(response.content, "Book a table for two at 8pm on Friday.");
    assert_eq!(response.usage_count, 1);

    let calls = model.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[2].user.contains("Additional instructions: Friday, 8pm, two people"));
    assert!(!calls[2].user.contains("Clarifications"));

    let doc = store.snapshot().await;
    let generation = doc
        .audit_entries()
        .into_iter()
        .find(|e| e.kind == AuditKind::Generation)
        .expect("generation entry");
    assert_eq!(generation.mode, Some(GenerationMode::Advanced));
}

#[tokio::test]
async fn advanced_generation_includes_answered_questions_only() {
    let model = ScriptedModel::new(vec![ok(APPROVE), ok("Plan a party for 12 guests.")]);
    let pipeline = orchestrator(model.clone(), seeded_store(0));

    let request = GenerationRequest::new(user(), "Plan birthday party")
        .with_answer(0, "How many guests?", "12")
        .with_answer(1, "What is the budget?", " ");

    let response = pipeline
        .generate_advanced(request)
        .await
        .expect("advanced generation should succeed");
    assert_eq!(response.usage_count, 1);

    let prompt = &model.calls()[1].user;
    assert!(prompt.contains("Q: How many guests?\n  A: 12"));
    assert!(!prompt.contains("budget"));
}

// ---------------------------------------------------------------------------
// Creativity, usage stats, audit listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stored_creativity_drives_generation_temperature() {
    let model = ScriptedModel::new(vec![ok(APPROVE), ok("Done.")]);
    let pipeline = orchestrator(model.clone(), seeded_store(0));

    let stored = pipeline.set_creativity(&user(), 150).await.unwrap();
    assert_eq!(stored.as_u8(), 100);

    pipeline
        .generate_basic(GenerationRequest::new(user(), "Tidy desk"))
        .await
        .unwrap();

    let calls = model.calls();
    assert_eq!(calls[0].temperature.as_f64(), 0.0);
    assert_eq!(calls[1].temperature.as_f64(), 1.0);
}

#[tokio::test]
async fn default_creativity_is_used_when_unset() {
    let model = ScriptedModel::new(vec![ok(APPROVE), ok("Done.")]);
    let pipeline = orchestrator(model.clone(), seeded_store(0));

    pipeline
        .generate_basic(GenerationRequest::new(user(), "Tidy desk"))
        .await
        .unwrap();

    assert_eq!(model.calls()[1].temperature.as_f64(), 0.6);
}

#[tokio::test]
async fn usage_stats_and_audit_log_reflect_generations() {
    let model = ScriptedModel::new(vec![ok(APPROVE), ok("One."), ok(APPROVE), ok("Two.")]);
    let pipeline = orchestrator(model, seeded_store(0));

    for title in ["First task", "Second task"] {
        pipeline
            .generate_basic(GenerationRequest::new(user(), title))
            .await
            .unwrap();
    }

    let stats = pipeline.usage_stats(&user()).await.unwrap();
    assert_eq!(stats.ai_usage_count, 2);

    let entries = pipeline.audit_log(&user()).await.unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

    let unknown = UserId::new("nobody").unwrap();
    assert_eq!(pipeline.usage_stats(&unknown).await.unwrap().ai_usage_count, 0);
}

// ---------------------------------------------------------------------------
// Record store failures
// ---------------------------------------------------------------------------

fn seeded_document(usage: u64) -> StoreDocument {
    let mut doc = StoreDocument::default();
    doc.user_mut(&user()).ai_usage_count = usage;
    doc
}

#[tokio::test]
async fn failed_moderation_log_stops_before_generation() {
    let model = ScriptedModel::new(vec![ok(APPROVE), ok("Never generated.")]);
    let store = FailingStore::new(MemoryStore::with_document(seeded_document(2)), 1);
    let pipeline = Orchestrator::new(model.clone(), store.clone(), PipelineSettings::default());

    let err = pipeline
        .generate_basic(GenerationRequest::new(user(), "Buy groceries"))
        .await
        .unwrap_err();

    assert_matches!(err, PipelineError::Storage(_));
    assert_eq!(err.status_code(), 500);
    let body = err.to_body();
    assert_eq!(
        body,
        ErrorBody {
            error: MSG_GENERATION_FAILED.to_string(),
            reason: None,
        }
    );
    assert!(!serde_json::to_string(&body).unwrap().contains("no space"));

    // Only the moderation call reached the model.
    assert_eq!(model.calls().len(), 1);
    let doc = store.inner.snapshot().await;
    assert_eq!(doc.usage_count(&user()), 2);
    assert!(doc.ai_logs.is_empty());
}

#[tokio::test]
async fn failed_counter_write_keeps_the_generation_entry() {
    let model = ScriptedModel::new(vec![ok(APPROVE), ok("Buy fruit and bread.")]);
    // Persists: moderation log, generation log, counter.
    let store = FailingStore::new(MemoryStore::with_document(seeded_document(2)), 3);
    let pipeline = Orchestrator::new(model.clone(), store.clone(), PipelineSettings::default());

    let err = pipeline
        .generate_basic(GenerationRequest::new(user(), "Buy groceries"))
        .await
        .unwrap_err();

    assert_matches!(err, PipelineError::Storage(_));
    assert_eq!(err.to_body().error, MSG_GENERATION_FAILED);

    let doc = store.inner.snapshot().await;
    assert_eq!(entries_of(&doc, AuditKind::Moderation), 1);
    assert_eq!(entries_of(&doc, AuditKind::Generation), 1);
    assert_eq!(doc.usage_count(&user()), 2);
}

#[tokio::test]
async fn unreadable_store_fails_usage_stats_generically() {
    struct UnreadableStore;

    #[async_trait]
    impl RecordStore for UnreadableStore {
        async fn load(&self) -> Result<StoreDocument, StoreError> {
            Err(StoreError::Io(std::io::Error::other("permission denied")))
        }

        async fn persist(&self, _document: &StoreDocument) -> Result<(), StoreError> {
            Ok(())
        }
    }

    let pipeline = Orchestrator::new(
        ScriptedModel::new(vec![]),
        Arc::new(UnreadableStore),
        PipelineSettings::default(),
    );

    let err = pipeline.usage_stats(&user()).await.unwrap_err();
    assert_matches!(err, PipelineError::Storage(_));
    assert_eq!(err.to_body().error, MSG_GENERATION_FAILED);
}

// ---------------------------------------------------------------------------
// Records written by other collaborators
// ---------------------------------------------------------------------------

#[tokio::test]
async fn foreign_shaped_records_do_not_break_the_pipeline() {
    let doc: StoreDocument = serde_json::from_value(serde_json::json!({
        "users": [
            { "id": 17, "aiUsageCount": null, "creativity": "70" },
            { "id": "user-1", "aiUsageCount": 3, "creativity": 72.5 }
        ],
        "aiLogs": [{ "id": 1700000000000u64, "event": "legacy" }]
    }))
    .expect("foreign shapes should load");
    let model = ScriptedModel::new(vec![ok(APPROVE), ok("Buy fruit and bread.")]);
    let store = Arc::new(MemoryStore::with_document(doc));
    let pipeline = orchestrator(model.clone(), store.clone());

    assert_eq!(pipeline.usage_stats(&user()).await.unwrap().ai_usage_count, 3);
    let numeric = UserId::new("17").unwrap();
    assert_eq!(pipeline.usage_stats(&numeric).await.unwrap().ai_usage_count, 0);

    let response = pipeline
        .generate_basic(GenerationRequest::new(user(), "Buy groceries"))
        .await
        .expect("generation should succeed");
    assert_eq!(response.usage_count, 4);
    // Stored 72.5 rounds to creativity 73.
    assert_eq!(model.calls()[1].temperature.as_f64(), 0.784);

    let doc = store.snapshot().await;
    assert_eq!(doc.ai_logs.len(), 3);
    assert_eq!(doc.ai_logs[0]["event"], "legacy");
    assert_eq!(pipeline.audit_log(&user()).await.unwrap().len(), 2);
}
