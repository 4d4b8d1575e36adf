use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use dataclaro_lib::{
    analysis::pipeline::{AnalysisPipeline, AnalyzeRequest, PipelineConfig, SaveTarget},
    core::{
        config::{ListKey, NormalizePolicy, SupabaseConfig},
        errors::{AppError, AppResult},
    },
    db::Database,
    providers::{Completion, CompletionProvider, CompletionRequest},
    remote::supabase::SupabaseClient,
    session::local_session,
    store::AnalysisStore,
};

const REPLY: &str = r#"Sure! Here is the analysis:
{"summary":{"text":"Sales rose in the north.","page":1},
 "key_insights":[{"title":"North leads","explanation":"10 vs 12","page":1}],
 "key_statistics":[{"label":"North","value":10,"page":1}],
 "action_items":[{"text":"Invest north","page":0}]}"#;

#[derive(Clone)]
struct ScriptedProvider {
    reply: Result<String, fn() -> AppError>,
    calls: Arc<AtomicUsize>,
    last_user_prompt: Arc<std::sync::Mutex<String>>,
}

impl ScriptedProvider {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
            last_user_prompt: Arc::new(std::sync::Mutex::new(String::new())),
        }
    }

    fn failing(err: fn() -> AppError) -> Self {
        Self {
            reply: Err(err),
            ..Self::replying("")
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> AppResult<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_user_prompt.lock().expect("prompt lock") = request.user.clone();
        match &self.reply {
            Ok(content) => Ok(Completion {
                content: content.clone(),
                model: "scripted".to_string(),
                token_usage: serde_json::json!({}),
            }),
            Err(make) => Err(make()),
        }
    }
}

fn config(policy: NormalizePolicy) -> PipelineConfig {
    PipelineConfig {
        max_transcript_chars: 20_000,
        list_key: ListKey::ActionItems,
        normalize_policy: policy,
    }
}

fn csv_upload(dir: &tempfile::TempDir) -> AnalyzeRequest {
    let path = dir.path().join("sales.csv");
    std::fs::write(&path, "region,revenue\nnorth,10\nsouth,12\n").expect("write csv");
    AnalyzeRequest {
        path,
        mime_type: None,
        display_name: None,
        force: false,
    }
}

#[tokio::test]
async fn analysis_is_normalized_and_saved() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = AnalysisStore::Local(Database::in_memory().await.expect("db should initialize"));
    let session = local_session();
    let provider = ScriptedProvider::replying(REPLY);
    let pipeline = AnalysisPipeline::new(provider.clone(), config(NormalizePolicy::Lenient));

    let outcome = pipeline
        .analyze_file(
            csv_upload(&dir),
            Some(SaveTarget {
                store: &store,
                session: &session,
            }),
        )
        .await
        .expect("analysis");

    assert_eq!(outcome.pdf_name, "sales.csv");
    assert!(!outcome.cached);
    assert!(outcome.save_error.is_none());
    assert_eq!(outcome.result.summary.text, "Sales rose in the north.");
    assert_eq!(outcome.result.key_statistics[0].value, "10");
    assert!(provider
        .last_user_prompt
        .lock()
        .expect("prompt lock")
        .ends_with("Text to analyze: region,revenue\nnorth,10\nsouth,12"));

    let id = outcome.record_id.expect("saved record id");
    let stored = store.get(&session, &id).await.expect("stored record");
    assert_eq!(stored.analysis_result, outcome.result);
    assert_eq!(stored.pdf_name, "sales.csv");
}

#[tokio::test]
async fn identical_upload_reuses_stored_analysis() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = AnalysisStore::Local(Database::in_memory().await.expect("db should initialize"));
    let session = local_session();
    let provider = ScriptedProvider::replying(REPLY);
    let pipeline = AnalysisPipeline::new(provider.clone(), config(NormalizePolicy::Lenient));
    let target = Some(SaveTarget {
        store: &store,
        session: &session,
    });

    let first = pipeline
        .analyze_file(csv_upload(&dir), target)
        .await
        .expect("first run");
    let second = pipeline
        .analyze_file(csv_upload(&dir), target)
        .await
        .expect("second run");
    assert!(second.cached);
    assert_eq!(second.record_id, first.record_id);
    assert_eq!(provider.calls(), 1);

    let mut forced = csv_upload(&dir);
    forced.force = true;
    let third = pipeline.analyze_file(forced, target).await.expect("forced run");
    assert!(!third.cached);
    assert_ne!(third.record_id, first.record_id);
    assert_eq!(provider.calls(), 2);
    assert_eq!(store.list_for_user(&session).await.expect("list").len(), 2);
}

#[tokio::test]
async fn save_failure_still_returns_the_analysis() {
    let dir = tempfile::tempdir().expect("tempdir");
    let unreachable = SupabaseClient::new(&SupabaseConfig {
        url: "http://127.0.0.1:9".to_string(),
        anon_key: "anon".to_string(),
    })
    .expect("client");
    let store = AnalysisStore::Remote(unreachable);
    let session = local_session();
    let pipeline =
        AnalysisPipeline::new(ScriptedProvider::replying(REPLY), config(NormalizePolicy::Lenient));

    let outcome = pipeline
        .analyze_file(
            csv_upload(&dir),
            Some(SaveTarget {
                store: &store,
                session: &session,
            }),
        )
        .await
        .expect("analysis survives the failed save");
    assert!(outcome.record_id.is_none());
    assert!(outcome.save_error.is_some());
    assert_eq!(outcome.result.action_items[0].text, "Invest north");
}

#[tokio::test]
async fn signed_out_runs_are_not_saved() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline =
        AnalysisPipeline::new(ScriptedProvider::replying(REPLY), config(NormalizePolicy::Lenient));
    let outcome = pipeline
        .analyze_file(csv_upload(&dir), None)
        .await
        .expect("analysis");
    assert!(outcome.record_id.is_none());
    assert!(outcome.save_error.is_none());
}

#[tokio::test]
async fn unusable_reply_depends_on_policy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lenient = AnalysisPipeline::new(
        ScriptedProvider::replying("I cannot help with that."),
        config(NormalizePolicy::Lenient),
    );
    let outcome = lenient
        .analyze_file(csv_upload(&dir), None)
        .await
        .expect("lenient run");
    assert!(!outcome.result.has_content());

    let strict = AnalysisPipeline::new(
        ScriptedProvider::replying("I cannot help with that."),
        config(NormalizePolicy::Strict),
    );
    let err = strict
        .analyze_file(csv_upload(&dir), None)
        .await
        .expect_err("strict run");
    assert_eq!(err.code(), "NORMALIZATION_FAILED");
}

#[tokio::test]
async fn provider_and_extraction_errors_surface() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = AnalysisPipeline::new(
        ScriptedProvider::failing(|| AppError::ProviderRateLimited),
        config(NormalizePolicy::Lenient),
    );
    let err = pipeline
        .analyze_file(csv_upload(&dir), None)
        .await
        .expect_err("rate limited");
    assert!(err.retryable());

    let path = dir.path().join("deck.pptx");
    std::fs::write(&path, b"zip").expect("write");
    let err = pipeline
        .analyze_file(
            AnalyzeRequest {
                path,
                mime_type: None,
                display_name: Some("Deck".to_string()),
                force: false,
            },
            None,
        )
        .await
        .expect_err("unsupported");
    assert_eq!(err.code(), "INVALID_INPUT");
}

#[tokio::test]
async fn transcript_is_truncated_to_the_configured_bound() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = ScriptedProvider::replying(REPLY);
    let pipeline = AnalysisPipeline::new(
        provider.clone(),
        PipelineConfig {
            max_transcript_chars: 6,
            ..config(NormalizePolicy::Lenient)
        },
    );
    let mut request = csv_upload(&dir);
    request.display_name = Some("Renamed".to_string());
    let outcome = pipeline.analyze_file(request, None).await.expect("analysis");
    assert_eq!(outcome.pdf_name, "Renamed");
    assert!(provider
        .last_user_prompt
        .lock()
        .expect("prompt lock")
        .ends_with("Text to analyze: region"));
}

/// Replies with each scripted answer in turn, repeating the last one.
#[derive(Clone)]
struct SequencedProvider {
    replies: Arc<std::sync::Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl SequencedProvider {
    fn new(replies: &[&str]) -> Self {
        let mut replies: Vec<String> = replies.iter().map(|r| r.to_string()).collect();
        replies.reverse();
        Self {
            replies: Arc::new(std::sync::Mutex::new(replies)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl CompletionProvider for SequencedProvider {
    async fn complete(&self, _request: &CompletionRequest) -> AppResult<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = {
            let mut replies = self.replies.lock().expect("replies lock");
            if replies.len() > 1 {
                replies.pop().unwrap_or_default()
            } else {
                replies.last().cloned().unwrap_or_default()
            }
        };
        Ok(Completion {
            content,
            model: "sequenced".to_string(),
            token_usage: serde_json::json!({}),
        })
    }
}

#[tokio::test]
async fn empty_fallback_is_not_reused_for_the_same_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = AnalysisStore::Local(Database::in_memory().await.expect("db should initialize"));
    let session = local_session();
    let provider = SequencedProvider::new(&["Sorry, I cannot do that.", REPLY]);
    let pipeline = AnalysisPipeline::new(provider.clone(), config(NormalizePolicy::Lenient));
    let target = Some(SaveTarget {
        store: &store,
        session: &session,
    });

    let first = pipeline
        .analyze_file(csv_upload(&dir), target)
        .await
        .expect("first run");
    assert!(!first.result.has_content());
    let saved = store
        .get(&session, first.record_id.as_deref().expect("saved"))
        .await
        .expect("stored empty record");
    assert!(saved.pdf_checksum.is_none());

    let second = pipeline
        .analyze_file(csv_upload(&dir), target)
        .await
        .expect("second run");
    assert!(!second.cached);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    assert_eq!(second.result.summary.text, "Sales rose in the north.");

    let third = pipeline
        .analyze_file(csv_upload(&dir), target)
        .await
        .expect("third run");
    assert!(third.cached);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stored_empty_analysis_does_not_mask_strict_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = AnalysisStore::Local(Database::in_memory().await.expect("db should initialize"));
    let session = local_session();
    let request = csv_upload(&dir);
    let checksum = dataclaro_lib::extract::reader::checksum_bytes(
        &std::fs::read(&request.path).expect("read upload"),
    );
    store
        .insert(
            &session,
            "sales.csv",
            &dataclaro_lib::core::types::AnalysisResult::default(),
            Some(&checksum),
        )
        .await
        .expect("seed empty record");

    let provider = ScriptedProvider::replying("Sorry, I cannot do that.");
    let pipeline = AnalysisPipeline::new(provider.clone(), config(NormalizePolicy::Strict));
    let err = pipeline
        .analyze_file(
            request,
            Some(SaveTarget {
                store: &store,
                session: &session,
            }),
        )
        .await
        .expect_err("strict run");
    assert_eq!(err.code(), "NORMALIZATION_FAILED");
    assert_eq!(provider.calls(), 1);
}
