use std::path::PathBuf;
use std::time::Instant;

use crate::{
    analysis::{
        normalizer::normalize,
        prompts::{analysis_prompt, SYSTEM_PROMPT},
    },
    core::{
        config::{AppConfig, ListKey, NormalizePolicy},
        errors::{AppError, AppResult},
        types::{AnalysisResult, Session},
    },
    extract::{read_transcript, Transcript},
    providers::{CompletionProvider, CompletionRequest},
    store::AnalysisStore,
};

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub max_transcript_chars: usize,
    pub list_key: ListKey,
    pub normalize_policy: NormalizePolicy,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_transcript_chars: config.max_transcript_chars,
            list_key: config.list_key,
            normalize_policy: config.normalize_policy,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub path: PathBuf,
    pub mime_type: Option<String>,
    pub display_name: Option<String>,
    /// Skip the stored-analysis lookup for identical files.
    pub force: bool,
}

/// Owner and destination for a finished analysis.
#[derive(Clone, Copy)]
pub struct SaveTarget<'a> {
    pub store: &'a AnalysisStore,
    pub session: &'a Session,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub pdf_name: String,
    pub result: AnalysisResult,
    pub record_id: Option<String>,
    pub cached: bool,
    /// Set when the analysis succeeded but could not be saved.
    pub save_error: Option<String>,
}

#[derive(Clone)]
pub struct AnalysisPipeline<P> {
    provider: P,
    config: PipelineConfig,
}

impl<P: CompletionProvider> AnalysisPipeline<P> {
    pub fn new(provider: P, config: PipelineConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn analyze_file(
        &self,
        request: AnalyzeRequest,
        target: Option<SaveTarget<'_>>,
    ) -> AppResult<AnalysisOutcome> {
        let AnalyzeRequest {
            path,
            mime_type,
            display_name,
            force,
        } = request;

        let mut transcript =
            tokio::task::spawn_blocking(move || read_transcript(&path, mime_type.as_deref()))
                .await
                .map_err(|err| AppError::Internal(format!("extraction task failed: {err}")))??;
        if let Some(name) = display_name {
            transcript.name = name;
        }
        self.analyze_transcript(transcript, target, force).await
    }

    pub async fn analyze_transcript(
        &self,
        transcript: Transcript,
        target: Option<SaveTarget<'_>>,
        force: bool,
    ) -> AppResult<AnalysisOutcome> {
        if !force {
            if let Some(outcome) = self.cached(&transcript, target).await {
                return Ok(outcome);
            }
        }

        let started = Instant::now();
        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: analysis_prompt(
                &transcript.text(),
                self.config.max_transcript_chars,
                self.config.list_key,
            ),
        };
        tracing::info!(
            name = %transcript.name,
            pages = transcript.page_count(),
            chars = transcript.char_count(),
            limit = self.config.max_transcript_chars,
            "requesting analysis"
        );
        let completion = self.provider.complete(&request).await?;
        tracing::debug!(raw = %completion.content, "raw completion");

        let result = normalize(&completion.content, self.config.normalize_policy)?;
        if !result.has_content() {
            tracing::warn!(name = %transcript.name, "model output had no usable analysis");
        }
        tracing::info!(
            name = %transcript.name,
            latency_ms = started.elapsed().as_millis() as u64,
            insights = result.key_insights.len(),
            statistics = result.key_statistics.len(),
            "analysis complete"
        );

        let mut outcome = AnalysisOutcome {
            pdf_name: transcript.name.clone(),
            result,
            record_id: None,
            cached: false,
            save_error: None,
        };

        if let Some(target) = target {
            // an empty fallback must not satisfy later checksum lookups
            let checksum = outcome
                .result
                .has_content()
                .then_some(transcript.checksum.as_str());
            match target
                .store
                .insert(target.session, &outcome.pdf_name, &outcome.result, checksum)
                .await
            {
                Ok(record) => outcome.record_id = Some(record.id),
                Err(err) => {
                    tracing::warn!(
                        code = err.code(),
                        error = %err,
                        "analysis not saved; showing it anyway"
                    );
                    outcome.save_error = Some(err.to_string());
                }
            }
        }

        Ok(outcome)
    }

    async fn cached(
        &self,
        transcript: &Transcript,
        target: Option<SaveTarget<'_>>,
    ) -> Option<AnalysisOutcome> {
        let target = target?;
        match target
            .store
            .find_by_checksum(target.session, &transcript.checksum)
            .await
        {
            Ok(Some(record)) if !record.analysis_result.has_content() => {
                tracing::debug!(id = %record.id, "stored analysis is empty, re-running");
                None
            }
            Ok(Some(record)) => {
                tracing::info!(id = %record.id, "identical file already analyzed, reusing result");
                Some(AnalysisOutcome {
                    pdf_name: transcript.name.clone(),
                    result: record.analysis_result,
                    record_id: Some(record.id),
                    cached: true,
                    save_error: None,
                })
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "stored-analysis lookup failed");
                None
            }
        }
    }
}
