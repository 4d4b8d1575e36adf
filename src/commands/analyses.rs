use std::path::PathBuf;

use crate::{
    analysis::{
        pipeline::{AnalysisPipeline, AnalyzeRequest, PipelineConfig, SaveTarget},
        report::render_markdown,
        search::filter_records,
    },
    core::{
        errors::{AppError, AppResult},
        types::{
            AnalysisRecord, AnalyzeResponse, DeleteAnalysisResponse, ListAnalysesResponse, Provider,
            Session, ShareLinkResponse,
        },
    },
    providers::groq::GroqClient,
    routes::{self, Route, RouteDecision},
    security::keyring,
    AppState,
};

/// Session for `route`, or `Unauthorized` if the route would redirect.
fn guard(state: &AppState, route: Route) -> AppResult<Session> {
    let path = route.path();
    match routes::resolve(route, state.sessions.is_signed_in()) {
        RouteDecision::Render(_) => state.sessions.require(&path),
        RouteDecision::Redirect(_) => Err(AppError::Unauthorized(format!(
            "sign in to open {path}"
        ))),
    }
}

fn groq_api_key(state: &AppState) -> AppResult<String> {
    match &state.config.groq_api_key {
        Some(key) => Ok(key.clone()),
        None => keyring::get_provider_key(Provider::Groq),
    }
}

pub async fn analyze(
    state: &AppState,
    file_path: PathBuf,
    mime_type: Option<String>,
    display_name: Option<String>,
    force: bool,
) -> AppResult<AnalyzeResponse> {
    let client = GroqClient::new(
        &state.config.api_base,
        groq_api_key(state)?,
        &state.config.model,
    )?;
    let pipeline = AnalysisPipeline::new(client, PipelineConfig::from(&state.config));

    let session = state.sessions.current();
    let target = session.as_ref().map(|session| SaveTarget {
        store: &state.store,
        session,
    });
    if target.is_none() {
        tracing::info!("not signed in; the analysis will not be saved");
    }

    let outcome = pipeline
        .analyze_file(
            AnalyzeRequest {
                path: file_path,
                mime_type,
                display_name,
                force,
            },
            target,
        )
        .await?;

    Ok(AnalyzeResponse {
        pdf_name: outcome.pdf_name,
        record_id: outcome.record_id,
        cached: outcome.cached,
        save_error: outcome.save_error,
        analysis: outcome.result,
    })
}

pub async fn list_analyses(
    state: &AppState,
    search: Option<&str>,
) -> AppResult<ListAnalysesResponse> {
    let session = guard(state, Route::Dashboard)?;
    let records = state.store.list_for_user(&session).await?;
    let analyses = filter_records(&records, search.unwrap_or_default())
        .into_iter()
        .map(AnalysisRecord::summary)
        .collect();
    Ok(ListAnalysesResponse { analyses })
}

pub async fn get_analysis(state: &AppState, id: &str) -> AppResult<AnalysisRecord> {
    let session = guard(state, Route::StoredAnalysis { id: id.to_string() })?;
    state.store.get(&session, id).await
}

pub async fn delete_analysis(state: &AppState, id: &str) -> AppResult<DeleteAnalysisResponse> {
    let session = guard(state, Route::Dashboard)?;
    let deleted = state.store.delete(&session, id).await?;
    if deleted {
        tracing::info!(id, "analysis deleted");
    }
    Ok(DeleteAnalysisResponse { deleted })
}

pub async fn share_link(state: &AppState, id: &str) -> AppResult<ShareLinkResponse> {
    let record = get_analysis(state, id).await?;
    Ok(ShareLinkResponse {
        url: routes::share_link(&state.config.origin, &record.id),
    })
}

/// Writes the Markdown report to `out`, or `<data dir>/exports/<id>.md`.
pub async fn export_markdown(
    state: &AppState,
    id: &str,
    out: Option<PathBuf>,
) -> AppResult<PathBuf> {
    let record = get_analysis(state, id).await?;
    let file_path = match out {
        Some(path) => path,
        None => {
            let export_dir = state.data_dir.join("exports");
            std::fs::create_dir_all(&export_dir).map_err(|err| AppError::Io(err.to_string()))?;
            export_dir.join(format!("{id}.md"))
        }
    };
    std::fs::write(&file_path, render_markdown(&record.pdf_name, &record.analysis_result))
        .map_err(|err| AppError::Io(err.to_string()))?;
    Ok(file_path)
}
