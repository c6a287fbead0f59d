use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use tokio_util::sync::CancellationToken;
use tracing::info;

use paperlens_core::{AnalysisResult, Document, PipelineError};

use crate::auth::require_user;
use crate::models::{AnalyzeRequest, AnalyzeResponse, ApiError, StoredAnalysisResponse};
use crate::state::AppState;
use crate::upload;

/// Anonymous PDF analysis. Nothing is persisted.
pub async fn analyze_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let (document, filename) = extract_upload(&state, multipart).await?;
    info!(filename = %filename, words = document.word_count, "anonymous pdf analysis");

    let result = run_pipeline(&state, &document).await?;
    Ok(Json(AnalyzeResponse { result }))
}

/// Anonymous analysis of already-extracted text. Nothing is persisted.
pub async fn analyze_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let document = Document::from_text(req.text);
    let result = run_pipeline(&state, &document).await?;
    Ok(Json(AnalyzeResponse { result }))
}

/// Authenticated PDF upload. The extracted document and its analysis are
/// stored under the calling user.
pub async fn analyze_upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<StoredAnalysisResponse>, ApiError> {
    let user_id = require_user(&state, &headers)?;

    let (document, filename) = extract_upload(&state, multipart).await?;
    info!(user_id, filename = %filename, words = document.word_count, "pdf upload received");

    let result = run_pipeline(&state, &document).await?;

    let document_id = state
        .storage
        .store_document(user_id, &filename, document.title.as_deref(), document.word_count)
        .map_err(|e| ApiError::internal(format!("failed to store document: {e}")))?;
    let analysis_id = state
        .storage
        .store_analysis(document_id, &result)
        .map_err(|e| ApiError::internal(format!("failed to store analysis: {e}")))?;

    Ok(Json(StoredAnalysisResponse {
        document_id,
        analysis_id,
        result,
    }))
}

/// Parse the multipart form and extract the PDF into a [`Document`].
async fn extract_upload(
    state: &AppState,
    multipart: Multipart,
) -> Result<(Document, String), ApiError> {
    let upload = upload::parse_multipart(multipart)
        .await
        .map_err(ApiError::bad_request)?;

    // mupdf wants a path, and extraction is CPU-bound anyway
    let backend = Arc::clone(&state.backend);
    let extracted = tokio::task::spawn_blocking(move || {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("upload.pdf");
        std::fs::write(&path, &upload.data)?;
        backend
            .extract(&path)
            .map(|doc| (doc, upload.filename))
            .map_err(|e| anyhow::anyhow!(e))
    })
    .await
    .map_err(|e| ApiError::internal(format!("extraction task failed: {e}")))?;

    let (extracted, filename) =
        extracted.map_err(|e| ApiError::bad_request(format!("could not process PDF: {e}")))?;

    Ok((Document::from(extracted), filename))
}

async fn run_pipeline(state: &AppState, document: &Document) -> Result<AnalysisResult, ApiError> {
    let cancel = CancellationToken::new();
    state
        .pipeline
        .analyze(document, &state.corpus, &cancel)
        .await
        .map_err(|e| match e {
            PipelineError::TooShort { .. } => ApiError::bad_request(e.to_string()),
            PipelineError::Extraction(_) => ApiError::internal(e.to_string()),
        })
}
