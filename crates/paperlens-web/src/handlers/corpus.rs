use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tracing::info;

use paperlens_core::StoreError;

use crate::models::{ApiError, CorpusAddRequest, CorpusAddResponse};
use crate::state::AppState;

pub async fn add_entry(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CorpusAddRequest>,
) -> Result<Json<CorpusAddResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::bad_request("corpus entry text is empty"));
    }

    state.corpus.append(&req.id, &req.text).map_err(|e| match e {
        StoreError::InvalidId(_) => ApiError::bad_request(e.to_string()),
        StoreError::Io(_) => ApiError::internal(format!("failed to store corpus entry: {e}")),
    })?;

    info!(id = %req.id, entries = state.corpus.len(), "corpus entry added");
    Ok(Json(CorpusAddResponse {
        id: req.id,
        entries: state.corpus.len(),
    }))
}
