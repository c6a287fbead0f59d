use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::models::HealthResponse;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        corpus_entries: state.corpus.len(),
    })
}
