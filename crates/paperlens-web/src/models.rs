//! Request/response DTOs and the API error type.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use paperlens_core::AnalysisResult;

// ── Auth ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user_id: i64,
}

// ── Analysis ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

/// Anonymous analysis: the bare aggregate.
#[derive(Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub result: AnalysisResult,
}

/// Persisted analysis: aggregate plus the row ids it was stored under.
#[derive(Serialize)]
pub struct StoredAnalysisResponse {
    pub document_id: i64,
    pub analysis_id: i64,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

// ── Corpus ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CorpusAddRequest {
    pub id: String,
    pub text: String,
}

#[derive(Serialize)]
pub struct CorpusAddResponse {
    pub id: String,
    pub entries: usize,
}

// ── Health ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub corpus_entries: usize,
}

// ── Errors ──────────────────────────────────────────────────────────────

/// JSON error response with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
