use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::info;

use crate::auth::{generate_token, hash_password, verify_password};
use crate::models::{ApiError, LoginRequest, RegisterRequest, TokenResponse};
use crate::state::AppState;
use crate::storage::is_unique_violation;

const MIN_PASSWORD_CHARS: usize = 6;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("a valid email is required"));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let user_id = state
        .storage
        .create_user(&email, &hash_password(&req.password))
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("email already registered")
            } else {
                ApiError::internal(format!("failed to create user: {e}"))
            }
        })?;

    let token = generate_token();
    state
        .storage
        .insert_session(&token, user_id)
        .map_err(|e| ApiError::internal(format!("failed to create session: {e}")))?;

    info!(user_id, "user registered");
    Ok((StatusCode::CREATED, Json(TokenResponse { token, user_id })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();

    let user = state
        .storage
        .find_user(&email)
        .map_err(|e| ApiError::internal(format!("user lookup failed: {e}")))?;

    // Same response for unknown email and wrong password
    let Some((user_id, stored_hash)) = user else {
        return Err(ApiError::unauthorized("invalid email or password"));
    };
    if !verify_password(&req.password, &stored_hash) {
        return Err(ApiError::unauthorized("invalid email or password"));
    }

    let token = generate_token();
    state
        .storage
        .insert_session(&token, user_id)
        .map_err(|e| ApiError::internal(format!("failed to create session: {e}")))?;

    Ok(Json(TokenResponse { token, user_id }))
}
