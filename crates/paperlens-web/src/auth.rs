//! Password hashing, session tokens, and the Bearer gate.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use crate::models::ApiError;
use crate::state::AppState;

/// Hash a password with a fresh random salt; stored as `salt$digest` hex.
pub fn hash_password(password: &str) -> String {
    let salt = format!("{:016x}", fastrand::u64(..));
    let digest = salted_digest(&salt, password);
    format!("{salt}${digest}")
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        return false;
    };
    salted_digest(salt, password) == digest
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Opaque 128-bit session token.
pub fn generate_token() -> String {
    format!("{:032x}", fastrand::u128(..))
}

/// Resolve the Bearer token in `headers` to a user id.
pub fn require_user(state: &AppState, headers: &HeaderMap) -> Result<i64, ApiError> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

    match state.storage.user_for_token(token) {
        Ok(Some(user_id)) => Ok(user_id),
        Ok(None) => Err(ApiError::unauthorized("invalid or expired token")),
        Err(e) => Err(ApiError::internal(format!("session lookup failed: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let stored = hash_password("hunter22");
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
    }

    #[test]
    fn identical_passwords_hash_differently() {
        // Salted, so two users with the same password do not collide
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("anything", "no-dollar-sign"));
    }

    #[test]
    fn tokens_are_opaque_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
