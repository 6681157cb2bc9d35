//! Admin token authentication extractor.
//!
//! Reads the token from `Authorization: Bearer <token>` or
//! `X-API-Key: <token>` and compares its SHA-256 hash with the configured
//! admin token hash. With no admin token configured every request passes.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated request marker.
pub struct Authenticated;

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token_hash.as_deref() else {
            return Ok(Authenticated);
        };

        let token = extract_token(&parts.headers)?;
        if hash_api_key(&token) == expected {
            Ok(Authenticated)
        } else {
            tracing::debug!("Rejected request with invalid admin token");
            Err(AppError::Unauthorized(
                "Invalid token. Provide the admin token via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
            ))
        }
    }
}

/// Extract the token from request headers.
fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    if let Some(auth) = headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    if let Some(token) = headers.get("x-api-key") {
        let token_str = token.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(token_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing token. Provide via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
    ))
}

/// Compute SHA-256 hash of a token (lowercase hex).
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer  s3cret "));
        assert_eq!(extract_token(&headers).unwrap(), "s3cret");
    }

    #[test]
    fn api_key_header_is_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        headers.insert("x-api-key", HeaderValue::from_static("s3cret"));
        assert_eq!(extract_token(&headers).unwrap(), "s3cret");
    }

    #[test]
    fn missing_token_is_unauthorized() {
        let err = extract_token(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn hash_is_lowercase_hex_sha256() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
