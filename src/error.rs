//! Error types and Axum response conversions.
//!
//! Every failure leaving the subsystem carries a stable machine-readable
//! `kind` plus a human-readable message. Store and crypto failures are
//! mapped to `Internal` at the boundary; raw driver errors never reach a
//! client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Authentication subsystem error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Malformed input; safe to retry with corrected input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The address is not a well-formed Ethereum account identifier.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The chain id is not in the supported set.
    #[error("Unsupported chain id: {0}")]
    InvalidChain(u64),

    /// The nonce is unknown, already consumed, or expired. The client must
    /// restart from challenge issuance.
    #[error("Invalid or expired nonce")]
    InvalidNonce,

    /// The nonce does not appear in the submitted message text.
    #[error("Nonce does not match challenge message")]
    NonceMismatch,

    /// The signature does not match the claimed address. Never retried
    /// automatically; the human re-signs.
    #[error("Signature verification failed")]
    VerificationFailed,

    /// The bearer token signature or structure is invalid.
    #[error("Invalid token")]
    InvalidToken,

    /// The bearer token is authentic but its expiry has passed.
    #[error("Token expired")]
    TokenExpired,

    /// The token is valid but the underlying session is gone; treated
    /// identically to expiry by clients.
    #[error("Session not found")]
    SessionNotFound,

    #[error("Rate limited")]
    RateLimited,

    /// Signing secret or store failure; fatal for the request, not retried
    /// by the subsystem itself.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable discriminant for clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::BadRequest(_) => "bad_request",
            AuthError::InvalidAddress(_) => "invalid_address",
            AuthError::InvalidChain(_) => "invalid_chain",
            AuthError::InvalidNonce => "invalid_nonce",
            AuthError::NonceMismatch => "nonce_mismatch",
            AuthError::VerificationFailed => "verification_failed",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::SessionNotFound => "session_not_found",
            AuthError::RateLimited => "rate_limited",
            AuthError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AuthError::BadRequest(_)
            | AuthError::InvalidAddress(_)
            | AuthError::InvalidChain(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidNonce
            | AuthError::NonceMismatch
            | AuthError::VerificationFailed
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::SessionNotFound => StatusCode::UNAUTHORIZED,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::Internal(msg) => {
                // Log detailed error server-side, return generic message to client
                tracing::error!(error = %msg, "Internal server error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": message,
            }
        }));

        (self.status(), body).into_response()
    }
}

// Convenience conversions from common error types
impl From<redis::RedisError> for AuthError {
    fn from(err: redis::RedisError) -> Self {
        AuthError::Internal(format!("Redis error: {}", err))
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    /// Extract status code and JSON body from an AuthError response.
    async fn error_response(err: AuthError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn test_internal_hides_details() {
        // CRITICAL: Internal error must NOT leak detailed message to client
        let (status, body) = error_response(AuthError::Internal(
            "Redis connection refused at 10.0.0.5:6379".to_string(),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["kind"], "internal");
        assert_eq!(body["error"]["message"], "Internal server error");
        // Must NOT contain the actual error details
        let rendered = body.to_string();
        assert!(!rendered.contains("Redis"));
        assert!(!rendered.contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_bad_request() {
        let (status, body) =
            error_response(AuthError::BadRequest("Missing signature".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "bad_request");
        assert_eq!(body["error"]["message"], "Bad request: Missing signature");
    }

    #[tokio::test]
    async fn test_invalid_chain() {
        let (status, body) = error_response(AuthError::InvalidChain(999)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "invalid_chain");
        assert_eq!(body["error"]["message"], "Unsupported chain id: 999");
    }

    #[tokio::test]
    async fn test_challenge_failures_are_unauthorized() {
        for (err, kind) in [
            (AuthError::InvalidNonce, "invalid_nonce"),
            (AuthError::NonceMismatch, "nonce_mismatch"),
            (AuthError::VerificationFailed, "verification_failed"),
        ] {
            let (status, body) = error_response(err).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"]["kind"], kind);
        }
    }

    #[tokio::test]
    async fn test_token_expired_distinct_from_invalid() {
        let (_, invalid) = error_response(AuthError::InvalidToken).await;
        let (_, expired) = error_response(AuthError::TokenExpired).await;
        assert_eq!(invalid["error"]["kind"], "invalid_token");
        assert_eq!(expired["error"]["kind"], "token_expired");
        assert_ne!(invalid["error"]["kind"], expired["error"]["kind"]);
    }

    #[tokio::test]
    async fn test_session_not_found() {
        let (status, body) = error_response(AuthError::SessionNotFound).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["kind"], "session_not_found");
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let (status, body) = error_response(AuthError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["kind"], "rate_limited");
    }

    #[test]
    fn test_from_redis_error() {
        let redis_err = redis::RedisError::from((
            redis::ErrorKind::TypeError,
            "test context",
            "connection refused".to_string(),
        ));
        let auth_err = AuthError::from(redis_err);
        match auth_err {
            AuthError::Internal(msg) => assert!(msg.contains("Redis error")),
            _ => panic!("Expected Internal variant"),
        }
    }

    #[test]
    fn test_from_serde_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let auth_err = AuthError::from(serde_err);
        match auth_err {
            AuthError::Internal(msg) => assert!(msg.contains("JSON error")),
            _ => panic!("Expected Internal variant"),
        }
    }
}
