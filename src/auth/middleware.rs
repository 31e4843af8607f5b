//! Axum extractors for authentication and rate limiting.

use crate::auth::now_secs;
use crate::auth::token::validate_token;
use crate::config::Config;
use crate::error::AuthError;
use crate::models::StoredSession;
use crate::storage;
use axum::{extract::FromRequestParts, http::request::Parts};
use redis::AsyncCommands;
use std::sync::Arc;

/// Application state shared across handlers.
///
/// The Redis client is constructed once at startup and injected here; no
/// component holds its own lazy global connection.
#[derive(Clone)]
pub struct AppState {
    pub redis: redis::Client,
    pub config: Arc<Config>,
}

/// Authenticated session extractor.
///
/// Extracts the bearer token from `Authorization: Bearer {token}`, validates
/// its signature and expiry (pure CPU), then consults the session store for
/// revocation. A valid token whose session is gone is rejected with
/// `SessionNotFound`; clients treat it identically to expiry.
pub struct AuthSession {
    pub session: StoredSession,
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        // Signature + expiry first; no store round trip for garbage tokens
        let claims = validate_token(&state.config, &token)?;

        let mut con = state
            .redis
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AuthError::Internal(format!("Redis connection error: {}", e)))?;

        let session = storage::session::get_session(&mut con, &claims.sid, now_secs())
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        Ok(AuthSession { session })
    }
}

/// Pull the bearer token out of the Authorization header.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::InvalidToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidToken)
}

/// Check rate limit using Redis INCR with TTL.
///
/// # Arguments
/// * `con` - Redis connection
/// * `key` - Rate limit key (e.g., "ratelimit:auth:127.0.0.1")
/// * `max` - Maximum requests allowed in window
/// * `window_secs` - Time window in seconds
///
/// # Returns
/// * `Ok(true)` if under limit
/// * `Ok(false)` if limit exceeded
pub async fn check_rate_limit<C>(
    con: &mut C,
    key: &str,
    max: u32,
    window_secs: u64,
) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    // Increment counter
    let count: u32 = con.incr(key, 1).await?;

    // Set TTL on first request
    if count == 1 {
        con.expire::<_, ()>(key, window_secs as i64).await?;
    }

    Ok(count <= max)
}
