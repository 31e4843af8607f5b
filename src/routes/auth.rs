//! Auth API endpoints — the session lifecycle:
//! challenge issued -> verified -> authenticated -> revoked.
//!
//! Refreshing is not a server-side operation: when the remaining session
//! lifetime drops below the configured threshold (the `refresh_at` field of
//! session responses), the client runs the full challenge/verify sequence
//! again. Sessions are never extended in place.

use crate::auth::middleware::{bearer_token, check_rate_limit, AppState, AuthSession};
use crate::auth::token::{issue_token, validate_token_ignore_expiry};
use crate::auth::{challenge, now_secs, verify};
use crate::error::AuthError;
use crate::models::{
    ChallengeRequest, ChallengeResponse, StoredSession, VerifyRequest, VerifyResponse,
};
use crate::storage;
use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;

/// POST /api/auth/challenge — Issue a sign-in challenge
///
/// Allocates a single-use nonce and renders the canonical message for the
/// wallet to sign. The caller signs out-of-band and submits to
/// [`verify_challenge`].
pub async fn request_challenge(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<ChallengeRequest>,
) -> Result<impl IntoResponse, AuthError> {
    // Validate before touching the store: no nonce is burned for a
    // malformed address or an unsupported chain
    let address = challenge::parse_address(&req.address)?;
    challenge::check_chain_id(&state.config, req.chain_id)?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AuthError::Internal(format!("Redis connection error: {}", e)))?;

    // Rate limit by IP
    let rate_limit_key = format!("ratelimit:auth:{}", addr.ip());
    let allowed = check_rate_limit(
        &mut con,
        &rate_limit_key,
        state.config.rate_limit_auth_per_min,
        60,
    )
    .await
    .map_err(|e| AuthError::Internal(format!("Rate limit check failed: {}", e)))?;

    if !allowed {
        let mut hasher = std::hash::DefaultHasher::new();
        addr.ip().hash(&mut hasher);
        let ip_hash = format!("{:x}", hasher.finish());
        tracing::warn!(action = "rate_limited", endpoint = "auth/challenge", ip_hash = %ip_hash, "Rate limit exceeded");
        return Err(AuthError::RateLimited);
    }

    let now = now_secs();
    let nonce = storage::nonce::allocate(
        &mut con,
        state.config.nonce_ttl_secs,
        now,
        challenge::generate_nonce,
    )
    .await?;

    let message =
        challenge::create_challenge(&state.config, &address, req.chain_id, &nonce.value, now)?;

    Ok(Json(ChallengeResponse {
        nonce: nonce.value,
        message,
        expires_at: nonce.expires_at,
    }))
}

/// POST /api/auth/verify — Submit a signed challenge and create a session
///
/// Order matters: the nonce is consumed before anything else is checked, so
/// a failed attempt always burns it; a mismatched or badly signed
/// submission cannot be retried with the same nonce. Signature recovery
/// runs over the literal submitted message bytes.
pub async fn verify_challenge(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<impl IntoResponse, AuthError> {
    // 1. Required fields
    if req.message.is_empty() || req.signature.is_empty() || req.nonce.is_empty() {
        return Err(AuthError::BadRequest(
            "message, signature, and nonce are required".to_string(),
        ));
    }
    let address = challenge::parse_address(&req.address)
        .map_err(|_| AuthError::BadRequest("Malformed address".to_string()))?;
    challenge::check_chain_id(&state.config, req.chain_id)
        .map_err(|_| AuthError::BadRequest(format!("Unsupported chain id: {}", req.chain_id)))?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AuthError::Internal(format!("Redis connection error: {}", e)))?;

    let now = now_secs();

    // 2. Consume the nonce (single-use)
    if !storage::nonce::consume(&mut con, &req.nonce, now).await? {
        return Err(AuthError::InvalidNonce);
    }

    // 3. The consumed nonce must appear verbatim in the signed text
    // (defense against substitution)
    if !req.message.contains(&req.nonce) {
        tracing::warn!(action = "auth_failed", address = %req.address, "Nonce missing from message");
        return Err(AuthError::NonceMismatch);
    }

    // 4. Recover the signer from the signature over the exact submitted
    // bytes and compare to the claimed address
    if !verify::verify_signature(req.message.as_bytes(), &req.signature, &address) {
        tracing::warn!(action = "auth_failed", address = %req.address, "Invalid signature");
        return Err(AuthError::VerificationFailed);
    }

    // 5. Create the session and mint its token. If the session write fails
    // here the consumed nonce is simply lost; the client restarts from a
    // fresh challenge.
    let session = StoredSession {
        id: challenge::generate_session_id(),
        address: address.to_checksum(None),
        chain_id: req.chain_id,
        issued_at: now,
        expires_at: now + state.config.session_ttl_secs,
    };

    storage::session::store_session(&mut con, &session, state.config.session_ttl_secs).await?;

    let token = issue_token(&state.config, &session)?;

    tracing::info!(action = "auth_success", address = %session.address, session_id = %session.id, chain_id = session.chain_id, "Wallet authenticated");

    Ok(Json(VerifyResponse {
        session: session.to_info(state.config.refresh_threshold_secs),
        token,
    }))
}

/// GET /api/auth/session — Fetch the session behind a bearer token
///
/// The extractor validates the token (signature, then expiry) and then
/// consults the session store for revocation.
pub async fn fetch_session(
    auth: AuthSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(
        auth.session.to_info(state.config.refresh_threshold_secs),
    ))
}

/// POST /api/auth/logout — Revoke the session behind a bearer token
///
/// Idempotent: revoking an already-revoked session succeeds. The token's
/// signature must be authentic, but its expiry is ignored: an expired
/// session is equally dead and deleting it again is harmless.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let token = bearer_token(&headers)?;
    let claims = validate_token_ignore_expiry(&state.config, &token)?;

    let mut con = state
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AuthError::Internal(format!("Redis connection error: {}", e)))?;

    storage::session::delete_session(&mut con, &claims.sid).await?;

    tracing::info!(action = "logout", address = %claims.sub, session_id = %claims.sid, "Session revoked");

    Ok(StatusCode::NO_CONTENT)
}
