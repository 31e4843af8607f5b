//! Request and response models for the API.
//!
//! All models use serde for serialization/deserialization.
//! Storage models represent Redis data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// Challenge Models
// ============================================================================

/// Request for a sign-in challenge.
#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub address: String,
    pub chain_id: u64,
}

/// Response containing the challenge to sign.
///
/// `message` is the canonical challenge text; the client must sign these
/// exact bytes. `expires_at` is the nonce deadline (unix seconds).
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub nonce: String,
    pub message: String,
    pub expires_at: u64,
}

/// Request to submit a signed challenge.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub message: String,
    pub signature: String, // 0x-prefixed hex, 65 bytes
    pub nonce: String,
    pub address: String,
    pub chain_id: u64,
}

/// Response after successful verification.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub session: SessionInfo,
    pub token: String,
}

// ============================================================================
// Session Models
// ============================================================================

/// Session record returned to clients.
///
/// `refresh_at` is the instant past which the client should re-run the full
/// challenge/verify sequence; sessions are never extended in place.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub address: String,
    pub chain_id: u64,
    pub issued_at: u64,
    pub expires_at: u64,
    pub refresh_at: u64,
}

// ============================================================================
// Storage Models
// ============================================================================

/// Nonce data as stored in Redis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredNonce {
    pub value: String,
    pub created_at: u64,
    pub expires_at: u64,
}

/// Session data as stored in Redis.
///
/// Address and chain id are immutable for the life of the session; a network
/// or account switch invalidates the session instead of mutating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: String,
    pub address: String, // EIP-55 checksummed
    pub chain_id: u64,
    pub issued_at: u64,
    pub expires_at: u64,
}

impl StoredSession {
    pub fn to_info(&self, refresh_threshold_secs: u64) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            address: self.address.clone(),
            chain_id: self.chain_id,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            refresh_at: self.expires_at.saturating_sub(refresh_threshold_secs),
        }
    }
}

// ============================================================================
// Token Claims
// ============================================================================

/// Bearer token payload.
///
/// `exp` is copied from the session record at issue time, so a token can
/// never outlive its session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Checksummed address.
    pub sub: String,
    /// Session id.
    pub sid: String,
    /// Chain id.
    pub cid: u64,
    pub iat: u64,
    pub exp: u64,
}
