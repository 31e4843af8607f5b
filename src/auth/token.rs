//! Bearer token issue and validation (HS256).
//!
//! Tokens are the standard three-part `header.payload.signature` base64url
//! form, HMAC-SHA256 over header+payload with the server-held secret. The
//! validator checks the signature in constant time, then the expiry with
//! zero leeway; the two failures are distinct. It never consults the
//! session store. Callers that need liveness also call the store with the
//! session id from the payload.
//!
//! Rotation: the current secret signs and validates; an optional previous
//! secret is accepted for validation only, so a rollover does not break
//! outstanding tokens.

use crate::config::Config;
use crate::error::AuthError;
use crate::models::{StoredSession, TokenClaims};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Mint a bearer token for a session.
///
/// The token's expiry is copied from the session record, so it can never
/// exceed the session's own expiry. Tokens are minted once per session and
/// never renewed in place; refreshing means a new challenge/session/token.
pub fn issue_token(config: &Config, session: &StoredSession) -> Result<String, AuthError> {
    let claims = TokenClaims {
        sub: session.address.clone(),
        sid: session.id.clone(),
        cid: session.chain_id,
        iat: session.issued_at,
        exp: session.expires_at,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.signing_secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("Token signing failed: {}", e)))
}

/// Validate a bearer token and return its claims.
///
/// Fails with `TokenExpired` when the signature is authentic but the expiry
/// has passed, and `InvalidToken` for every other defect.
pub fn validate_token(config: &Config, token: &str) -> Result<TokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Zero leeway: an expiry one second in the past is expired
    validation.leeway = 0;
    decode_with_rotation(config, token, &validation)
}

/// Validate a bearer token's signature while ignoring its expiry.
///
/// Used by revocation: an authentic but expired token still identifies the
/// session to delete, and that session is equally dead either way.
pub fn validate_token_ignore_expiry(
    config: &Config,
    token: &str,
) -> Result<TokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = false;
    decode_with_rotation(config, token, &validation)
}

/// Try the current secret, then the previous one. An expiry failure from
/// either key is reported as `TokenExpired`; rotation must never downgrade
/// an expired-but-authentic token to `InvalidToken`.
fn decode_with_rotation(
    config: &Config,
    token: &str,
    validation: &Validation,
) -> Result<TokenClaims, AuthError> {
    let mut saw_expired = false;

    let secrets = std::iter::once(config.signing_secret.as_str())
        .chain(config.previous_signing_secret.as_deref());

    for secret in secrets {
        match decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            validation,
        ) {
            Ok(data) => return Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => saw_expired = true,
            Err(_) => {}
        }
    }

    if saw_expired {
        Err(AuthError::TokenExpired)
    } else {
        Err(AuthError::InvalidToken)
    }
}
