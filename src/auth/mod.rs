//! Authentication layer: SIWE challenges, EIP-191 signature verification,
//! bearer tokens, and session extraction.

pub mod challenge;
pub mod middleware;
pub mod token;
pub mod verify;

pub use challenge::{create_challenge, generate_nonce, generate_session_id};
pub use middleware::{check_rate_limit, AppState, AuthSession};
pub use token::{issue_token, validate_token, validate_token_ignore_expiry};
pub use verify::verify_signature;

/// Current unix time in seconds.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}
