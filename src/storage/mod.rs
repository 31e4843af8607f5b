//! Redis storage layer for nonces and sessions.
//!
//! All functions are async and use redis::AsyncCommands.
//! Data is serialized to JSON for storage in Redis, with provider-native
//! TTLs set at write time.

pub mod nonce;
pub mod session;

/// Wrap a serde_json failure as a RedisError so storage functions keep a
/// single error type.
pub(crate) fn json_error(context: &'static str, err: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((
        redis::ErrorKind::TypeError,
        context,
        err.to_string(),
    ))
}
