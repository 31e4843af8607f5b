//! Session record Redis operations.
//!
//! Redis key pattern:
//! - `session:{id}` — session data (JSON), TTL-bound
//!
//! Session JSON read back from the store is wrapped in `Zeroizing` so the
//! application-side copy is cleared after deserialization. Redis keeps its
//! own copy; this protects the Rust process memory only.

use crate::models::StoredSession;
use crate::storage::json_error;
use redis::AsyncCommands;
use zeroize::Zeroizing;

/// Store a session in Redis with TTL (default 24h).
pub async fn store_session<C>(
    con: &mut C,
    session: &StoredSession,
    ttl_secs: u64,
) -> Result<(), redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("session:{}", session.id);
    let json = serde_json::to_string(session).map_err(|e| json_error("JSON serialize", e))?;

    con.set_ex::<_, _, ()>(&key, json, ttl_secs).await?;
    Ok(())
}

/// Get a session by id.
///
/// Returns None uniformly for missing, TTL-evicted, and timestamp-expired
/// records; callers cannot distinguish the causes. The timestamp check is
/// the authoritative layer; store eviction is advisory.
pub async fn get_session<C>(
    con: &mut C,
    id: &str,
    now_secs: u64,
) -> Result<Option<StoredSession>, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("session:{}", id);
    let json: Option<String> = con.get(&key).await?;

    match json {
        Some(data) => {
            let zeroizing_data = Zeroizing::new(data);
            let session: StoredSession = serde_json::from_str(&zeroizing_data)
                .map_err(|e| json_error("JSON deserialize", e))?;
            if session.expires_at <= now_secs {
                return Ok(None);
            }
            Ok(Some(session))
        }
        None => Ok(None),
    }
}

/// Delete a session from Redis.
///
/// Idempotent: deleting an absent session is not an error. Returns true if
/// a record was actually removed.
pub async fn delete_session<C>(con: &mut C, id: &str) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("session:{}", id);
    let deleted: i32 = con.del(&key).await?;
    Ok(deleted > 0)
}
