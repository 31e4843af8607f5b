//! Single-use nonce Redis operations.
//!
//! Redis key pattern:
//! - `nonce:{value}` — nonce record (JSON), TTL-bound
//!
//! ## Atomicity
//!
//! Consumption uses a Lua GET+DEL script, which is atomic against a single
//! Redis primary: of two concurrent requests presenting the same nonce,
//! exactly one observes the value. Against a multi-region, eventually
//! consistent deployment this degrades to best-effort exactly-once: two
//! requests hitting different replicas inside the replication window could
//! both succeed. That narrow re-use window is an accepted, documented risk
//! of the deployment model, not something this module masks.

use crate::models::StoredNonce;
use crate::storage::json_error;
use redis::AsyncCommands;
use zeroize::Zeroizing;

/// Attempts before giving up on nonce allocation. With ~143 bits of nonce
/// entropy a key collision effectively never happens; the retry exists so a
/// collision surfaces as a fresh value rather than an overwrite.
const ALLOCATE_ATTEMPTS: usize = 3;

/// Store a freshly generated nonce with TTL (default 10min).
///
/// Writes with `SET NX EX`: an existing key is never overwritten. Returns
/// false if the key already existed, in which case the caller retries with
/// a new value (see [`allocate`]).
pub async fn store_nonce<C>(
    con: &mut C,
    record: &StoredNonce,
    ttl_secs: u64,
) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("nonce:{}", record.value);
    let json = serde_json::to_string(record).map_err(|e| json_error("JSON serialize", e))?;

    let stored: Option<String> = redis::cmd("SET")
        .arg(&key)
        .arg(json)
        .arg("NX")
        .arg("EX")
        .arg(ttl_secs)
        .query_async(con)
        .await?;

    Ok(stored.is_some())
}

/// Allocate a nonce: generate, store with TTL, return the record.
///
/// A collision with an existing key is treated as allocation failure and
/// retried with a fresh value, bounded by [`ALLOCATE_ATTEMPTS`].
pub async fn allocate<C, F>(
    con: &mut C,
    ttl_secs: u64,
    now_secs: u64,
    mut generate: F,
) -> Result<StoredNonce, redis::RedisError>
where
    C: AsyncCommands,
    F: FnMut() -> String,
{
    for _ in 0..ALLOCATE_ATTEMPTS {
        let record = StoredNonce {
            value: generate(),
            created_at: now_secs,
            expires_at: now_secs + ttl_secs,
        };
        if store_nonce(con, &record, ttl_secs).await? {
            return Ok(record);
        }
    }

    Err(redis::RedisError::from((
        redis::ErrorKind::TryAgain,
        "nonce allocation",
        "repeated key collisions".to_string(),
    )))
}

/// Atomically consume a nonce (single-use).
///
/// Uses a Lua script for atomic GET+DEL, then checks the record's own
/// expiry timestamp: store eviction is advisory, the timestamp check is
/// authoritative. Returns false for absent, evicted, and expired nonces;
/// the caller cannot distinguish the three, by contract.
pub async fn consume<C>(
    con: &mut C,
    value: &str,
    now_secs: u64,
) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("nonce:{}", value);

    // Lua script for atomic GET + DEL
    let script = redis::Script::new(
        r"
        local val = redis.call('GET', KEYS[1])
        if val then
            redis.call('DEL', KEYS[1])
        end
        return val
        ",
    );

    let json: Option<String> = script.key(&key).invoke_async(con).await?;

    match json {
        Some(data) => {
            let zeroizing_data = Zeroizing::new(data);
            let record: StoredNonce = serde_json::from_str(&zeroizing_data)
                .map_err(|e| json_error("JSON deserialize", e))?;
            Ok(record.expires_at > now_secs)
        }
        None => Ok(false),
    }
}
