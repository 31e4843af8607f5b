//! Challenge construction: nonce generation and canonical EIP-4361 text.
//!
//! The rendered message is canonical (fixed field order and formatting) so
//! the exact bytes the wallet signs can be re-verified byte-for-byte.
//! The message is ephemeral; only the nonce is persisted.

use crate::config::Config;
use crate::error::AuthError;
use alloy_primitives::Address;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use rand::{distr::Alphanumeric, Rng};

/// EIP-4361 protocol version constant.
const SIWE_VERSION: &str = "1";

/// Nonce length in alphanumeric characters. 24 chars over a 62-symbol
/// alphabet is ~143 bits of entropy; EIP-4361 requires alphanumeric and at
/// least 8 characters.
const NONCE_LEN: usize = 24;

/// Generate a cryptographically random challenge nonce.
pub fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Generate a cryptographically random session id.
///
/// Returns a base64-encoded string (44 characters) from 32 random bytes.
pub fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    general_purpose::STANDARD.encode(bytes)
}

/// Parse and validate an account address.
pub fn parse_address(address: &str) -> Result<Address, AuthError> {
    address
        .parse::<Address>()
        .map_err(|_| AuthError::InvalidAddress(address.to_string()))
}

/// Check that a chain id is in the configured supported set.
pub fn check_chain_id(config: &Config, chain_id: u64) -> Result<(), AuthError> {
    if !config.supported_chain_ids.contains(&chain_id) {
        return Err(AuthError::InvalidChain(chain_id));
    }
    Ok(())
}

/// Render the canonical EIP-4361 challenge text for a nonce.
///
/// `issued_at` is unix seconds; the message's expiration time is
/// `issued_at + challenge_window_secs`, independent of the nonce's own
/// shorter TTL, which is what actually bounds replay. The address is
/// rendered in its EIP-55 checksummed form.
pub fn create_challenge(
    config: &Config,
    address: &Address,
    chain_id: u64,
    nonce: &str,
    issued_at: u64,
) -> Result<String, AuthError> {
    let issued = rfc3339(issued_at)?;
    let expiration = rfc3339(issued_at + config.challenge_window_secs)?;

    let mut message = format!(
        "{domain} wants you to sign in with your Ethereum account:\n\
         {address}\n\
         \n\
         {statement}\n\
         \n\
         URI: {uri}\n\
         Version: {version}\n\
         Chain ID: {chain_id}\n\
         Nonce: {nonce}\n\
         Issued At: {issued}\n\
         Expiration Time: {expiration}",
        domain = config.siwe_domain,
        address = address.to_checksum(None),
        statement = config.siwe_statement,
        uri = config.siwe_uri,
        version = SIWE_VERSION,
    );

    if !config.siwe_resources.is_empty() {
        message.push_str("\nResources:");
        for resource in &config.siwe_resources {
            message.push_str("\n- ");
            message.push_str(resource);
        }
    }

    Ok(message)
}

fn rfc3339(unix_secs: u64) -> Result<String, AuthError> {
    let ts: DateTime<Utc> = Utc
        .timestamp_opt(unix_secs as i64, 0)
        .single()
        .ok_or_else(|| AuthError::Internal(format!("timestamp out of range: {}", unix_secs)))?;
    Ok(ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}
