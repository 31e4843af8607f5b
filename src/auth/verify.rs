//! EIP-191 signature verification by public-key recovery.
//!
//! Verification operates on the literal submitted message bytes. The struct
//! the challenge was built from is never re-serialized here, because a
//! re-built text can desynchronize from what the wallet actually signed.

use alloy_primitives::Address;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use tiny_keccak::{Hasher, Keccak};

/// Verify an EIP-191 `personal_sign` signature against a message and a
/// claimed address.
///
/// The message is prefixed with `"\x19Ethereum Signed Message:\n{len}"`,
/// hashed with keccak-256, and the signer's address is recovered from the
/// 65-byte `r || s || v` signature and compared to `claimed`. The comparison
/// is case-insensitive because both sides are typed addresses.
///
/// Malformed input of any shape (bad hex, wrong length, out-of-range
/// recovery id, unrecoverable signature) is a verification failure, never
/// an error.
pub fn verify_signature(message: &[u8], signature_hex: &str, claimed: &Address) -> bool {
    match recover_address(message, signature_hex) {
        Some(recovered) => recovered == *claimed,
        None => false,
    }
}

/// Recover the signing address from an EIP-191 signature over `message`.
pub fn recover_address(message: &[u8], signature_hex: &str) -> Option<Address> {
    let sig_bytes = hex::decode(signature_hex.trim_start_matches("0x")).ok()?;

    if sig_bytes.len() != 65 {
        return None;
    }

    // Split into r+s (64 bytes) and v (1 byte)
    let (rs, v_byte) = sig_bytes.split_at(64);
    let v = match v_byte[0] {
        0 | 27 => 0u8,
        1 | 28 => 1u8,
        _ => return None,
    };

    let signature = Signature::from_slice(rs).ok()?;
    let recovery_id = RecoveryId::new(v != 0, false);

    let digest = eip191_hash(message);

    let verifying_key =
        VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id).ok()?;

    // Derive address from uncompressed public key (skip 0x04 prefix byte)
    let encoded = verifying_key.to_encoded_point(false);
    let pubkey_uncompressed = &encoded.as_bytes()[1..];
    let address_hash = keccak256(pubkey_uncompressed);

    Some(Address::from_slice(&address_hash[12..]))
}

/// Keccak-256 digest of the EIP-191 prefixed message.
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(prefix.as_bytes());
    hasher.update(message);
    hasher.finalize(&mut output);
    output
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}
