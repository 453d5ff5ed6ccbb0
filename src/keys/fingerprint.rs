//! Log-safe key fingerprints.
//!
//! Generated and validated keys are never written to logs. Log events carry
//! a short SHA-256 prefix instead, enough to correlate entries for the same
//! key without exposing it.

use sha2::{Digest, Sha256};

/// Hex characters kept from the digest (48 bits).
pub const FINGERPRINT_HEX_LEN: usize = 12;

/// Compute the log fingerprint of a key.
pub fn fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_HEX_LEN);
    hex
}
