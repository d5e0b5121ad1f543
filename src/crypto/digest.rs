//! Key hashing and log-safe key fragments.

use crate::codec::key::normalize;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex digest used to look a license up by its key.
///
/// Callers hash the canonical key form (see
/// [`crate::codec::key::canonicalize`]) so formatting differences in user
/// input resolve to the same row.
pub fn hash_license_key(license_key: &str) -> String {
    let hash = Sha256::digest(license_key.as_bytes());
    hex::encode(hash)
}

/// Last four normalized key characters, for logs.
pub fn key_fragment(license_key: &str) -> String {
    let normalized = normalize(license_key);
    if normalized.len() <= 4 {
        return "****".to_string();
    }
    format!("…{}", &normalized[normalized.len() - 4..])
}
