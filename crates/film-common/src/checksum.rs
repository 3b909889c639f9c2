//! Content digests for stored attachments

use crate::error::{FilmCommonError, Result};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Checks `data` against an expected hex digest (case-insensitive).
pub fn verify_sha256(data: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(data);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(FilmCommonError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
