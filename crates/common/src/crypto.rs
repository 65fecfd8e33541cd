//! Cryptographic utilities shared across Motionbooth crates
//!
//! Compares shared secrets by SHA-256 digest with a constant-time fold,
//! so neither the length nor the first mismatching byte leaks through timing.

use sha2::{Digest, Sha256};

/// Compare a presented secret with the configured one in constant time.
pub fn secrets_match(candidate: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }

    let candidate_hash = Sha256::digest(candidate.as_bytes());
    let expected_hash = Sha256::digest(expected.as_bytes());

    let mut result = 0u8;
    for (a, b) in candidate_hash.iter().zip(expected_hash.iter()) {
        result |= a ^ b;
    }
    result == 0
}
