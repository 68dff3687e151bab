//! Booking reference, PIN, and access token generation.

use rand::prelude::RngExt;
use rand::rng;
use sha2::{Digest, Sha256};

/// 32-symbol alphabet for booking references, with visually ambiguous
/// characters removed (no 0/O, no 1/I).
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const REFERENCE_PREFIX: &str = "BK-";
const REFERENCE_SUFFIX_LEN: usize = 3;

/// Minimum length a presented access token must have before we bother
/// hashing it. Real tokens are 64 hex characters.
pub const MIN_TOKEN_LEN: usize = 32;

/// Generate a human-shareable booking reference in the form `BK-XXX`.
///
/// Not unique by construction: the bookings repository checks the candidate
/// against persisted rows and retries generation on collision.
pub fn generate_booking_reference() -> String {
    let mut reference = String::with_capacity(REFERENCE_PREFIX.len() + REFERENCE_SUFFIX_LEN);
    reference.push_str(REFERENCE_PREFIX);
    for _ in 0..REFERENCE_SUFFIX_LEN {
        let idx = rng().random_range(0..REFERENCE_ALPHABET.len());
        reference.push(REFERENCE_ALPHABET[idx] as char);
    }
    reference
}

/// Generate a uniformly distributed 6-digit booking PIN.
///
/// The PIN is a secondary factor for guest self-service lookup alongside the
/// booking reference, not a cryptographic secret, and is not unique.
pub fn generate_booking_pin() -> String {
    rng().random_range(100_000..=999_999u32).to_string()
}

/// Generate a raw booking access token: 32 bytes (256 bits) of
/// cryptographically secure random data, lowercase hex encoded (64 chars).
///
/// Only the SHA-256 hash of this value is ever persisted.
pub fn generate_access_token() -> String {
    let mut token_bytes = [0u8; 32];
    rng().fill(&mut token_bytes);
    hex::encode(token_bytes)
}

/// Hash a raw access token for storage and lookup (lowercase hex SHA-256).
pub fn hash_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reference_alphabet_size_and_content() {
        assert_eq!(REFERENCE_ALPHABET.len(), 32);
        for ambiguous in [b'0', b'O', b'1', b'I'] {
            assert!(!REFERENCE_ALPHABET.contains(&ambiguous));
        }
    }

    #[test]
    fn test_reference_format() {
        for _ in 0..100 {
            let reference = generate_booking_reference();
            assert_eq!(reference.len(), 6);
            assert!(reference.starts_with("BK-"));
            assert!(reference[3..].bytes().all(|b| REFERENCE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_pin_format() {
        for _ in 0..100 {
            let pin = generate_booking_pin();
            assert_eq!(pin.len(), 6);
            let value: u32 = pin.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn test_access_token_format_and_uniqueness() {
        let mut tokens = HashSet::new();
        for _ in 0..1000 {
            let token = generate_access_token();
            assert_eq!(token.len(), 64);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
            assert!(tokens.insert(token), "Generated duplicate access token");
        }
    }

    #[test]
    fn test_hash_token_is_stable_and_not_reversible_by_eye() {
        let raw = generate_access_token();
        let hash = hash_token(&raw);

        assert_eq!(hash.len(), 64);
        assert_ne!(hash, raw);
        // Same input, same hash - lookup by hash equality depends on this
        assert_eq!(hash, hash_token(&raw));
        // Different input, different hash
        assert_ne!(hash, hash_token(&generate_access_token()));
    }
}
