//! Hashes for location-derived identifiers

use sha2::{Digest, Sha256};

/// Bytes of the SHA-256 digest kept in identifiers
const HASH_BYTES: usize = 20;

/// Lowercase hex of the first 160 bits of SHA-256(`input`)
pub fn hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..HASH_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash("a.cpp@1:4"), hash("a.cpp@1:4"));
        assert_ne!(hash("a.cpp@1:4"), hash("a.cpp@1:5"));
        assert_eq!(hash("").len(), 40);
    }

    #[test]
    fn test_hash_known_value() {
        // SHA-256("abc") = ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad
        assert_eq!(hash("abc"), "ba7816bf8f01cfea414140de5dae2223b00361a3");
    }
}
