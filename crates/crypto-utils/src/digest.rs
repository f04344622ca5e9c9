//! SHA-256 content digests in hex form.
//!
//! Digests here are integrity and deduplication tags, not secrets. The hex
//! form is lowercase, 64 characters.

use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// Length of a SHA-256 digest in bytes.
pub const SHA256_LEN: usize = 32;

pub fn sha256(data: &[u8]) -> [u8; SHA256_LEN] {
    Sha256::digest(data).into()
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Check that `expected_hex` is the SHA-256 of `data`.
///
/// Hex case is ignored. Malformed hex is an `InvalidInput` error, a well
/// formed but different digest is `DigestMismatch`.
pub fn verify_sha256_hex(data: &[u8], expected_hex: &str) -> Result<(), CryptoError> {
    let expected = hex::decode(expected_hex)
        .map_err(|e| CryptoError::InvalidInput(format!("digest is not hex: {e}")))?;
    if expected.len() != SHA256_LEN {
        return Err(CryptoError::InvalidInput(format!(
            "digest must be {SHA256_LEN} bytes, got {}",
            expected.len()
        )));
    }

    if expected.as_slice() != sha256(data).as_slice() {
        return Err(CryptoError::DigestMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn known_vector_abc() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hex_is_lowercase_and_64_chars() {
        let digest = sha256_hex(b"lumos");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn single_bit_flip_changes_digest() {
        let data = vec![0x5Au8; 256];
        let original = sha256(&data);

        for bit in [0usize, 7, 1000, 2047] {
            let mut flipped = data.clone();
            flipped[bit / 8] ^= 1 << (bit % 8);
            assert_ne!(sha256(&flipped), original, "bit {bit} did not change digest");
        }
    }

    #[test]
    fn verify_accepts_matching_digest_in_any_case() {
        let digest = sha256_hex(b"payload");
        assert!(verify_sha256_hex(b"payload", &digest).is_ok());
        assert!(verify_sha256_hex(b"payload", &digest.to_uppercase()).is_ok());
    }

    #[test]
    fn verify_rejects_other_data() {
        let digest = sha256_hex(b"payload");
        assert!(matches!(
            verify_sha256_hex(b"payloae", &digest),
            Err(CryptoError::DigestMismatch)
        ));
    }

    #[test]
    fn verify_rejects_malformed_hex() {
        assert!(matches!(
            verify_sha256_hex(b"x", "zz"),
            Err(CryptoError::InvalidInput(_))
        ));
        assert!(matches!(
            verify_sha256_hex(b"x", "abcd"),
            Err(CryptoError::InvalidInput(_))
        ));
    }
}
