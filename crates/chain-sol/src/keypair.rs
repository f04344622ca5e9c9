//! Ed25519 keypairs in the Solana layout.
//!
//! Solana keypair files store 64 bytes: the 32-byte secret seed followed by
//! the 32-byte public key. The signing key is zeroed on drop by
//! `ed25519-dalek`; intermediate copies made here are zeroed explicitly.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey};
use zeroize::Zeroize;

use crate::address::Address;
use crate::error::SolError;
use crate::transaction::SIGNATURE_LEN;

/// Length of a serialized Solana keypair (secret seed + public key).
pub const KEYPAIR_LEN: usize = 64;

/// An Ed25519 signing keypair.
pub struct SolKeypair {
    signing_key: SigningKey,
}

impl SolKeypair {
    /// Build a keypair from the 32-byte secret seed.
    pub fn from_secret(secret: &[u8; 32]) -> Self {
        let mut seed = *secret;
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        Self { signing_key }
    }

    /// Build a keypair from the 64-byte Solana layout.
    ///
    /// The trailing public key must match the one derived from the seed.
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self, SolError> {
        if bytes.len() != KEYPAIR_LEN {
            return Err(SolError::InvalidPrivateKey(format!(
                "expected {KEYPAIR_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        let mut buf = [0u8; KEYPAIR_LEN];
        buf.copy_from_slice(bytes);
        let result = SigningKey::from_keypair_bytes(&buf);
        buf.zeroize();

        let signing_key = result.map_err(|_| {
            SolError::InvalidPrivateKey("public key does not match secret seed".into())
        })?;
        Ok(Self { signing_key })
    }

    pub fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }

    /// Produce a detached signature over `message`.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for SolKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolKeypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
