//! Signing capability used by the pipeline.
//!
//! The pipeline never sees private keys. It holds something that can report
//! its public address and sign a byte buffer; [`LocalKeypair`] is the
//! file-backed implementation.

use std::fmt;
use std::path::Path;

use chain_sol::{Address, SolKeypair, KEYPAIR_LEN, SIGNATURE_LEN};
use crypto_utils::zeroizing::{ZeroizingBytes, ZeroizingString};
use serde::de::{self, DeserializeSeed, Deserializer, SeqAccess, Visitor};

use crate::error::{RelayError, RelayResult};

/// A key that can produce detached Ed25519 signatures.
pub trait TransferSigner: Send + Sync {
    fn address(&self) -> Address;

    fn sign(&self, message: &[u8]) -> RelayResult<[u8; SIGNATURE_LEN]>;
}

/// An in-process keypair.
///
/// The signing key is zeroed when this value is dropped.
pub struct LocalKeypair {
    inner: SolKeypair,
}

impl LocalKeypair {
    pub fn new(inner: SolKeypair) -> Self {
        Self { inner }
    }

    /// From the 64-byte Solana layout (secret seed followed by public key).
    pub fn from_keypair_bytes(bytes: &[u8]) -> RelayResult<Self> {
        Ok(Self::new(SolKeypair::from_keypair_bytes(bytes)?))
    }

    /// Load a Solana CLI keypair file: a JSON array of 64 integers.
    ///
    /// The file text and the decoded bytes live in zeroizing buffers and are
    /// wiped before this returns, on success and on every error path.
    pub fn from_keypair_file(path: impl AsRef<Path>) -> RelayResult<Self> {
        let path = path.as_ref();
        let text = ZeroizingString::new(std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("cannot read keypair {}: {e}", path.display()))
        })?);

        let mut bytes = ZeroizingBytes::with_capacity(KEYPAIR_LEN);
        let mut de = serde_json::Deserializer::from_str(&text);
        KeypairBytes(&mut bytes)
            .deserialize(&mut de)
            .and_then(|()| de.end())
            .map_err(|e| {
                RelayError::SigningFailure(format!(
                    "{} is not a JSON array of {KEYPAIR_LEN} bytes: {e}",
                    path.display()
                ))
            })?;
        bytes
            .ensure_len(KEYPAIR_LEN)
            .map_err(|e| RelayError::SigningFailure(format!("{}: {e}", path.display())))?;

        let keypair = Self::from_keypair_bytes(&bytes)?;
        tracing::debug!(address = %keypair.address(), "loaded keypair");
        Ok(keypair)
    }
}

/// Reads a JSON byte array straight into a fixed-size zeroizing buffer.
struct KeypairBytes<'a>(&'a mut ZeroizingBytes);

impl<'de> DeserializeSeed<'de> for KeypairBytes<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for KeypairBytes<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an array of {KEYPAIR_LEN} bytes")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        let buf = self.0;
        while let Some(byte) = seq.next_element::<u8>()? {
            buf.push_within_capacity(byte).map_err(de::Error::custom)?;
        }
        Ok(())
    }
}

impl TransferSigner for LocalKeypair {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn sign(&self, message: &[u8]) -> RelayResult<[u8; SIGNATURE_LEN]> {
        Ok(self.inner.sign(message))
    }
}

impl fmt::Debug for LocalKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeypair")
            .field("address", &self.inner.address())
            .finish_non_exhaustive()
    }
}
