//! Integrity envelope: digest plus idempotency metadata for one submission.

use std::fmt;
use std::str::FromStr;

use crypto_utils::digest::sha256_hex;
use crypto_utils::random::random_bytes_fixed;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RelayError, RelayResult};
use crate::serializer::EncodedTransaction;

/// Which representation of the transaction the digest commits to.
///
/// `RawBytes` matches what the relay backend recomputes after decoding.
/// `EncodedText` hashes the Base64 string itself and is byte-compatible
/// with the existing JavaScript client; use it against relays that check
/// digests that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestCommitment {
    /// SHA-256 of the decoded wire bytes. This is what the relay recomputes.
    #[default]
    RawBytes,
    /// SHA-256 of the Base64 text as sent.
    EncodedText,
}

impl DigestCommitment {
    /// Hex SHA-256 of `tx` under this commitment.
    pub fn digest(self, tx: &EncodedTransaction) -> String {
        match self {
            DigestCommitment::RawBytes => sha256_hex(tx.bytes()),
            DigestCommitment::EncodedText => sha256_hex(tx.base64().as_bytes()),
        }
    }

    /// The bytes a verifier hashes, given the transmitted Base64 text and
    /// its decoded form.
    pub(crate) fn preimage<'a>(self, base64: &'a str, decoded: &'a [u8]) -> &'a [u8] {
        match self {
            DigestCommitment::RawBytes => decoded,
            DigestCommitment::EncodedText => base64.as_bytes(),
        }
    }
}

impl FromStr for DigestCommitment {
    type Err = RelayError;

    fn from_str(s: &str) -> RelayResult<Self> {
        match s {
            "raw-bytes" => Ok(DigestCommitment::RawBytes),
            "encoded-text" => Ok(DigestCommitment::EncodedText),
            other => Err(RelayError::Config(format!(
                "digest commitment must be \"raw-bytes\" or \"encoded-text\", got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for DigestCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DigestCommitment::RawBytes => "raw-bytes",
            DigestCommitment::EncodedText => "encoded-text",
        })
    }
}

/// A fresh random (version 4) request id.
pub fn new_request_id() -> Uuid {
    uuid::Builder::from_random_bytes(random_bytes_fixed::<16>()).into_uuid()
}

/// One submission attempt. Never reused: a retry seals a new envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedEnvelope {
    transaction: EncodedTransaction,
    request_id: Uuid,
    timestamp_millis: i64,
    digest: String,
    commitment: DigestCommitment,
}

impl SerializedEnvelope {
    /// Seal with a new request id and the current wall-clock time.
    pub fn seal(transaction: EncodedTransaction, commitment: DigestCommitment) -> Self {
        Self::seal_at(
            transaction,
            commitment,
            new_request_id(),
            chrono::Utc::now().timestamp_millis(),
        )
    }

    /// Seal with explicit metadata.
    pub fn seal_at(
        transaction: EncodedTransaction,
        commitment: DigestCommitment,
        request_id: Uuid,
        timestamp_millis: i64,
    ) -> Self {
        let digest = commitment.digest(&transaction);
        Self {
            transaction,
            request_id,
            timestamp_millis,
            digest,
            commitment,
        }
    }

    pub fn transaction(&self) -> &EncodedTransaction {
        &self.transaction
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp_millis
    }

    /// Lowercase hex SHA-256.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn commitment(&self) -> DigestCommitment {
        self.commitment
    }

    pub fn to_payload(&self) -> RelayPayload {
        RelayPayload {
            transaction: self.transaction.base64().to_string(),
            request_id: self.request_id.to_string(),
            timestamp: self.timestamp_millis,
            transaction_hash: self.digest.clone(),
        }
    }
}

/// JSON body posted to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayPayload {
    /// Base64 wire transaction.
    pub transaction: String,
    pub request_id: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    pub transaction_hash: String,
}
