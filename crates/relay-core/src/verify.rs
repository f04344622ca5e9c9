//! Stateless checks a relay runs on an incoming payload before co-signing.
//!
//! Replay protection (remembering request ids) needs storage and belongs to
//! the relay itself; this only checks what can be checked from the payload.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chain_sol::{decode_wire_transaction, SystemTransfer, WireTransaction, SYSTEM_PROGRAM_ID};
use crypto_utils::digest::verify_sha256_hex;
use uuid::Uuid;

use crate::envelope::{DigestCommitment, RelayPayload};
use crate::error::{RelayError, RelayResult};

/// How far a payload timestamp may drift from the verifier's clock.
pub const DEFAULT_REQUEST_TTL_MILLIS: i64 = 300_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeVerifier {
    ttl_millis: i64,
    commitment: DigestCommitment,
}

impl Default for EnvelopeVerifier {
    fn default() -> Self {
        Self::new(DigestCommitment::default())
    }
}

impl EnvelopeVerifier {
    pub fn new(commitment: DigestCommitment) -> Self {
        Self {
            ttl_millis: DEFAULT_REQUEST_TTL_MILLIS,
            commitment,
        }
    }

    pub fn with_ttl_millis(mut self, ttl_millis: i64) -> Self {
        self.ttl_millis = ttl_millis;
        self
    }

    /// Verify against the current wall clock.
    pub fn verify_now(&self, payload: &RelayPayload) -> RelayResult<WireTransaction> {
        self.verify(payload, chrono::Utc::now().timestamp_millis())
    }

    /// Check freshness, request id format, digest and instruction set.
    ///
    /// Returns the decoded transaction so the caller can co-sign it.
    pub fn verify(&self, payload: &RelayPayload, now_millis: i64) -> RelayResult<WireTransaction> {
        let age = now_millis.saturating_sub(payload.timestamp);
        if age.saturating_abs() > self.ttl_millis {
            return Err(RelayError::Verification(format!(
                "request expired: timestamp {} is {age} ms from now",
                payload.timestamp
            )));
        }

        Uuid::parse_str(&payload.request_id).map_err(|e| {
            RelayError::Verification(format!("bad request id {:?}: {e}", payload.request_id))
        })?;

        let bytes = STANDARD
            .decode(&payload.transaction)
            .map_err(|e| RelayError::Verification(format!("invalid base64: {e}")))?;
        verify_sha256_hex(
            self.commitment.preimage(&payload.transaction, &bytes),
            &payload.transaction_hash,
        )?;

        let wire = decode_wire_transaction(&bytes)
            .map_err(|e| RelayError::Verification(format!("undecodable transaction: {e}")))?;
        check_only_system_transfers(&wire)?;

        tracing::debug!(request_id = %payload.request_id, "envelope verified");
        Ok(wire)
    }
}

fn check_only_system_transfers(wire: &WireTransaction) -> RelayResult<()> {
    let message = &wire.message;
    if message.instructions.is_empty() {
        return Err(RelayError::Verification("transaction has no instructions".into()));
    }
    for ix in &message.instructions {
        let program = message.account_keys.get(ix.program_id_index as usize);
        if program != Some(&SYSTEM_PROGRAM_ID) {
            return Err(RelayError::Verification("invalid program".into()));
        }
        if SystemTransfer::from_compiled(message, ix).is_none() {
            return Err(RelayError::Verification("invalid transaction type".into()));
        }
    }
    Ok(())
}
