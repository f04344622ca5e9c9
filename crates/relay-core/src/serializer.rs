//! Deterministic wire encoding of partially signed transactions.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chain_sol::{
    decode_wire_transaction, encode_wire_transaction, SystemTransfer, WireTransaction,
    EMPTY_SIGNATURE, SIGNATURE_LEN,
};

use crate::error::{RelayError, RelayResult};
use crate::signer::PartiallySignedTransaction;

/// Wire bytes and their Base64 transport form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTransaction {
    bytes: Vec<u8>,
    base64: String,
}

impl EncodedTransaction {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn into_base64(self) -> String {
        self.base64
    }
}

/// Encode to the Solana wire format.
///
/// Empty slots are written as 64 zero bytes. With `require_all_signatures`
/// set, any empty slot is an error instead. Same input, same bytes.
pub fn serialize(
    tx: &PartiallySignedTransaction,
    require_all_signatures: bool,
) -> RelayResult<EncodedTransaction> {
    if require_all_signatures && !tx.is_fully_signed() {
        let missing: Vec<String> = tx.missing_signers().iter().map(ToString::to_string).collect();
        return Err(RelayError::Serialization(format!(
            "missing signatures from {}",
            missing.join(", ")
        )));
    }

    let slots: Vec<[u8; SIGNATURE_LEN]> = tx
        .slots()
        .iter()
        .map(|sig| sig.unwrap_or(EMPTY_SIGNATURE))
        .collect();
    let bytes = encode_wire_transaction(&slots, tx.unsigned().message_bytes())?;
    let base64 = STANDARD.encode(&bytes);

    Ok(EncodedTransaction { bytes, base64 })
}

/// Parse a Base64 wire transaction.
pub fn decode(base64: &str) -> RelayResult<WireTransaction> {
    let bytes = STANDARD
        .decode(base64.trim())
        .map_err(|e| RelayError::Serialization(format!("invalid base64: {e}")))?;
    Ok(decode_wire_transaction(&bytes)?)
}

/// Parse a Base64 wire transaction holding exactly one System transfer.
pub fn decode_transfer(base64: &str) -> RelayResult<SystemTransfer> {
    let wire = decode(base64)?;
    if wire.message.instructions.len() != 1 {
        return Err(RelayError::Serialization(format!(
            "expected one instruction, found {}",
            wire.message.instructions.len()
        )));
    }
    wire.message
        .system_transfers()
        .into_iter()
        .next()
        .ok_or_else(|| RelayError::Serialization("instruction is not a System transfer".into()))
}
