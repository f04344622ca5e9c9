//! Manual Solana transaction wire format.
//!
//! We build Solana legacy transactions entirely by hand, no `solana-sdk`
//! dependency. The wire format is a compact binary layout:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```
//!
//! A signature slot that has not been filled yet is 64 zero bytes. This is
//! how partially signed transactions travel between parties.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signature, VerifyingKey};

use crate::address::{Address, ADDRESS_LEN};
use crate::error::SolError;

// ---------------------------------------------------------------------------
// Solana System Program
// ---------------------------------------------------------------------------

/// The Solana System Program: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: Address = Address::new([0u8; 32]);

/// System Program `Transfer` instruction index (little-endian u32).
const SYSTEM_TRANSFER_IX_INDEX: u32 = 2;

/// Ed25519 signature length.
pub const SIGNATURE_LEN: usize = 64;

/// Placeholder written into signature slots that are still unsigned.
pub const EMPTY_SIGNATURE: [u8; SIGNATURE_LEN] = [0u8; SIGNATURE_LEN];

/// Top bit of the first message byte marks a versioned (v0+) message.
const VERSION_PREFIX_MASK: u8 = 0x80;

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` value in Solana's compact-u16 format.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decode a compact-u16 value from a byte slice.
///
/// Returns `(value, bytes_consumed)`. Only the shortest encoding of a value
/// is accepted: a trailing zero byte after a continuation, a continuation
/// bit on the third byte, or a value above `u16::MAX` is an error, the same
/// as the ledger's own decoder.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), SolError> {
    let mut value: u32 = 0;

    for nth in 0..3 {
        let byte = *data.get(nth).ok_or_else(|| {
            SolError::SerializationError(
                "unexpected end of data while decoding compact-u16".into(),
            )
        })?;

        if byte == 0 && nth > 0 {
            return Err(SolError::SerializationError(
                "non-canonical compact-u16 encoding".into(),
            ));
        }
        if nth == 2 && byte & 0x80 != 0 {
            return Err(SolError::SerializationError(
                "compact-u16 longer than 3 bytes".into(),
            ));
        }

        value |= ((byte & 0x7f) as u32) << (7 * nth as u32);
        if byte & 0x80 == 0 {
            if value > u16::MAX as u32 {
                return Err(SolError::SerializationError(
                    "compact-u16 value overflow".into(),
                ));
            }
            return Ok((value as u16, nth + 1));
        }
    }

    Err(SolError::SerializationError(
        "compact-u16 longer than 3 bytes".into(),
    ))
}

fn compact_len(len: usize, what: &str) -> Result<Vec<u8>, SolError> {
    let len = u16::try_from(len)
        .map_err(|_| SolError::SerializationError(format!("too many {what}: {len}")))?;
    Ok(encode_compact_u16(len))
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A recent blockhash: the 32-byte ledger checkpoint a message is bound to.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blockhash([u8; 32]);

impl Blockhash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for Blockhash {
    type Err = SolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| SolError::InvalidBlockhash(format!("base58 decode failed: {e}")))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            SolError::InvalidBlockhash(format!("expected 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blockhash({self})")
    }
}

/// A single account reference in a Solana instruction.
#[derive(Debug, Clone)]
pub struct SolAccountMeta {
    pub pubkey: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// A Solana instruction (before it is compiled into a message).
#[derive(Debug, Clone)]
pub struct SolInstruction {
    pub program_id: Address,
    pub accounts: Vec<SolAccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled legacy message: the exact structure that gets signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolMessage {
    /// All account keys referenced by this message, in canonical order:
    ///   1. writable signers
    ///   2. read-only signers
    ///   3. writable non-signers
    ///   4. read-only non-signers
    pub account_keys: Vec<Address>,

    /// Number of required signatures (first N accounts are signers).
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned: u8,

    pub recent_blockhash: Blockhash,

    /// Compiled instructions (account references replaced with indices).
    pub instructions: Vec<CompiledInstruction>,
}

/// A compiled instruction where account references are replaced by u8 indices
/// into the message's `account_keys` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

impl SolMessage {
    /// The accounts whose signatures this message requires, in slot order.
    pub fn signer_keys(&self) -> &[Address] {
        let n = (self.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// Signature slot index for `key`, if it is a required signer.
    pub fn signer_index(&self, key: &Address) -> Option<usize> {
        self.signer_keys().iter().position(|k| k == key)
    }

    /// Every System Program transfer carried by this message, in order.
    pub fn system_transfers(&self) -> Vec<SystemTransfer> {
        self.instructions
            .iter()
            .filter_map(|ix| SystemTransfer::from_compiled(self, ix))
            .collect()
    }
}

/// A System Program `Transfer` of native lamports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemTransfer {
    pub from: Address,
    pub to: Address,
    pub lamports: u64,
}

impl SystemTransfer {
    /// Build the uncompiled instruction.
    ///
    /// Data layout: u32 LE instruction index (2 = Transfer) + u64 LE lamports.
    pub fn instruction(&self) -> SolInstruction {
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&SYSTEM_TRANSFER_IX_INDEX.to_le_bytes());
        data.extend_from_slice(&self.lamports.to_le_bytes());

        SolInstruction {
            program_id: SYSTEM_PROGRAM_ID,
            accounts: vec![
                SolAccountMeta {
                    pubkey: self.from,
                    is_signer: true,
                    is_writable: true,
                },
                SolAccountMeta {
                    pubkey: self.to,
                    is_signer: false,
                    is_writable: true,
                },
            ],
            data,
        }
    }

    /// Recognise a compiled System Program transfer inside `message`.
    ///
    /// Returns `None` for any other instruction.
    pub fn from_compiled(message: &SolMessage, ix: &CompiledInstruction) -> Option<Self> {
        let program = message.account_keys.get(ix.program_id_index as usize)?;
        if *program != SYSTEM_PROGRAM_ID || ix.data.len() != 12 || ix.account_indices.len() != 2
        {
            return None;
        }

        let index = u32::from_le_bytes(ix.data[..4].try_into().ok()?);
        if index != SYSTEM_TRANSFER_IX_INDEX {
            return None;
        }
        let lamports = u64::from_le_bytes(ix.data[4..].try_into().ok()?);

        Some(Self {
            from: *message.account_keys.get(ix.account_indices[0] as usize)?,
            to: *message.account_keys.get(ix.account_indices[1] as usize)?,
            lamports,
        })
    }
}

// ---------------------------------------------------------------------------
// Message compilation
// ---------------------------------------------------------------------------

/// Compile a native transfer into a message.
///
/// `fee_payer` takes the first signer slot. When it differs from the sender
/// the message requires two signatures: fee payer first, sender second.
pub fn build_sol_transfer(
    transfer: &SystemTransfer,
    fee_payer: &Address,
    recent_blockhash: &Blockhash,
) -> Result<SolMessage, SolError> {
    compile_transaction(&[transfer.instruction()], fee_payer, recent_blockhash)
}

/// Compile a set of instructions with a single fee payer.
///
/// The fee payer is always the first signer and is placed at index 0 in the
/// account keys.
pub fn compile_transaction(
    instructions: &[SolInstruction],
    fee_payer: &Address,
    recent_blockhash: &Blockhash,
) -> Result<SolMessage, SolError> {
    struct AccountEntry {
        pubkey: Address,
        is_signer: bool,
        is_writable: bool,
    }

    let mut entries: Vec<AccountEntry> = Vec::new();

    let mut upsert = |pubkey: Address, signer: bool, writable: bool| {
        if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
            entry.is_signer |= signer;
            entry.is_writable |= writable;
        } else {
            entries.push(AccountEntry {
                pubkey,
                is_signer: signer,
                is_writable: writable,
            });
        }
    };

    // Fee payer is always signer + writable.
    upsert(*fee_payer, true, true);

    for ix in instructions {
        for meta in &ix.accounts {
            upsert(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        // Program IDs are non-signer, read-only accounts.
        upsert(ix.program_id, false, false);
    }

    // Stable sort: within a category insertion order is kept, so the fee
    // payer (inserted first, writable signer) stays at index 0.
    entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
        (true, true) => 0u8,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    if entries.len() > u8::MAX as usize {
        return Err(SolError::TransactionBuildError(format!(
            "too many accounts: {}",
            entries.len()
        )));
    }
    if entries.first().map(|e| e.pubkey) != Some(*fee_payer) {
        return Err(SolError::TransactionBuildError(
            "fee payer must be the first account".into(),
        ));
    }

    let count = |pred: fn(&AccountEntry) -> bool| entries.iter().filter(|e| pred(e)).count() as u8;
    let num_required_signatures = count(|e| e.is_signer);
    let num_readonly_signed = count(|e| e.is_signer && !e.is_writable);
    let num_readonly_unsigned = count(|e| !e.is_signer && !e.is_writable);

    let account_keys: Vec<Address> = entries.iter().map(|e| e.pubkey).collect();
    let index_of = |key: &Address| -> Result<u8, SolError> {
        account_keys
            .iter()
            .position(|k| k == key)
            .map(|i| i as u8)
            .ok_or_else(|| SolError::TransactionBuildError(format!("{key} not in account keys")))
    };

    let mut compiled = Vec::with_capacity(instructions.len());
    for ix in instructions {
        let program_id_index = index_of(&ix.program_id)?;
        let account_indices = ix
            .accounts
            .iter()
            .map(|meta| index_of(&meta.pubkey))
            .collect::<Result<Vec<_>, _>>()?;

        compiled.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data: ix.data.clone(),
        });
    }

    Ok(SolMessage {
        account_keys,
        num_required_signatures,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash: *recent_blockhash,
        instructions: compiled,
    })
}

// ---------------------------------------------------------------------------
// Message (de)serialization
// ---------------------------------------------------------------------------

/// Serialize the message: the bytes that get signed.
pub fn serialize_message(message: &SolMessage) -> Result<Vec<u8>, SolError> {
    let mut buf = Vec::with_capacity(256);

    buf.push(message.num_required_signatures);
    buf.push(message.num_readonly_signed);
    buf.push(message.num_readonly_unsigned);

    buf.extend_from_slice(&compact_len(message.account_keys.len(), "account keys")?);
    for key in &message.account_keys {
        buf.extend_from_slice(key.as_bytes());
    }

    buf.extend_from_slice(message.recent_blockhash.as_bytes());

    buf.extend_from_slice(&compact_len(message.instructions.len(), "instructions")?);
    for ix in &message.instructions {
        buf.push(ix.program_id_index);

        buf.extend_from_slice(&compact_len(ix.account_indices.len(), "instruction accounts")?);
        buf.extend_from_slice(&ix.account_indices);

        buf.extend_from_slice(&compact_len(ix.data.len(), "instruction data bytes")?);
        buf.extend_from_slice(&ix.data);
    }

    Ok(buf)
}

/// Parse a legacy message. The whole slice must be consumed.
pub fn deserialize_message(bytes: &[u8]) -> Result<SolMessage, SolError> {
    let mut reader = Reader::new(bytes);

    let num_required_signatures = reader.read_u8("message header")?;
    if num_required_signatures & VERSION_PREFIX_MASK != 0 {
        return Err(SolError::SerializationError(
            "versioned messages are not supported".into(),
        ));
    }
    let num_readonly_signed = reader.read_u8("message header")?;
    let num_readonly_unsigned = reader.read_u8("message header")?;

    let num_accounts = reader.read_compact_u16()? as usize;
    let mut account_keys = Vec::with_capacity(num_accounts);
    for _ in 0..num_accounts {
        account_keys.push(Address::new(reader.read_array::<ADDRESS_LEN>("account key")?));
    }
    if (num_required_signatures as usize) > account_keys.len() {
        return Err(SolError::SerializationError(
            "more required signatures than account keys".into(),
        ));
    }

    let recent_blockhash = Blockhash::new(reader.read_array::<32>("recent blockhash")?);

    let num_instructions = reader.read_compact_u16()? as usize;
    let mut instructions = Vec::with_capacity(num_instructions);
    for _ in 0..num_instructions {
        let program_id_index = reader.read_u8("program id index")?;
        let n = reader.read_compact_u16()? as usize;
        let account_indices = reader.read_bytes(n, "account indices")?.to_vec();
        let n = reader.read_compact_u16()? as usize;
        let data = reader.read_bytes(n, "instruction data")?.to_vec();

        let out_of_range = std::iter::once(program_id_index)
            .chain(account_indices.iter().copied())
            .any(|i| i as usize >= account_keys.len());
        if out_of_range {
            return Err(SolError::SerializationError(
                "instruction references unknown account".into(),
            ));
        }

        instructions.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data,
        });
    }

    if !reader.is_empty() {
        return Err(SolError::SerializationError(format!(
            "{} trailing bytes after message",
            reader.remaining()
        )));
    }

    Ok(SolMessage {
        account_keys,
        num_required_signatures,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash,
        instructions,
    })
}

// ---------------------------------------------------------------------------
// Wire transactions
// ---------------------------------------------------------------------------

/// A decoded wire transaction: signature slots plus the message they cover.
#[derive(Debug, Clone)]
pub struct WireTransaction {
    pub signatures: Vec<[u8; SIGNATURE_LEN]>,
    pub message: SolMessage,
    /// The exact message bytes as they appeared on the wire.
    pub message_bytes: Vec<u8>,
}

impl WireTransaction {
    /// Whether the slot belonging to `key` holds a valid signature.
    pub fn is_signed_by(&self, key: &Address) -> bool {
        self.message
            .signer_index(key)
            .and_then(|i| self.signatures.get(i))
            .is_some_and(|sig| verify_signature(key, &self.message_bytes, sig).is_ok())
    }

    /// Required signers whose slot is still empty.
    pub fn missing_signers(&self) -> Vec<Address> {
        self.message
            .signer_keys()
            .iter()
            .zip(&self.signatures)
            .filter(|(_, sig)| **sig == EMPTY_SIGNATURE)
            .map(|(key, _)| *key)
            .collect()
    }
}

/// Assemble the wire format from signature slots and serialized message.
pub fn encode_wire_transaction(
    signatures: &[[u8; SIGNATURE_LEN]],
    message_bytes: &[u8],
) -> Result<Vec<u8>, SolError> {
    let mut wire = Vec::with_capacity(3 + signatures.len() * SIGNATURE_LEN + message_bytes.len());
    wire.extend_from_slice(&compact_len(signatures.len(), "signatures")?);
    for sig in signatures {
        wire.extend_from_slice(sig);
    }
    wire.extend_from_slice(message_bytes);
    Ok(wire)
}

/// Parse a wire-format transaction.
///
/// The number of signature slots must match the message header.
pub fn decode_wire_transaction(raw: &[u8]) -> Result<WireTransaction, SolError> {
    let mut reader = Reader::new(raw);

    let num_sigs = reader.read_compact_u16()? as usize;
    let mut signatures = Vec::with_capacity(num_sigs);
    for _ in 0..num_sigs {
        signatures.push(reader.read_array::<SIGNATURE_LEN>("signature")?);
    }

    let message_bytes = reader.rest().to_vec();
    let message = deserialize_message(&message_bytes)?;

    if message.num_required_signatures as usize != num_sigs {
        return Err(SolError::SerializationError(format!(
            "message requires {} signatures but {} slots are present",
            message.num_required_signatures, num_sigs
        )));
    }

    Ok(WireTransaction {
        signatures,
        message,
        message_bytes,
    })
}

/// Verify an Ed25519 signature made by `signer` over `message`.
pub fn verify_signature(
    signer: &Address,
    message: &[u8],
    signature: &[u8; SIGNATURE_LEN],
) -> Result<(), SolError> {
    let key = VerifyingKey::from_bytes(signer.as_bytes())
        .map_err(|e| SolError::SigningError(format!("{signer} is not an ed25519 key: {e}")))?;
    key.verify_strict(message, &Signature::from_bytes(signature))
        .map_err(|e| SolError::SigningError(format!("signature by {signer} does not verify: {e}")))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8], SolError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| SolError::SerializationError(format!("truncated {what}")))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn read_u8(&mut self, what: &str) -> Result<u8, SolError> {
        Ok(self.read_bytes(1, what)?[0])
    }

    fn read_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], SolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, what)?);
        Ok(out)
    }

    fn read_compact_u16(&mut self) -> Result<u16, SolError> {
        let (value, consumed) = decode_compact_u16(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    fn rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}
