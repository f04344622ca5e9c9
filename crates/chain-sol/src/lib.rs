//! Solana chain support for the Lumos relay client.
//!
//! This crate handles Solana addresses, manual transaction wire format
//! serialization, Ed25519 keypairs and SPL token account decoding, all
//! without pulling in `solana-sdk` (which drags in 200+ transitive
//! dependencies).
//!
//! Instead we implement Solana's compact binary wire format by hand, using
//! `ed25519-dalek` for Ed25519 signing and `bs58` for Base58 encoding.

pub mod address;
pub mod error;
pub mod keypair;
pub mod spl_token;
pub mod transaction;

pub use address::{Address, ADDRESS_LEN};
pub use error::SolError;
pub use keypair::{SolKeypair, KEYPAIR_LEN};
pub use spl_token::{
    derive_associated_token_address, TokenAccount, ASSOCIATED_TOKEN_PROGRAM_ID, TOKEN_PROGRAM_ID,
};
pub use transaction::{
    build_sol_transfer, compile_transaction, decode_wire_transaction, deserialize_message,
    encode_wire_transaction, serialize_message, verify_signature, Blockhash, CompiledInstruction,
    SolAccountMeta, SolInstruction, SolMessage, SystemTransfer, WireTransaction,
    EMPTY_SIGNATURE, SIGNATURE_LEN, SYSTEM_PROGRAM_ID,
};
