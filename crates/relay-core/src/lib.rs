//! # relay-core
//!
//! Client side of the Lumos relayed-transfer flow on Solana: token balance
//! lookup, and a transfer pipeline that builds a native SOL transfer, signs
//! it with the sender's key only, encodes it, seals it with a digest and an
//! idempotency id, and hands it to a relay that pays the fees.
//!
//! ```text
//! TransactionBuilder -> partial_sign -> serialize -> SerializedEnvelope -> RelayClient
//! ```

pub mod balance;
pub mod builder;
pub mod config;
pub mod envelope;
pub mod error;
pub mod keypair;
pub mod ledger;
pub mod logging;
pub mod pipeline;
pub mod relay;
pub mod serializer;
pub mod signer;
pub mod types;
pub mod verify;

#[cfg(test)]
mod test_support;

pub use balance::{BalanceReader, TokenBalance, DEFAULT_TOKEN_DECIMALS};
pub use builder::{TransactionBuilder, UnsignedTransaction};
pub use config::RelayConfig;
pub use envelope::{new_request_id, DigestCommitment, RelayPayload, SerializedEnvelope};
pub use error::{RelayError, RelayResult};
pub use keypair::{LocalKeypair, TransferSigner};
pub use ledger::{LedgerClient, RawAccount, RpcLedgerClient};
pub use logging::{init_logging, LogFormat};
pub use pipeline::{TransferPipeline, TransferReceipt};
pub use relay::{RelayAck, RelayClient, DEFAULT_RELAY_PATH};
pub use serializer::{decode, decode_transfer, serialize, EncodedTransaction};
pub use signer::{partial_sign, PartiallySignedTransaction};
pub use types::{Amount, CheckpointReference};
pub use verify::{EnvelopeVerifier, DEFAULT_REQUEST_TTL_MILLIS};
