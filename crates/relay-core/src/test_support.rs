//! Fixtures shared by unit tests.

use chain_sol::{Address, Blockhash, SolKeypair, SystemTransfer};

use crate::builder::UnsignedTransaction;
use crate::keypair::{LocalKeypair, TransferSigner};
use crate::serializer::{serialize, EncodedTransaction};
use crate::signer::{partial_sign, PartiallySignedTransaction};
use crate::types::CheckpointReference;

pub const RECIPIENT: Address = Address::new([2u8; 32]);

pub fn keypair(seed: u8) -> LocalKeypair {
    LocalKeypair::new(SolKeypair::from_secret(&[seed; 32]))
}

/// A transfer of `lamports` from `keypair(1)` to [`RECIPIENT`], signed by the sender.
pub fn signed_sample(lamports: u64, fee_payer: Option<Address>) -> PartiallySignedTransaction {
    let sender = keypair(1);
    let unsigned = UnsignedTransaction::from_parts(
        SystemTransfer {
            from: sender.address(),
            to: RECIPIENT,
            lamports,
        },
        CheckpointReference::new(Blockhash::new([7u8; 32]), 10),
        fee_payer,
    )
    .unwrap();
    partial_sign(unsigned, &sender).unwrap()
}

pub fn encoded_sample() -> EncodedTransaction {
    serialize(&signed_sample(42, None), false).unwrap()
}
