//! The transfer pipeline: build, sign, serialize, seal, submit.
//!
//! Strictly sequential. Each stage consumes the previous stage's value, and
//! the first error aborts the whole transfer. A retry starts over from a
//! fresh checkpoint.

use chain_sol::Address;
use uuid::Uuid;

use crate::builder::TransactionBuilder;
use crate::envelope::{DigestCommitment, SerializedEnvelope};
use crate::error::RelayResult;
use crate::keypair::TransferSigner;
use crate::ledger::LedgerClient;
use crate::relay::{RelayAck, RelayClient};
use crate::serializer::serialize;
use crate::signer::partial_sign;

/// Outcome of one accepted transfer submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub request_id: Uuid,
    /// Hex digest sent with the submission.
    pub digest: String,
    /// Base64 transaction as submitted.
    pub transaction: String,
    pub ack: RelayAck,
}

/// Wires one ledger client, one signer and one relay together.
pub struct TransferPipeline<'a, L: LedgerClient + ?Sized, S: TransferSigner + ?Sized> {
    ledger: &'a L,
    signer: &'a S,
    relay: &'a RelayClient,
    fee_payer: Option<Address>,
    commitment: DigestCommitment,
}

impl<'a, L: LedgerClient + ?Sized, S: TransferSigner + ?Sized> TransferPipeline<'a, L, S> {
    pub fn new(ledger: &'a L, signer: &'a S, relay: &'a RelayClient) -> Self {
        Self {
            ledger,
            signer,
            relay,
            fee_payer: None,
            commitment: DigestCommitment::default(),
        }
    }

    pub fn with_fee_payer(mut self, fee_payer: Option<Address>) -> Self {
        self.fee_payer = fee_payer;
        self
    }

    pub fn with_commitment(mut self, commitment: DigestCommitment) -> Self {
        self.commitment = commitment;
        self
    }

    /// Send `amount` lamports from the signer's address to `recipient`.
    #[tracing::instrument(skip_all, fields(sender = %self.signer.address(), %recipient))]
    pub async fn submit_transfer(
        &self,
        recipient: &Address,
        amount: impl Into<i128>,
    ) -> RelayResult<TransferReceipt> {
        let sender = self.signer.address();

        let unsigned = TransactionBuilder::new(self.ledger)
            .with_fee_payer(self.fee_payer)
            .build(&sender, recipient, amount)
            .await?;
        let signed = partial_sign(unsigned, self.signer)?;
        let encoded = serialize(&signed, false)?;
        let envelope = SerializedEnvelope::seal(encoded, self.commitment);
        tracing::info!(
            request_id = %envelope.request_id(),
            digest = envelope.digest(),
            commitment = %self.commitment,
            "sealed envelope"
        );

        let ack = self.relay.submit(&envelope).await?;
        Ok(TransferReceipt {
            request_id: envelope.request_id(),
            digest: envelope.digest().to_string(),
            transaction: envelope.transaction().base64().to_string(),
            ack,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use crate::ledger::RawAccount;
    use crate::test_support::{keypair, RECIPIENT};
    use crate::types::CheckpointReference;
    use async_trait::async_trait;
    use chain_sol::Blockhash;

    struct FixedLedger;

    #[async_trait]
    impl LedgerClient for FixedLedger {
        async fn latest_checkpoint(&self) -> RelayResult<CheckpointReference> {
            Ok(CheckpointReference::new(Blockhash::new([7u8; 32]), 10))
        }

        async fn get_account(&self, address: &Address) -> RelayResult<RawAccount> {
            Err(RelayError::AccountNotFound(address.to_string()))
        }
    }

    #[tokio::test]
    async fn receipt_carries_submitted_envelope() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/process-transaction")
            .with_body(r#"{"transactionId":"sig"}"#)
            .create_async()
            .await;

        let signer = keypair(1);
        let relay = RelayClient::new(&server.url()).unwrap();
        let receipt = TransferPipeline::new(&FixedLedger, &signer, &relay)
            .submit_transfer(&RECIPIENT, 10u64)
            .await
            .unwrap();

        let transfer = crate::serializer::decode_transfer(&receipt.transaction).unwrap();
        assert_eq!(transfer.lamports, 10);
        assert_eq!(receipt.ack.transaction_id(), Some("sig"));
        assert_eq!(receipt.request_id.get_version_num(), 4);
    }

    #[tokio::test]
    async fn encoded_text_commitment_is_applied() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/process-transaction")
            .with_body("{}")
            .create_async()
            .await;

        let signer = keypair(1);
        let relay = RelayClient::new(&server.url()).unwrap();
        let receipt = TransferPipeline::new(&FixedLedger, &signer, &relay)
            .with_commitment(DigestCommitment::EncodedText)
            .submit_transfer(&RECIPIENT, 10u64)
            .await
            .unwrap();

        assert_eq!(
            receipt.digest,
            crypto_utils::digest::sha256_hex(receipt.transaction.as_bytes())
        );
        assert_eq!(receipt.ack.transaction_id(), None);
    }
}
