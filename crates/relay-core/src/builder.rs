//! Unsigned transfer construction.

use chain_sol::{build_sol_transfer, serialize_message, Address, SolMessage, SystemTransfer};

use crate::error::RelayResult;
use crate::ledger::LedgerClient;
use crate::types::{Amount, CheckpointReference};

/// A native transfer bound to a checkpoint, not yet signed.
///
/// Holds the compiled message and its exact bytes; nothing can be changed
/// after construction, so signatures made over `message_bytes` stay valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    transfer: SystemTransfer,
    checkpoint: CheckpointReference,
    fee_payer: Address,
    message: SolMessage,
    message_bytes: Vec<u8>,
}

impl UnsignedTransaction {
    /// Compile a transfer against an already fetched checkpoint.
    ///
    /// `fee_payer` defaults to the sender.
    pub fn from_parts(
        transfer: SystemTransfer,
        checkpoint: CheckpointReference,
        fee_payer: Option<Address>,
    ) -> RelayResult<Self> {
        let fee_payer = fee_payer.unwrap_or(transfer.from);
        let message = build_sol_transfer(&transfer, &fee_payer, checkpoint.blockhash())?;
        let message_bytes = serialize_message(&message)?;
        Ok(Self {
            transfer,
            checkpoint,
            fee_payer,
            message,
            message_bytes,
        })
    }

    pub fn sender(&self) -> &Address {
        &self.transfer.from
    }

    pub fn recipient(&self) -> &Address {
        &self.transfer.to
    }

    pub fn amount(&self) -> Amount {
        Amount::from_lamports(self.transfer.lamports)
    }

    pub fn transfer(&self) -> &SystemTransfer {
        &self.transfer
    }

    pub fn checkpoint(&self) -> &CheckpointReference {
        &self.checkpoint
    }

    pub fn fee_payer(&self) -> &Address {
        &self.fee_payer
    }

    pub fn message(&self) -> &SolMessage {
        &self.message
    }

    /// The bytes every signer signs.
    pub fn message_bytes(&self) -> &[u8] {
        &self.message_bytes
    }

    /// Required signers in slot order.
    pub fn signers(&self) -> &[Address] {
        self.message.signer_keys()
    }
}

/// Builds [`UnsignedTransaction`]s using a fresh checkpoint for each one.
#[derive(Debug)]
pub struct TransactionBuilder<'a, L: LedgerClient + ?Sized> {
    ledger: &'a L,
    fee_payer: Option<Address>,
}

impl<'a, L: LedgerClient + ?Sized> TransactionBuilder<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self {
            ledger,
            fee_payer: None,
        }
    }

    /// Let another key pay fees. It takes the first signer slot.
    pub fn with_fee_payer(mut self, fee_payer: Option<Address>) -> Self {
        self.fee_payer = fee_payer;
        self
    }

    /// Validate the amount, fetch one checkpoint and compile the transfer.
    ///
    /// An invalid amount fails before the ledger is contacted.
    pub async fn build(
        &self,
        sender: &Address,
        recipient: &Address,
        amount: impl Into<i128>,
    ) -> RelayResult<UnsignedTransaction> {
        let amount = Amount::parse(amount.into())?;

        let checkpoint = self.ledger.latest_checkpoint().await?;
        tracing::debug!(
            %sender,
            %recipient,
            %amount,
            blockhash = %checkpoint.blockhash(),
            "building transfer"
        );

        UnsignedTransaction::from_parts(
            SystemTransfer {
                from: *sender,
                to: *recipient,
                lamports: amount.lamports(),
            },
            checkpoint,
            self.fee_payer,
        )
    }
}
