//! Partial signing.
//!
//! The sender signs first; every other required slot stays empty until a
//! co-signer (normally the relay's fee payer) fills it. Each step consumes
//! the previous value and returns a new one, so existing signatures are
//! never recomputed or altered.

use chain_sol::{verify_signature, Address, SIGNATURE_LEN};

use crate::builder::UnsignedTransaction;
use crate::error::{RelayError, RelayResult};
use crate::keypair::TransferSigner;

/// An [`UnsignedTransaction`] with one signature slot per required signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartiallySignedTransaction {
    unsigned: UnsignedTransaction,
    signatures: Vec<Option<[u8; SIGNATURE_LEN]>>,
}

impl PartiallySignedTransaction {
    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    /// `(signer, signature)` pairs in slot order.
    pub fn signatures(&self) -> impl Iterator<Item = (&Address, Option<&[u8; SIGNATURE_LEN]>)> {
        self.unsigned
            .signers()
            .iter()
            .zip(self.signatures.iter().map(Option::as_ref))
    }

    pub fn signature_of(&self, signer: &Address) -> Option<&[u8; SIGNATURE_LEN]> {
        let index = self.unsigned.message().signer_index(signer)?;
        self.signatures.get(index)?.as_ref()
    }

    /// Number of filled slots.
    pub fn signature_count(&self) -> usize {
        self.signatures.iter().filter(|s| s.is_some()).count()
    }

    pub fn missing_signers(&self) -> Vec<Address> {
        self.signatures()
            .filter(|(_, sig)| sig.is_none())
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signatures.iter().all(Option::is_some)
    }

    pub(crate) fn slots(&self) -> &[Option<[u8; SIGNATURE_LEN]>] {
        &self.signatures
    }

    /// Fill the slot belonging to `signer`.
    ///
    /// Fails with `SigningFailure` when `signer` is not a required signer or
    /// its slot is already filled.
    pub fn co_sign<S: TransferSigner + ?Sized>(mut self, signer: &S) -> RelayResult<Self> {
        let address = signer.address();
        let index = self.unsigned.message().signer_index(&address).ok_or_else(|| {
            RelayError::SigningFailure(format!("{address} is not a required signer"))
        })?;
        if self.signatures[index].is_some() {
            return Err(RelayError::SigningFailure(format!(
                "{address} has already signed"
            )));
        }

        self.signatures[index] = Some(sign_verified(&self.unsigned, signer, &address)?);
        tracing::debug!(signer = %address, slot = index, "co-signed transaction");
        Ok(self)
    }
}

/// Apply the sender's signature.
///
/// `signer` must hold the sender's key. Other slots are left empty.
pub fn partial_sign<S: TransferSigner + ?Sized>(
    unsigned: UnsignedTransaction,
    signer: &S,
) -> RelayResult<PartiallySignedTransaction> {
    let address = signer.address();
    if &address != unsigned.sender() {
        return Err(RelayError::SigningFailure(format!(
            "keypair {address} does not match sender {}",
            unsigned.sender()
        )));
    }
    let index = unsigned
        .message()
        .signer_index(&address)
        .ok_or_else(|| RelayError::SigningFailure(format!("{address} is not a required signer")))?;

    let mut signatures = vec![None; unsigned.signers().len()];
    signatures[index] = Some(sign_verified(&unsigned, signer, &address)?);
    tracing::debug!(signer = %address, slot = index, "signed transaction");

    Ok(PartiallySignedTransaction {
        unsigned,
        signatures,
    })
}

fn sign_verified<S: TransferSigner + ?Sized>(
    unsigned: &UnsignedTransaction,
    signer: &S,
    address: &Address,
) -> RelayResult<[u8; SIGNATURE_LEN]> {
    let signature = signer.sign(unsigned.message_bytes())?;
    verify_signature(address, unsigned.message_bytes(), &signature)
        .map_err(|e| RelayError::SigningFailure(e.to_string()))?;
    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::LocalKeypair;
    use crate::types::CheckpointReference;
    use chain_sol::{Blockhash, SolKeypair, SystemTransfer};

    const RECIPIENT: Address = Address::new([2u8; 32]);

    fn unsigned(sender: Address, fee_payer: Option<Address>) -> UnsignedTransaction {
        UnsignedTransaction::from_parts(
            SystemTransfer {
                from: sender,
                to: RECIPIENT,
                lamports: 1_000_000,
            },
            CheckpointReference::new(Blockhash::new([7u8; 32]), 10),
            fee_payer,
        )
        .unwrap()
    }

    fn keypair(seed: u8) -> LocalKeypair {
        LocalKeypair::new(SolKeypair::from_secret(&[seed; 32]))
    }

    #[test]
    fn sender_signs_only_its_slot() {
        let sender = keypair(1);
        let relay = keypair(2);
        let tx = unsigned(sender.address(), Some(relay.address()));

        let signed = partial_sign(tx, &sender).unwrap();
        assert_eq!(signed.signature_count(), 1);
        assert!(!signed.is_fully_signed());
        assert_eq!(signed.missing_signers(), vec![relay.address()]);
        assert!(signed.signature_of(&sender.address()).is_some());
        assert!(signed.signature_of(&relay.address()).is_none());
    }

    #[test]
    fn sole_signer_is_fully_signed() {
        let sender = keypair(1);
        let signed = partial_sign(unsigned(sender.address(), None), &sender).unwrap();
        assert!(signed.is_fully_signed());
        assert_eq!(signed.signatures().count(), 1);
    }

    #[test]
    fn wrong_keypair_is_rejected() {
        let sender = keypair(1);
        let other = keypair(3);
        let err = partial_sign(unsigned(sender.address(), None), &other).unwrap_err();
        assert!(matches!(err, RelayError::SigningFailure(_)));
    }

    #[test]
    fn co_sign_keeps_sender_signature() {
        let sender = keypair(1);
        let relay = keypair(2);
        let signed = partial_sign(unsigned(sender.address(), Some(relay.address())), &sender)
            .unwrap();
        let sender_sig = *signed.signature_of(&sender.address()).unwrap();

        let complete = signed.co_sign(&relay).unwrap();
        assert!(complete.is_fully_signed());
        assert_eq!(complete.signature_of(&sender.address()), Some(&sender_sig));
    }

    #[test]
    fn co_sign_rejects_outsiders_and_double_signing() {
        let sender = keypair(1);
        let relay = keypair(2);
        let signed = partial_sign(unsigned(sender.address(), Some(relay.address())), &sender)
            .unwrap();

        assert!(signed.clone().co_sign(&keypair(5)).is_err());
        assert!(signed.co_sign(&sender).is_err());
    }

    #[test]
    fn bad_signature_is_not_attached() {
        struct BrokenSigner(Address);

        impl TransferSigner for BrokenSigner {
            fn address(&self) -> Address {
                self.0
            }

            fn sign(&self, _message: &[u8]) -> RelayResult<[u8; SIGNATURE_LEN]> {
                Ok([1u8; SIGNATURE_LEN])
            }
        }

        let sender = keypair(1).address();
        let err = partial_sign(unsigned(sender, None), &BrokenSigner(sender)).unwrap_err();
        assert!(matches!(err, RelayError::SigningFailure(_)));
    }
}
