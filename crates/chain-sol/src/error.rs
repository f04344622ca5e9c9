use thiserror::Error;

/// Solana chain operation errors.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid blockhash: {0}")]
    InvalidBlockhash(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("invalid account data: {0}")]
    InvalidAccountData(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_private_key() {
        let err = SolError::InvalidPrivateKey("public half does not match".into());
        assert_eq!(
            err.to_string(),
            "invalid private key: public half does not match"
        );
    }

    #[test]
    fn display_invalid_address() {
        let err = SolError::InvalidAddress("bad decode".into());
        assert_eq!(err.to_string(), "invalid address: bad decode");
    }

    #[test]
    fn display_invalid_blockhash() {
        let err = SolError::InvalidBlockhash("expected 32 bytes, got 31".into());
        assert_eq!(
            err.to_string(),
            "invalid blockhash: expected 32 bytes, got 31"
        );
    }

    #[test]
    fn display_signing_error() {
        let err = SolError::SigningError("signer not in message".into());
        assert_eq!(err.to_string(), "signing error: signer not in message");
    }

    #[test]
    fn display_serialization_error() {
        let err = SolError::SerializationError("compact-u16 overflow".into());
        assert_eq!(
            err.to_string(),
            "serialization error: compact-u16 overflow"
        );
    }

    #[test]
    fn display_invalid_account_data() {
        let err = SolError::InvalidAccountData("account data too short".into());
        assert_eq!(
            err.to_string(),
            "invalid account data: account data too short"
        );
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(SolError::TransactionBuildError("test".into()));
        assert!(err.to_string().contains("test"));
    }
}
