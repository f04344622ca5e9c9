use thiserror::Error;

/// Errors surfaced by the transfer pipeline and the balance reader.
///
/// Every stage fails fast with one of these; nothing is retried internally.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("ledger unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("invalid account data: {0}")]
    InvalidAccountData(String),

    #[error("signing failed: {0}")]
    SigningFailure(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("relay rejected submission (status {status}): {reason}")]
    RelayRejected { status: u16, reason: String },

    #[error("relay unreachable: {0}")]
    RelayUnreachable(String),

    #[error("envelope verification failed: {0}")]
    Verification(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Whether rebuilding the transfer from scratch may succeed.
    ///
    /// Only transient network conditions qualify. A retry must start from a
    /// fresh checkpoint, never from a previously built transaction.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RelayError::UpstreamUnavailable(_) | RelayError::RelayUnreachable(_)
        )
    }
}

pub type RelayResult<T> = Result<T, RelayError>;

impl From<chain_sol::SolError> for RelayError {
    fn from(e: chain_sol::SolError) -> Self {
        use chain_sol::SolError;
        match e {
            SolError::InvalidAddress(msg) => RelayError::InvalidAddress(msg),
            SolError::InvalidPrivateKey(msg) | SolError::SigningError(msg) => {
                RelayError::SigningFailure(msg)
            }
            SolError::InvalidAccountData(msg) => RelayError::InvalidAccountData(msg),
            SolError::InvalidBlockhash(msg)
            | SolError::TransactionBuildError(msg)
            | SolError::SerializationError(msg) => RelayError::Serialization(msg),
        }
    }
}

impl From<crypto_utils::CryptoError> for RelayError {
    fn from(e: crypto_utils::CryptoError) -> Self {
        RelayError::Verification(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_relay_rejected_carries_status_and_reason() {
        let err = RelayError::RelayRejected {
            status: 403,
            reason: "Duplicate request".into(),
        };
        assert_eq!(
            err.to_string(),
            "relay rejected submission (status 403): Duplicate request"
        );
    }

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(RelayError::UpstreamUnavailable("timeout".into()).is_retryable());
        assert!(RelayError::RelayUnreachable("refused".into()).is_retryable());

        assert!(!RelayError::InvalidAmount("-5".into()).is_retryable());
        assert!(!RelayError::SigningFailure("bad key".into()).is_retryable());
        assert!(!RelayError::RelayRejected {
            status: 500,
            reason: "Internal Server Error".into()
        }
        .is_retryable());
    }

    #[test]
    fn sol_errors_map_to_taxonomy() {
        use chain_sol::SolError;

        assert!(matches!(
            RelayError::from(SolError::InvalidAddress("x".into())),
            RelayError::InvalidAddress(_)
        ));
        assert!(matches!(
            RelayError::from(SolError::InvalidPrivateKey("x".into())),
            RelayError::SigningFailure(_)
        ));
        assert!(matches!(
            RelayError::from(SolError::SerializationError("x".into())),
            RelayError::Serialization(_)
        ));
    }

    #[test]
    fn crypto_errors_become_verification_failures() {
        let err = RelayError::from(crypto_utils::CryptoError::DigestMismatch);
        assert_eq!(
            err.to_string(),
            "envelope verification failed: digest mismatch"
        );
    }
}
