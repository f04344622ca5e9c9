use std::fmt;
use std::str::FromStr;

use chain_sol::Blockhash;

use crate::error::{RelayError, RelayResult};

/// A transfer amount in lamports, the ledger's smallest native unit.
///
/// Always a non-negative integer that fits the on-chain `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_lamports(lamports: u64) -> Self {
        Self(lamports)
    }

    pub const fn lamports(self) -> u64 {
        self.0
    }

    /// Validate a caller-supplied integer.
    pub fn parse(raw: i128) -> RelayResult<Self> {
        if raw < 0 {
            return Err(RelayError::InvalidAmount(format!(
                "amount must be non-negative, got {raw}"
            )));
        }
        u64::try_from(raw)
            .map(Self)
            .map_err(|_| RelayError::InvalidAmount(format!("amount {raw} exceeds u64::MAX")))
    }
}

impl From<u64> for Amount {
    fn from(lamports: u64) -> Self {
        Self(lamports)
    }
}

impl TryFrom<i128> for Amount {
    type Error = RelayError;

    fn try_from(raw: i128) -> RelayResult<Self> {
        Self::parse(raw)
    }
}

impl FromStr for Amount {
    type Err = RelayError;

    fn from_str(s: &str) -> RelayResult<Self> {
        let raw: i128 = s
            .trim()
            .parse()
            .map_err(|_| RelayError::InvalidAmount(format!("{s:?} is not an integer")))?;
        Self::parse(raw)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recent ledger checkpoint a transaction is bound to.
///
/// Short-lived: the ledger rejects transactions whose blockhash is older
/// than `last_valid_block_height`. Never cached across builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointReference {
    blockhash: Blockhash,
    last_valid_block_height: u64,
}

impl CheckpointReference {
    pub fn new(blockhash: Blockhash, last_valid_block_height: u64) -> Self {
        Self {
            blockhash,
            last_valid_block_height,
        }
    }

    pub fn blockhash(&self) -> &Blockhash {
        &self.blockhash
    }

    pub fn last_valid_block_height(&self) -> u64 {
        self.last_valid_block_height
    }
}
