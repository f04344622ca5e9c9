//! SPL token balance lookup.

use std::fmt;

use chain_sol::{derive_associated_token_address, Address, TokenAccount, TOKEN_PROGRAM_ID};

use crate::error::{RelayError, RelayResult};
use crate::ledger::LedgerClient;

/// Decimals assumed for the token when none are configured.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 9;

/// A raw token amount together with its decimal scale.
///
/// `raw` is authoritative; the scaled value is only ever produced with
/// integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalance {
    raw: u64,
    decimals: u8,
}

impl TokenBalance {
    pub fn new(raw: u64, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn raw(&self) -> u64 {
        self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// `raw / 10^decimals`, truncated.
    pub fn whole_units(&self) -> u64 {
        match self.scale() {
            Some(scale) => (self.raw as u128 / scale) as u64,
            None => 0,
        }
    }

    /// `raw % 10^decimals`.
    pub fn fractional_units(&self) -> u64 {
        match self.scale() {
            Some(scale) => (self.raw as u128 % scale) as u64,
            None => self.raw,
        }
    }

    fn scale(&self) -> Option<u128> {
        10u128.checked_pow(u32::from(self.decimals))
    }
}

/// Exact decimal form with trailing zeros trimmed: `1000000000` at 9
/// decimals is `1`, `1500000000` is `1.5`.
impl fmt::Display for TokenBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimals = self.decimals as usize;
        let digits = format!("{:0>width$}", self.raw, width = decimals + 1);
        let (whole, frac) = digits.split_at(digits.len() - decimals);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            f.write_str(whole)
        } else {
            write!(f, "{whole}.{frac}")
        }
    }
}

/// Reads a wallet's balance of one mint from its associated token account.
#[derive(Debug)]
pub struct BalanceReader<'a, L: LedgerClient + ?Sized> {
    ledger: &'a L,
    decimals: u8,
}

impl<'a, L: LedgerClient + ?Sized> BalanceReader<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self {
            ledger,
            decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    /// The associated token account for `wallet` and `mint`. No I/O.
    pub fn token_account_address(wallet: &Address, mint: &Address) -> RelayResult<Address> {
        Ok(derive_associated_token_address(wallet, mint)?)
    }

    pub async fn balance(&self, wallet: &Address, mint: &Address) -> RelayResult<TokenBalance> {
        let account_address = Self::token_account_address(wallet, mint)?;
        let account = self.ledger.get_account(&account_address).await?;
        if account.owner != TOKEN_PROGRAM_ID {
            return Err(RelayError::InvalidAccountData(format!(
                "account {account_address} is owned by {}, not the token program",
                account.owner
            )));
        }

        let token = TokenAccount::unpack(&account.data)?;
        if &token.mint != mint {
            return Err(RelayError::InvalidAccountData(format!(
                "account {account_address} holds mint {}, expected {mint}",
                token.mint
            )));
        }

        let balance = TokenBalance::new(token.amount, self.decimals);
        tracing::debug!(%wallet, %mint, %account_address, raw = balance.raw(), "read balance");
        Ok(balance)
    }
}
