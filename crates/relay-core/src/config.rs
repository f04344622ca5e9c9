//! Client configuration.
//!
//! Loaded from a TOML file; every field has a default so an empty file is
//! valid. Command-line flags override individual values after loading.
//!
//! ```toml
//! rpc_url = "https://api.devnet.solana.com"
//! relay_url = "https://relay.example.com"
//! token_decimals = 9
//! digest_commitment = "raw-bytes"
//! ```

use std::path::Path;
use std::time::Duration;

use chain_sol::Address;
use serde::{Deserialize, Serialize};

use crate::balance::DEFAULT_TOKEN_DECIMALS;
use crate::envelope::DigestCommitment;
use crate::error::{RelayError, RelayResult};
use crate::relay::DEFAULT_RELAY_PATH;

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

const COMMITMENT_LEVELS: [&str; 3] = ["processed", "confirmed", "finalized"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Solana JSON-RPC endpoint.
    pub rpc_url: String,
    /// Commitment level for ledger reads.
    pub commitment: String,
    /// Base URL of the relay backend. Required for transfers only.
    pub relay_url: Option<String>,
    pub relay_path: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub token_decimals: u8,
    pub digest_commitment: DigestCommitment,
    /// Relay's fee-paying key. When set, the relay co-signs as fee payer.
    pub fee_payer: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: "confirmed".to_string(),
            relay_url: None,
            relay_path: DEFAULT_RELAY_PATH.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            digest_commitment: DigestCommitment::default(),
            fee_payer: None,
        }
    }
}

impl RelayConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> RelayResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> RelayResult<Self> {
        let config: RelayConfig =
            toml::from_str(text).map_err(|e| RelayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RelayResult<()> {
        check_http_url("rpc_url", &self.rpc_url)?;
        if let Some(url) = &self.relay_url {
            check_http_url("relay_url", url)?;
        }
        if !self.relay_path.starts_with('/') {
            return Err(RelayError::Config(format!(
                "relay_path must start with '/', got {:?}",
                self.relay_path
            )));
        }
        if !COMMITMENT_LEVELS.contains(&self.commitment.as_str()) {
            return Err(RelayError::Config(format!(
                "commitment must be one of {COMMITMENT_LEVELS:?}, got {:?}",
                self.commitment
            )));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(RelayError::Config("timeouts must be positive".into()));
        }
        self.fee_payer_address()?;
        Ok(())
    }

    /// The relay endpoint, or a config error when none is set.
    pub fn relay_url(&self) -> RelayResult<&str> {
        self.relay_url
            .as_deref()
            .ok_or_else(|| RelayError::Config("relay_url is not set".into()))
    }

    pub fn fee_payer_address(&self) -> RelayResult<Option<Address>> {
        self.fee_payer
            .as_deref()
            .map(|s| {
                s.parse::<Address>()
                    .map_err(|e| RelayError::Config(format!("fee_payer: {e}")))
            })
            .transpose()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn check_http_url(field: &str, url: &str) -> RelayResult<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(RelayError::Config(format!(
            "{field} must be an http(s) URL, got {url:?}"
        )))
    }
}
