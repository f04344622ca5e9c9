//! Ledger client capability and its Solana JSON-RPC implementation.
//!
//! The pipeline only needs two reads from the ledger: a fresh checkpoint
//! (recent blockhash) right before building, and raw account data for the
//! balance lookup. Both go through one explicitly passed client.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chain_sol::{Address, Blockhash};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::types::CheckpointReference;

/// Raw on-chain account as returned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    pub address: Address,
    /// Program that owns the account.
    pub owner: Address,
    pub lamports: u64,
    pub data: Vec<u8>,
}

/// Read access to the ledger.
///
/// Implementations must be safe to share between concurrent transfers.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch a fresh checkpoint. Fails with `UpstreamUnavailable`.
    async fn latest_checkpoint(&self) -> RelayResult<CheckpointReference>;

    /// Fetch an account. Fails with `AccountNotFound` when it does not exist.
    async fn get_account(&self, address: &Address) -> RelayResult<RawAccount>;
}

/// [`LedgerClient`] backed by a Solana JSON-RPC node.
#[derive(Debug, Clone)]
pub struct RpcLedgerClient {
    http: reqwest::Client,
    url: String,
    commitment: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashValue {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Debug, Deserialize)]
struct AccountValue {
    /// `[payload, encoding]`
    data: (String, String),
    lamports: u64,
    owner: String,
}

impl RpcLedgerClient {
    pub fn new(
        url: impl Into<String>,
        commitment: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> RelayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| RelayError::Config(format!("cannot build RPC client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            commitment: commitment.into(),
        })
    }

    pub fn from_config(config: &RelayConfig) -> RelayResult<Self> {
        Self::new(
            config.rpc_url.clone(),
            config.commitment.clone(),
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform one JSON-RPC call. Any failure to obtain a result is
    /// reported as `UpstreamUnavailable`.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> RelayResult<T> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::UpstreamUnavailable(format!("{method}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamUnavailable(format!(
                "{method}: HTTP status {status}"
            )));
        }

        let parsed: RpcResponse<T> = response.json().await.map_err(|e| {
            RelayError::UpstreamUnavailable(format!("{method}: malformed response: {e}"))
        })?;

        match (parsed.result, parsed.error) {
            (_, Some(err)) => Err(RelayError::UpstreamUnavailable(format!(
                "{method}: RPC error {}: {}",
                err.code, err.message
            ))),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RelayError::UpstreamUnavailable(format!(
                "{method}: response has neither result nor error"
            ))),
        }
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn latest_checkpoint(&self) -> RelayResult<CheckpointReference> {
        let response: WithContext<BlockhashValue> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment }]),
            )
            .await?;

        let blockhash: Blockhash = response.value.blockhash.parse().map_err(|e| {
            RelayError::UpstreamUnavailable(format!("node returned a bad blockhash: {e}"))
        })?;
        tracing::debug!(%blockhash, "fetched checkpoint");

        Ok(CheckpointReference::new(
            blockhash,
            response.value.last_valid_block_height,
        ))
    }

    async fn get_account(&self, address: &Address) -> RelayResult<RawAccount> {
        let response: WithContext<Option<AccountValue>> = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": self.commitment }
                ]),
            )
            .await?;

        let account = response
            .value
            .ok_or_else(|| RelayError::AccountNotFound(address.to_string()))?;

        let (payload, encoding) = account.data;
        if encoding != "base64" {
            return Err(RelayError::InvalidAccountData(format!(
                "unexpected account encoding {encoding:?}"
            )));
        }
        let data = STANDARD
            .decode(payload)
            .map_err(|e| RelayError::InvalidAccountData(format!("bad base64 data: {e}")))?;
        let owner = account
            .owner
            .parse()
            .map_err(|e| RelayError::InvalidAccountData(format!("bad owner: {e}")))?;

        Ok(RawAccount {
            address: *address,
            owner,
            lamports: account.lamports,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(url: &str) -> RpcLedgerClient {
        RpcLedgerClient::new(
            url,
            "confirmed",
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn latest_checkpoint_parses_blockhash() {
        let mut server = mockito::Server::new_async().await;
        let blockhash = bs58::encode([7u8; 32]).into_string();
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "getLatestBlockhash",
                "params": [{ "commitment": "confirmed" }],
            })))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": {
                        "context": { "slot": 1 },
                        "value": { "blockhash": blockhash, "lastValidBlockHeight": 321 }
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let checkpoint = client(&server.url()).latest_checkpoint().await.unwrap();
        assert_eq!(checkpoint.blockhash(), &Blockhash::new([7u8; 32]));
        assert_eq!(checkpoint.last_valid_block_height(), 321);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rpc_error_is_upstream_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": { "code": -32005, "message": "Node is behind" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = client(&server.url()).latest_checkpoint().await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamUnavailable(_)));
        assert!(err.to_string().contains("Node is behind"));
    }

    #[tokio::test]
    async fn http_failure_is_upstream_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(503)
            .create_async()
            .await;

        let err = client(&server.url()).latest_checkpoint().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn unreachable_node_is_upstream_unavailable() {
        let err = client("http://127.0.0.1:1").latest_checkpoint().await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn get_account_decodes_base64_data() {
        let mut server = mockito::Server::new_async().await;
        let address = Address::new([5u8; 32]);
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "getAccountInfo",
                "params": [address.to_string()],
            })))
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": {
                        "context": { "slot": 1 },
                        "value": {
                            "data": [STANDARD.encode([1u8, 2, 3]), "base64"],
                            "executable": false,
                            "lamports": 2039280,
                            "owner": chain_sol::TOKEN_PROGRAM_ID.to_string(),
                            "rentEpoch": 0,
                            "space": 3
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let account = client(&server.url()).get_account(&address).await.unwrap();
        assert_eq!(account.address, address);
        assert_eq!(account.owner, chain_sol::TOKEN_PROGRAM_ID);
        assert_eq!(account.lamports, 2_039_280);
        assert_eq!(account.data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": { "context": { "slot": 1 }, "value": null }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = client(&server.url())
            .get_account(&Address::new([5u8; 32]))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::AccountNotFound(_)));
    }
}
