//! HTTP client for the relay backend.

use std::time::Duration;

use serde_json::Value;

use crate::config::RelayConfig;
use crate::envelope::SerializedEnvelope;
use crate::error::{RelayError, RelayResult};

/// Path appended to the relay base URL.
pub const DEFAULT_RELAY_PATH: &str = "/process-transaction";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Submits envelopes to one relay endpoint.
///
/// `POST {base}{path}` with the envelope's JSON payload. One request per
/// call; nothing is retried.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    url: String,
}

/// The relay's reply to an accepted submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayAck {
    pub status: u16,
    /// Backend-defined JSON body. `Null` when the body was empty or not JSON.
    pub body: Value,
}

impl RelayAck {
    /// The ledger transaction id, when the backend reports one.
    pub fn transaction_id(&self) -> Option<&str> {
        self.body.get("transactionId").and_then(Value::as_str)
    }
}

impl RelayClient {
    pub fn new(base_url: &str) -> RelayResult<Self> {
        Self::with_options(
            base_url,
            DEFAULT_RELAY_PATH,
            DEFAULT_TIMEOUT,
            DEFAULT_CONNECT_TIMEOUT,
        )
    }

    pub fn with_options(
        base_url: &str,
        path: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> RelayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| RelayError::Config(format!("cannot build relay client: {e}")))?;
        Ok(Self {
            http,
            url: format!("{}{}", base_url.trim_end_matches('/'), path),
        })
    }

    pub fn from_config(config: &RelayConfig) -> RelayResult<Self> {
        Self::with_options(
            config.relay_url()?,
            &config.relay_path,
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    /// Full submission URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn submit(&self, envelope: &SerializedEnvelope) -> RelayResult<RelayAck> {
        let payload = envelope.to_payload();
        tracing::info!(
            url = %self.url,
            request_id = %payload.request_id,
            digest = %payload.transaction_hash,
            "submitting to relay"
        );

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::RelayUnreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    RelayError::RelayUnreachable(format!("connection failed: {e}"))
                } else {
                    RelayError::RelayUnreachable(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RelayError::RelayUnreachable(format!("failed to read response: {e}")))?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            let reason = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty()))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
            tracing::warn!(status = status.as_u16(), %reason, "relay rejected submission");
            return Err(RelayError::RelayRejected {
                status: status.as_u16(),
                reason,
            });
        }

        tracing::info!(status = status.as_u16(), "relay accepted submission");
        Ok(RelayAck {
            status: status.as_u16(),
            body,
        })
    }
}
