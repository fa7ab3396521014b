//! Ethereum JSON-RPC implementation of [`ChainClient`].

use std::time::Duration;

use alloy_core::primitives::{B256, Bytes};
use backon::{ConstantBuilder, Retryable};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use super::{ChainClient, ChainError, ContractCall, SimulationOutcome, TxConfirmation, TxRequest};
use crate::{config::SuiteConfig, types::Network};

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client(timeout: Duration) -> Result<reqwest::Client, ChainError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ChainError::Transport(format!("failed to create HTTP client: {e}")))
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result. A JSON-RPC error object is returned as [`ChainError::Rpc`]
/// with the node's message untouched.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &Url,
    method: &str,
    params: Vec<Value>,
) -> Result<T, ChainError> {
    let malformed = |reason: String| ChainError::MalformedResponse {
        method: method.to_string(),
        reason,
    };

    let response = client
        .post(url.clone())
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .map_err(|e| ChainError::Transport(format!("failed to send {method} request: {e}")))?;

    let result: Value = response
        .json()
        .await
        .map_err(|e| malformed(format!("response is not JSON: {e}")))?;

    if let Some(error) = result.get("error") {
        return Err(ChainError::Rpc {
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            data: error.get("data").map(|data| match data {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        });
    }

    let result_value = result
        .get("result")
        .ok_or_else(|| malformed("no result in response".to_string()))?
        .clone();

    serde_json::from_value(result_value).map_err(|e| malformed(e.to_string()))
}

/// Parse a `0x`-prefixed hex quantity.
fn parse_quantity(method: &str, value: &str) -> Result<u128, ChainError> {
    u128::from_str_radix(value.trim_start_matches("0x"), 16).map_err(|e| {
        ChainError::MalformedResponse {
            method: method.to_string(),
            reason: format!("invalid quantity '{value}': {e}"),
        }
    })
}

/// Deserialize a u64 from a hex string (with 0x prefix).
///
/// Owned, since RPC results are decoded from a [`Value`] that cannot lend its strings.
fn deserialize_u64_from_hex<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    u64::from_str_radix(s.trim_start_matches("0x"), 16).map_err(serde::de::Error::custom)
}

/// The subset of a transaction receipt the executor needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipt {
    transaction_hash: B256,
    /// `0x1` on success, `0x0` on revert. Absent on pre-byzantium chains.
    status: Option<String>,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    gas_used: u64,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    block_number: u64,
}

/// Outcome of a single receipt poll.
#[derive(Debug)]
enum ReceiptPoll {
    Pending,
    Failed(ChainError),
}

/// [`ChainClient`] talking to a node over HTTP JSON-RPC.
///
/// Transactions are sent with `eth_sendTransaction`, so the deployer must be an account
/// the node can sign for.
#[derive(Debug, Clone)]
pub struct JsonRpcChainClient {
    client: reqwest::Client,
    url: Url,
    network: Network,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl JsonRpcChainClient {
    pub fn from_config(config: &SuiteConfig) -> Result<Self, ChainError> {
        Ok(Self {
            client: create_client(config.request_timeout())?,
            url: config.rpc_url.clone(),
            network: config.network,
            confirmation_timeout: config.confirmation_timeout(),
            poll_interval: config.poll_interval(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, ChainError> {
        json_rpc_call(&self.client, &self.url, method, params).await
    }

    fn tx_object(tx: &TxRequest) -> Value {
        let mut object = serde_json::json!({
            "to": tx.call.to.to_string(),
            "data": format!("0x{}", hex::encode(&tx.call.calldata)),
        });
        if let Some(from) = tx.from {
            object["from"] = Value::String(from.to_string());
        }
        if let Some(gas) = tx.gas_limit {
            object["gas"] = Value::String(format!("0x{gas:x}"));
        }
        object
    }

    async fn poll_receipt(&self, tx_hash: B256) -> Result<TxConfirmation, ReceiptPoll> {
        let receipt: Option<Receipt> = self
            .call(
                "eth_getTransactionReceipt",
                vec![Value::String(tx_hash.to_string())],
            )
            .await
            .map_err(ReceiptPoll::Failed)?;

        let receipt = receipt.ok_or(ReceiptPoll::Pending)?;
        if receipt.status.as_deref() == Some("0x0") {
            return Err(ReceiptPoll::Failed(ChainError::Reverted(
                receipt.transaction_hash,
            )));
        }

        Ok(TxConfirmation {
            tx_hash: receipt.transaction_hash,
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
        })
    }
}

impl ChainClient for JsonRpcChainClient {
    fn network(&self) -> Network {
        self.network
    }

    async fn simulate(&self, tx: &TxRequest) -> Result<SimulationOutcome, ChainError> {
        let return_data: Bytes = self
            .call("eth_call", vec![Self::tx_object(tx), Value::from("latest")])
            .await?;

        // eth_call does not report gas; ask for an estimate of the same call instead.
        let gas_used = match self.estimate_gas(tx).await {
            Ok(gas) => Some(gas),
            Err(e) => {
                tracing::debug!(error = %e, function = tx.call.function, "Simulation gas usage unavailable");
                None
            }
        };

        Ok(SimulationOutcome {
            return_data,
            gas_used,
        })
    }

    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64, ChainError> {
        let gas: String = self
            .call("eth_estimateGas", vec![Self::tx_object(tx)])
            .await?;
        let gas = parse_quantity("eth_estimateGas", &gas)?;
        u64::try_from(gas).map_err(|_| ChainError::MalformedResponse {
            method: "eth_estimateGas".to_string(),
            reason: format!("gas estimate {gas} exceeds u64"),
        })
    }

    async fn write(&self, tx: &TxRequest) -> Result<B256, ChainError> {
        self.call("eth_sendTransaction", vec![Self::tx_object(tx)])
            .await
    }

    async fn wait_for_confirmation(&self, tx_hash: B256) -> Result<TxConfirmation, ChainError> {
        let max_polls = (self.confirmation_timeout.as_millis()
            / self.poll_interval.as_millis().max(1))
        .max(1) as usize;

        let result = (|| self.poll_receipt(tx_hash))
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.poll_interval)
                    .with_max_times(max_polls),
            )
            .when(|poll| {
                matches!(
                    poll,
                    ReceiptPoll::Pending | ReceiptPoll::Failed(ChainError::Transport(_))
                )
            })
            .notify(|poll, delay| {
                tracing::trace!(tx_hash = %tx_hash, ?poll, ?delay, "Transaction not confirmed yet, retrying...");
            })
            .await;

        match result {
            Ok(confirmation) => Ok(confirmation),
            Err(ReceiptPoll::Pending) => Err(ChainError::ConfirmationTimeout {
                tx_hash,
                waited_secs: self.confirmation_timeout.as_secs(),
            }),
            Err(ReceiptPoll::Failed(e)) => Err(e),
        }
    }

    async fn read(&self, call: &ContractCall) -> Result<Bytes, ChainError> {
        let tx = TxRequest::new(call.clone());
        self.call("eth_call", vec![Self::tx_object(&tx), Value::from("latest")])
            .await
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        let price: String = self.call("eth_gasPrice", vec![]).await?;
        parse_quantity("eth_gasPrice", &price)
    }
}
