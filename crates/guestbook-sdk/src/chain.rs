//! Target network description and a JSON-RPC block reader
//!
//! The chain description is static data. [`RpcClient`] is the only piece that
//! talks to the network directly; everything schema-related goes through the
//! streams adapter instead.

use crate::error::{CallError, CallResult};
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Native currency of a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// RPC endpoints, HTTP and websocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcUrls {
    pub http: Vec<String>,
    #[serde(default)]
    pub ws: Vec<String>,
}

/// Block explorer link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockExplorer {
    pub name: String,
    pub url: String,
}

/// Static description of the target network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// EIP-155 chain id
    pub id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: RpcUrls,
    pub block_explorer: Option<BlockExplorer>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::somnia_testnet()
    }
}

impl ChainConfig {
    /// Somnia testnet (Shannon)
    pub fn somnia_testnet() -> Self {
        Self {
            id: 50312,
            name: "Somnia Testnet".to_string(),
            native_currency: NativeCurrency {
                name: "STT".to_string(),
                symbol: "STT".to_string(),
                decimals: 18,
            },
            rpc_urls: RpcUrls {
                http: vec!["https://dream-rpc.somnia.network".to_string()],
                ws: vec!["wss://dream-rpc.somnia.network/ws".to_string()],
            },
            block_explorer: Some(BlockExplorer {
                name: "Shannon Explorer".to_string(),
                url: "https://shannon-explorer.somnia.network".to_string(),
            }),
        }
    }

    pub fn primary_http_rpc(&self) -> Option<&str> {
        self.rpc_urls.http.first().map(String::as_str)
    }

    pub fn primary_ws_rpc(&self) -> Option<&str> {
        self.rpc_urls.ws.first().map(String::as_str)
    }

    /// Explorer page for a transaction, when an explorer is configured
    pub fn explorer_tx_url(&self, hash: &B256) -> Option<String> {
        self.block_explorer
            .as_ref()
            .map(|explorer| format!("{}/tx/{}", explorer.url.trim_end_matches('/'), hash))
    }

    /// Explorer page for an address, when an explorer is configured
    pub fn explorer_address_url(&self, address: &Address) -> Option<String> {
        self.block_explorer
            .as_ref()
            .map(|explorer| format!("{}/address/{}", explorer.url.trim_end_matches('/'), address))
    }
}

#[cfg(feature = "rpc")]
pub use rpc::RpcClient;

#[cfg(feature = "rpc")]
mod rpc {
    use super::*;
    use crate::error::{GuestbookError, Result};
    use crate::traits::ChainReader;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    #[derive(Debug, Deserialize)]
    struct RpcErrorObject {
        code: i64,
        message: String,
    }

    #[derive(Debug, Deserialize)]
    struct RpcResponse {
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<RpcErrorObject>,
    }

    /// Minimal HTTP JSON-RPC client for liveness reads
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use guestbook_sdk::{ChainConfig, ChainReader, RpcClient};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = RpcClient::for_chain(&ChainConfig::somnia_testnet(), 30)?;
    /// let block = client.block_number().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub struct RpcClient {
        url: String,
        client: reqwest::Client,
        next_id: AtomicU64,
    }

    impl RpcClient {
        /// Create a client for an explicit endpoint
        pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()?;

            Ok(Self {
                url: url.into(),
                client,
                next_id: AtomicU64::new(1),
            })
        }

        /// Create a client bound to the chain's first HTTP endpoint
        pub fn for_chain(chain: &ChainConfig, timeout_secs: u64) -> Result<Self> {
            let url = chain.primary_http_rpc().ok_or_else(|| {
                GuestbookError::Config(format!("chain {} has no HTTP RPC endpoint", chain.name))
            })?;
            Self::new(url, timeout_secs)
        }

        pub fn url(&self) -> &str {
            &self.url
        }

        /// Chain id reported by the endpoint
        pub async fn chain_id(&self) -> CallResult<u64> {
            let value = self.call("eth_chainId", json!([])).await?;
            parse_quantity(&value)
        }

        async fn call(&self, method: &str, params: Value) -> CallResult<Value> {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let body = json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            });

            let response = self
                .client
                .post(&self.url)
                .json(&body)
                .send()
                .await
                .map_err(|e| CallError::transport(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(CallError::transport(format!("HTTP {} - {}", status, body)));
            }

            let response: RpcResponse = response
                .json()
                .await
                .map_err(|e| CallError::transport(format!("invalid JSON-RPC response: {}", e)))?;

            if let Some(error) = response.error {
                return Err(CallError::classify(Some(error.code), error.message));
            }

            response
                .result
                .ok_or_else(|| CallError::transport(format!("{} returned no result", method)))
        }
    }

    #[async_trait]
    impl ChainReader for RpcClient {
        async fn block_number(&self) -> CallResult<u64> {
            let value = self.call("eth_blockNumber", json!([])).await?;
            parse_quantity(&value)
        }
    }
}

/// Parse a JSON-RPC hex quantity such as `"0x1b4"`
pub fn parse_quantity(value: &serde_json::Value) -> CallResult<u64> {
    let text = value
        .as_str()
        .ok_or_else(|| CallError::transport(format!("expected hex quantity, got {}", value)))?;
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| CallError::transport(format!("quantity {} lacks 0x prefix", text)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| CallError::transport(format!("bad quantity {}: {}", text, e)))
}
