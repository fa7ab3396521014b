//! Configuration for the deployment orchestrator and its collaborators.

use std::{path::PathBuf, time::Duration};

use alloy_core::primitives::Address;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{cost::GasDefaults, types::Network};

/// The default name for the tokensuite configuration file.
pub const CONFIG_FILENAME: &str = "Tokensuite.toml";

/// Fallback gas estimate when a simulation does not report gas usage.
pub const DEFAULT_FALLBACK_GAS_ESTIMATE: u64 = 500_000;

/// Fallback gas price when the network gas price is unavailable (20 gwei).
pub const DEFAULT_GAS_PRICE_WEI: u64 = 20_000_000_000;

/// Top-level configuration.
///
/// Every field has a default so partial files and environment overrides compose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// The network deployments target.
    pub network: Network,
    /// JSON-RPC endpoint of the network.
    pub rpc_url: Url,
    /// Address of the suite factory contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory_address: Option<Address>,
    /// How long to wait for a transaction to be mined.
    pub confirmation_timeout_secs: u64,
    /// Interval between receipt polls.
    pub poll_interval_ms: u64,
    /// Timeout of a single JSON-RPC request.
    pub request_timeout_secs: u64,
    pub fallback_gas_estimate: u64,
    pub default_gas_price_wei: u64,
    /// Path of the JSON deployment store.
    pub store_path: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            rpc_url: Url::parse("http://localhost:8545").expect("static URL is valid"),
            factory_address: None,
            confirmation_timeout_secs: 120,
            poll_interval_ms: 2_000,
            request_timeout_secs: 30,
            fallback_gas_estimate: DEFAULT_FALLBACK_GAS_ESTIMATE,
            default_gas_price_wei: DEFAULT_GAS_PRICE_WEI,
            store_path: PathBuf::from("deployments.json"),
        }
    }
}

impl SuiteConfig {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn gas_defaults(&self) -> GasDefaults {
        GasDefaults {
            fallback_gas_estimate: self.fallback_gas_estimate,
            default_gas_price_wei: u128::from(self.default_gas_price_wei),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SuiteConfig::default();
        assert_eq!(config.network, Network::Anvil);
        assert_eq!(config.rpc_url.as_str(), "http://localhost:8545/");
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(120));
        assert_eq!(config.gas_defaults().fallback_gas_estimate, 500_000);
        assert_eq!(config.gas_defaults().default_gas_price_wei, 20_000_000_000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SuiteConfig = serde_json::from_value(serde_json::json!({
            "network": "sepolia",
            "factory_address": format!("0x{}", "ab".repeat(20)),
        }))
        .unwrap();

        assert_eq!(config.network, Network::Sepolia);
        assert_eq!(config.factory_address, Some(Address::repeat_byte(0xab)));
        assert_eq!(config.poll_interval(), Duration::from_millis(2_000));
        assert_eq!(config.store_path, PathBuf::from("deployments.json"));
    }
}
