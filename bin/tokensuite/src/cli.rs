use std::path::PathBuf;

use alloy_core::primitives::Address;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokensuite_deploy::Network;
use tracing::level_filters::LevelFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "tokensuite")]
#[command(
    author,
    version,
    about = "Deploy and track compliant security token suites"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(
        short,
        long,
        global = true,
        env = "TOKENSUITE_VERBOSITY",
        default_value_t = LevelFilter::INFO
    )]
    pub verbosity: LevelFilter,

    /// Path to a Tokensuite.toml configuration file.
    ///
    /// If not provided, ./Tokensuite.toml is used when it exists.
    #[arg(long, global = true, alias = "conf", env = "TOKENSUITE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print results as a JSON `{success, data | error}` envelope.
    #[arg(long, global = true)]
    pub json: bool,

    #[clap(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags taking precedence over the configuration file and the environment.
///
/// Field names match the configuration keys they override.
#[derive(Debug, Clone, Default, Args, Serialize)]
pub struct ConfigOverrides {
    /// The target network.
    #[arg(long, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,

    /// JSON-RPC endpoint of the target network.
    #[arg(long, global = true, alias = "rpc")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,

    /// Address of the suite factory contract.
    #[arg(long = "factory", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory_address: Option<Address>,

    /// Path of the JSON deployment store.
    #[arg(long = "store", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// How long to wait for the deployment transaction to be mined, in seconds.
    #[arg(long, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_timeout_secs: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a fresh salt for a new deployment.
    Salt,

    /// Validate a deployment request without touching the chain.
    Validate {
        /// Path to the JSON request.
        request: PathBuf,
    },

    /// Estimate the cost of a deployment by simulating it.
    Estimate {
        /// Path to the JSON request.
        request: PathBuf,

        /// Account to simulate the deployment from.
        #[arg(long)]
        sender: Option<Address>,
    },

    /// Deploy a token suite and record the outcome.
    Deploy {
        /// Path to the JSON request.
        request: PathBuf,

        /// Account sending the deployment transaction. It must be unlocked on the node.
        #[arg(long, env = "TOKENSUITE_DEPLOYER")]
        deployer: String,
    },

    /// Look up the token address of a deployed suite by salt.
    TokenAddress { salt: String },

    /// Show the deployment record of an asset.
    Deployment { property_id: String },

    /// List every recorded deployment.
    List,

    /// Retry address resolution for deployments confirmed on-chain but left unresolved.
    Reconcile {
        /// Only reconcile this asset. Defaults to every eligible record.
        #[arg(long)]
        property_id: Option<String>,

        /// Keep sweeping every SECS seconds until no record is left unresolved.
        #[arg(long, value_name = "SECS", conflicts_with = "property_id")]
        watch: Option<u64>,
    },

    /// Print the effective configuration.
    Config,
}
