//! Chain client capability consumed by the deployment executor.
//!
//! The executor never talks to a node directly: every simulation, broadcast,
//! confirmation wait and read goes through a [`ChainClient`], which reports failures as
//! a typed [`ChainError`].

use std::future::Future;

use alloy_core::primitives::{Address, B256, Bytes};

use crate::types::Network;

pub mod factory;
pub mod rpc;

/// Failure reported by a chain client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The node answered with a JSON-RPC error, e.g. an execution revert.
    #[error("{message} (rpc code {code})")]
    Rpc {
        code: i64,
        message: String,
        /// Raw revert data, when the node provides it.
        data: Option<String>,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transaction {0} reverted on-chain")]
    Reverted(B256),

    #[error("transaction {tx_hash} not confirmed within {waited_secs}s")]
    ConfirmationTimeout { tx_hash: B256, waited_secs: u64 },

    #[error("malformed response to {method}: {reason}")]
    MalformedResponse { method: String, reason: String },
}

/// A contract function invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    /// Function name, used for logging and dispatch.
    pub function: &'static str,
    pub calldata: Bytes,
}

/// A state-changing call, simulated, estimated or broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub from: Option<Address>,
    pub call: ContractCall,
    pub gas_limit: Option<u64>,
}

impl TxRequest {
    pub fn new(call: ContractCall) -> Self {
        Self {
            from: None,
            call,
            gas_limit: None,
        }
    }

    pub fn sender(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// Result of a successful simulation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimulationOutcome {
    pub return_data: Bytes,
    /// Gas the simulated execution used, if the client reports it.
    pub gas_used: Option<u64>,
}

/// A mined, successful transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxConfirmation {
    pub tx_hash: B256,
    pub gas_used: u64,
    pub block_number: u64,
}

/// Network-specific access to a chain.
pub trait ChainClient: Send + Sync {
    /// The network this client is connected to.
    fn network(&self) -> Network;

    /// Execute the call without changing state.
    fn simulate(
        &self,
        tx: &TxRequest,
    ) -> impl Future<Output = Result<SimulationOutcome, ChainError>> + Send;

    fn estimate_gas(&self, tx: &TxRequest) -> impl Future<Output = Result<u64, ChainError>> + Send;

    /// Sign and broadcast, returning the transaction hash.
    fn write(&self, tx: &TxRequest) -> impl Future<Output = Result<B256, ChainError>> + Send;

    /// Wait until the transaction is mined. A reverted transaction is an error.
    fn wait_for_confirmation(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<TxConfirmation, ChainError>> + Send;

    /// Read-only call returning the raw return data.
    fn read(&self, call: &ContractCall) -> impl Future<Output = Result<Bytes, ChainError>> + Send;

    /// Current gas price in wei.
    fn gas_price(&self) -> impl Future<Output = Result<u128, ChainError>> + Send;
}
