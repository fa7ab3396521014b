//! tokensuite-deploy - Deployment library for compliant tokenized asset suites.
//!
//! This crate turns a single issuance request into a coordinated deployment of the
//! contract suite behind a permissioned security token (token, identity registry,
//! compliance, claim-topics registry, trusted-issuers registry and identity storage),
//! verifies it on-chain and durably records the outcome.
//!
//! The entry point is [`SuiteOrchestrator`], built from a [`ChainClient`] and a
//! [`DeploymentStore`] owned by the caller.

pub mod abi;
pub mod api;
pub mod chain;
pub mod config;
pub mod cost;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod resolver;
pub mod store;
pub mod types;
pub mod validation;

pub use api::ApiResponse;
pub use chain::{
    ChainClient, ChainError, ContractCall, SimulationOutcome, TxConfirmation, TxRequest,
    rpc::JsonRpcChainClient,
};
pub use config::SuiteConfig;
pub use cost::{CostBreakdown, CostEstimate};
pub use error::{DeployError, ErrorStage, ReconcileError};
pub use executor::{DeploymentExecutor, DeploymentStage};
pub use orchestrator::{ReconcileFailure, ReconcileReport, SuiteOrchestrator};
pub use resolver::{AddressResolver, ResolveError, SuiteContract};
pub use store::{DeploymentStore, FileDeploymentStore, MemoryDeploymentStore, StoreError};
pub use types::{
    DeployedSuite, DeploymentRecord, DeploymentRequest, DeploymentStatus, Network, OnChainSalt,
    SuiteAddresses, ValidatedRequest,
};
pub use validation::{ValidationError, validate, validate_deployer};
