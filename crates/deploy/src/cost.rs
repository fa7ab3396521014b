//! Deployment cost estimation.
//!
//! The per-phase breakdown is a fixed proportional split of the total (token 40%,
//! identity 25%, compliance 20%, registries 15%). It is an attribution heuristic, not an
//! on-chain measurement: the suite is deployed in a single transaction and the chain
//! reports one gas figure for all of it.

use alloy_core::primitives::{Address, U256};
use serde::Serialize;

use crate::{
    chain::{ChainClient, TxRequest, factory},
    error::DeployError,
    types::DeploymentRequest,
    validation,
};

/// Shown to callers alongside every estimate.
pub const BREAKDOWN_NOTICE: &str = "per-phase costs are a fixed 40/25/20/15 proportional split \
     of the total estimate, not on-chain measurements";

/// Weights of the breakdown, in percent.
const TOKEN_WEIGHT: u64 = 40;
const IDENTITY_WEIGHT: u64 = 25;
const COMPLIANCE_WEIGHT: u64 = 20;

/// Values used when the chain cannot provide them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasDefaults {
    pub fallback_gas_estimate: u64,
    pub default_gas_price_wei: u128,
}

/// Where a figure of the estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Source {
    Chain,
    Fallback,
}

/// Proportional attribution of the total cost, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub token: U256,
    pub identity: U256,
    pub compliance: U256,
    /// Claim-topics registry, trusted-issuers registry and identity storage.
    pub registries: U256,
}

impl CostBreakdown {
    /// Split `total` by the fixed weights. The parts always sum to `total`.
    pub fn split(total: U256) -> Self {
        let percent = |weight: u64| total * U256::from(weight) / U256::from(100u64);
        let token = percent(TOKEN_WEIGHT);
        let identity = percent(IDENTITY_WEIGHT);
        let compliance = percent(COMPLIANCE_WEIGHT);
        Self {
            token,
            identity,
            compliance,
            registries: total - token - identity - compliance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostEstimate {
    pub gas_estimate: u64,
    pub gas_estimate_source: Source,
    pub gas_price_wei: u128,
    pub gas_price_source: Source,
    pub total_cost_wei: U256,
    pub breakdown: CostBreakdown,
    pub notice: &'static str,
}

impl CostEstimate {
    pub fn new(
        gas_estimate: u64,
        gas_estimate_source: Source,
        gas_price_wei: u128,
        gas_price_source: Source,
    ) -> Self {
        let total_cost_wei = U256::from(gas_estimate) * U256::from(gas_price_wei);
        Self {
            gas_estimate,
            gas_estimate_source,
            gas_price_wei,
            gas_price_source,
            total_cost_wei,
            breakdown: CostBreakdown::split(total_cost_wei),
            notice: BREAKDOWN_NOTICE,
        }
    }
}

/// Estimate the cost of deploying `request` through `factory`.
///
/// Validates first, then simulates the deployment (nothing is broadcast). A simulation
/// failure is returned as-is: it is the main signal that the chain would reject the
/// parameters, e.g. because the salt was already used.
pub async fn estimate<C: ChainClient>(
    chain: &C,
    factory: Address,
    request: &DeploymentRequest,
    sender: Option<Address>,
    defaults: &GasDefaults,
) -> Result<CostEstimate, DeployError> {
    let validated = validation::validate(request)?;

    let mut tx = TxRequest::new(factory::deploy_suite_call(factory, &validated));
    if let Some(sender) = sender {
        tx = tx.sender(sender);
    }

    let simulation = chain.simulate(&tx).await.map_err(DeployError::Simulation)?;

    let (gas_estimate, gas_estimate_source) = match simulation.gas_used {
        Some(gas) => (gas, Source::Chain),
        None => (defaults.fallback_gas_estimate, Source::Fallback),
    };

    let (gas_price_wei, gas_price_source) = match chain.gas_price().await {
        Ok(price) => (price, Source::Chain),
        Err(e) => {
            tracing::warn!(
                error = %e,
                fallback_wei = defaults.default_gas_price_wei,
                "Gas price unavailable, using default"
            );
            (defaults.default_gas_price_wei, Source::Fallback)
        }
    };

    tracing::info!(
        salt = %validated.salt,
        gas_estimate,
        %gas_estimate_source,
        gas_price_wei,
        "Deployment cost estimated"
    );

    Ok(CostEstimate::new(
        gas_estimate,
        gas_estimate_source,
        gas_price_wei,
        gas_price_source,
    ))
}
