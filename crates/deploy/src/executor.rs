//! Deployment executor: drives one attempt through its stages.
//!
//! ```text
//! Validating -> Simulating -> EstimatingGas -> Submitting -> Confirming
//!            -> ResolvingAddresses -> Deployed
//! ```
//!
//! Any stage may end the attempt in `Failed` with a stage-tagged [`DeployError`]. No
//! stage is retried; callers retry by re-running the deployment with the same salt.

use alloy_core::primitives::{Address, B256};
use chrono::Utc;

use crate::{
    chain::{ChainClient, TxConfirmation, TxRequest, factory},
    error::DeployError,
    resolver::AddressResolver,
    types::{DeployedSuite, DeploymentRequest, ValidatedRequest},
    validation,
};

/// Stages of a deployment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeploymentStage {
    Validating,
    Simulating,
    EstimatingGas,
    Submitting,
    Confirming,
    ResolvingAddresses,
    Deployed,
    Failed,
}

/// Data collected once the request is validated.
#[derive(Debug, Clone)]
struct Attempt {
    request: ValidatedRequest,
    deployer: Address,
    tx: TxRequest,
}

/// Current position in the state machine, with what the next stage needs.
enum Step {
    Validating,
    Simulating(Attempt),
    EstimatingGas(Attempt),
    Submitting { attempt: Attempt, gas: u64 },
    Confirming { attempt: Attempt, tx_hash: B256 },
    ResolvingAddresses {
        attempt: Attempt,
        tx_hash: B256,
        confirmation: TxConfirmation,
    },
    Deployed(DeployedSuite),
}

impl Step {
    fn stage(&self) -> DeploymentStage {
        match self {
            Step::Validating => DeploymentStage::Validating,
            Step::Simulating(_) => DeploymentStage::Simulating,
            Step::EstimatingGas(_) => DeploymentStage::EstimatingGas,
            Step::Submitting { .. } => DeploymentStage::Submitting,
            Step::Confirming { .. } => DeploymentStage::Confirming,
            Step::ResolvingAddresses { .. } => DeploymentStage::ResolvingAddresses,
            Step::Deployed(_) => DeploymentStage::Deployed,
        }
    }
}

/// Runs single deployment attempts against a factory contract.
pub struct DeploymentExecutor<'a, C> {
    chain: &'a C,
    factory: Address,
}

impl<'a, C: ChainClient> DeploymentExecutor<'a, C> {
    pub fn new(chain: &'a C, factory: Address) -> Self {
        Self { chain, factory }
    }

    /// Run one attempt to completion.
    pub async fn run(
        &self,
        request: &DeploymentRequest,
        deployer: &str,
    ) -> Result<DeployedSuite, DeployError> {
        let salt = request.salt.trim();
        let mut step = Step::Validating;

        loop {
            let stage = step.stage();
            tracing::info!(%stage, salt, "Deployment stage");

            step = match self.advance(step, request, deployer).await {
                Ok(Step::Deployed(suite)) => {
                    tracing::info!(
                        stage = %DeploymentStage::Deployed,
                        salt,
                        tx_hash = %suite.tx_hash,
                        token = %suite.addresses.token_address,
                        "Token suite deployed"
                    );
                    return Ok(suite);
                }
                Ok(next) => next,
                Err(error) => {
                    tracing::error!(
                        stage = %DeploymentStage::Failed,
                        failed_stage = %error.stage(),
                        salt,
                        tx_hash = ?error.tx_hash(),
                        error = %error,
                        "Deployment failed"
                    );
                    return Err(error);
                }
            };
        }
    }

    async fn advance(
        &self,
        step: Step,
        request: &DeploymentRequest,
        deployer: &str,
    ) -> Result<Step, DeployError> {
        match step {
            Step::Validating => {
                let validated = validation::validate(request)?;
                let deployer = validation::validate_deployer(deployer)?;
                let tx = TxRequest::new(factory::deploy_suite_call(self.factory, &validated))
                    .sender(deployer);

                Ok(Step::Simulating(Attempt {
                    request: validated,
                    deployer,
                    tx,
                }))
            }

            Step::Simulating(attempt) => {
                let outcome = self
                    .chain
                    .simulate(&attempt.tx)
                    .await
                    .map_err(DeployError::Simulation)?;
                tracing::debug!(gas_used = ?outcome.gas_used, "Simulation succeeded");
                Ok(Step::EstimatingGas(attempt))
            }

            Step::EstimatingGas(attempt) => {
                let gas = self
                    .chain
                    .estimate_gas(&attempt.tx)
                    .await
                    .map_err(DeployError::GasEstimation)?;
                tracing::debug!(gas, "Gas estimated");
                Ok(Step::Submitting { attempt, gas })
            }

            Step::Submitting { attempt, gas } => {
                let tx = attempt.tx.clone().gas_limit(gas);
                let tx_hash = self
                    .chain
                    .write(&tx)
                    .await
                    .map_err(DeployError::Submission)?;
                tracing::info!(%tx_hash, gas_limit = gas, "Deployment transaction submitted");
                Ok(Step::Confirming { attempt, tx_hash })
            }

            Step::Confirming { attempt, tx_hash } => {
                let confirmation = self
                    .chain
                    .wait_for_confirmation(tx_hash)
                    .await
                    .map_err(|source| DeployError::Confirmation { tx_hash, source })?;
                tracing::info!(
                    %tx_hash,
                    gas_used = confirmation.gas_used,
                    block_number = confirmation.block_number,
                    "Deployment transaction confirmed"
                );
                Ok(Step::ResolvingAddresses {
                    attempt,
                    tx_hash,
                    confirmation,
                })
            }

            Step::ResolvingAddresses {
                attempt,
                tx_hash,
                confirmation,
            } => {
                let addresses = AddressResolver::new(self.chain, self.factory)
                    .resolve(attempt.request.onchain_salt)
                    .await
                    .map_err(|source| DeployError::AddressResolution {
                        tx_hash,
                        confirmation,
                        source,
                    })?;

                Ok(Step::Deployed(DeployedSuite {
                    salt: attempt.request.salt,
                    addresses,
                    tx_hash,
                    gas_used: confirmation.gas_used,
                    block_number: confirmation.block_number,
                    deployed_at: Utc::now(),
                    deployer_address: attempt.deployer,
                    network: self.chain.network(),
                }))
            }

            Step::Deployed(suite) => Ok(Step::Deployed(suite)),
        }
    }
}
