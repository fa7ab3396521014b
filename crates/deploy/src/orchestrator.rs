//! Entry point tying the executor, the chain client and the deployment store together.

use alloy_core::primitives::Address;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    chain::ChainClient,
    cost::{self, CostEstimate, GasDefaults},
    error::{DeployError, ErrorStage, ReconcileError},
    executor::DeploymentExecutor,
    resolver::AddressResolver,
    store::{DeploymentStore, StoreError},
    types::{
        DeployedSuite, DeploymentRecord, DeploymentRequest, DeploymentStatus, OnChainSalt,
    },
    validation::ValidationError,
};

/// Outcome of a [`SuiteOrchestrator::reconcile_all`] sweep.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub reconciled: Vec<DeploymentRecord>,
    pub still_failed: Vec<ReconcileFailure>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileFailure {
    pub property_id: String,
    pub error: String,
}

/// Deploys token suites and keeps the deployment store in step with the chain.
pub struct SuiteOrchestrator<C, S> {
    chain: C,
    store: S,
    factory: Address,
    gas_defaults: GasDefaults,
}

impl<C: ChainClient, S: DeploymentStore> SuiteOrchestrator<C, S> {
    pub fn new(chain: C, store: S, factory: Address, gas_defaults: GasDefaults) -> Self {
        Self {
            chain,
            store,
            factory,
            gas_defaults,
        }
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    /// Deploy the suite described by `request` from `deployer`.
    ///
    /// A pending record is written before anything touches the chain and replaced by the
    /// deployed or failed record once the attempt ends. Failed records keep whatever the
    /// attempt collected, in particular the transaction hash once one exists.
    pub async fn deploy_suite(
        &self,
        request: &DeploymentRequest,
        deployer: &str,
    ) -> Result<DeployedSuite, DeployError> {
        let property_id = request.asset_id().to_string();
        if property_id.is_empty() {
            return Err(ValidationError::InvalidSalt(String::new()).into());
        }

        let started_at = Utc::now();
        let pending = DeploymentRecord::pending(
            &property_id,
            request,
            self.chain.network(),
            deployer,
            started_at,
        );
        self.store
            .upsert(pending.clone())
            .await
            .map_err(|source| DeployError::Persistence {
                source,
                suite: None,
                outcome: None,
            })?;

        let outcome = DeploymentExecutor::new(&self.chain, self.factory)
            .run(request, deployer)
            .await;

        match outcome {
            Ok(suite) => {
                let record = DeploymentRecord::deployed(&property_id, &suite, started_at);
                if let Err(source) = self.store.upsert(record).await {
                    tracing::error!(
                        %property_id,
                        tx_hash = %suite.tx_hash,
                        token = %suite.addresses.token_address,
                        error = %source,
                        "Suite deployed but the record could not be stored"
                    );
                    return Err(DeployError::Persistence {
                        source,
                        suite: Some(Box::new(suite)),
                        outcome: None,
                    });
                }
                Ok(suite)
            }
            Err(error) => {
                let record = pending.into_failed(&error);
                if let Err(source) = self.store.upsert(record).await {
                    tracing::error!(
                        %property_id,
                        error = %source,
                        "Failed deployment could not be recorded"
                    );
                    return Err(DeployError::Persistence {
                        source,
                        suite: None,
                        outcome: Some(Box::new(error)),
                    });
                }
                Err(error)
            }
        }
    }

    /// Estimate the deployment cost of `request` without broadcasting anything.
    pub async fn estimate_cost(
        &self,
        request: &DeploymentRequest,
        sender: Option<Address>,
    ) -> Result<CostEstimate, DeployError> {
        cost::estimate(
            &self.chain,
            self.factory,
            request,
            sender,
            &self.gas_defaults,
        )
        .await
    }

    pub async fn get_deployment(
        &self,
        property_id: &str,
    ) -> Result<Option<DeploymentRecord>, StoreError> {
        self.store.get(property_id.trim()).await
    }

    /// Token address of the deployed suite with the given salt.
    pub async fn get_token_address(&self, salt: &str) -> Result<Option<Address>, StoreError> {
        let salt = salt.trim();

        // Records are keyed by the salt unless a property id was supplied.
        if let Some(record) = self.store.get(salt).await?
            && record.salt == salt
        {
            return Ok(record.token_address());
        }

        Ok(self
            .store
            .list()
            .await?
            .iter()
            .filter(|record| record.salt == salt)
            .find_map(DeploymentRecord::token_address))
    }

    pub async fn list_deployments(&self) -> Result<Vec<DeploymentRecord>, StoreError> {
        self.store.list().await
    }

    /// Retry address resolution for a deployment whose transaction was confirmed but
    /// whose addresses could not be read.
    ///
    /// Nothing is sent to the chain. On success the record becomes `deployed`; on failure
    /// it stays `failed` with the new error.
    pub async fn reconcile(&self, property_id: &str) -> Result<DeploymentRecord, ReconcileError> {
        let property_id = property_id.trim();
        let record = self
            .store
            .get(property_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(property_id.to_string()))?;

        let not_reconcilable = |reason: &str| ReconcileError::NotReconcilable {
            property_id: property_id.to_string(),
            reason: reason.to_string(),
        };

        if !awaits_resolution(&record) {
            return Err(not_reconcilable(&format!(
                "status is {}{}",
                record.status,
                record
                    .failed_stage
                    .map(|stage| format!(" at stage {stage}"))
                    .unwrap_or_default()
            )));
        }
        if record.tx_hash.is_none() {
            return Err(not_reconcilable("no transaction hash recorded"));
        }
        let uuid = Uuid::parse_str(&record.salt)
            .map_err(|_| not_reconcilable("recorded salt is not a UUID"))?;

        let addresses = match AddressResolver::new(&self.chain, self.factory)
            .resolve(OnChainSalt::from_uuid(&uuid))
            .await
        {
            Ok(addresses) => addresses,
            Err(source) => {
                let error = ReconcileError::Resolution {
                    property_id: property_id.to_string(),
                    source,
                };
                self.store
                    .upsert(DeploymentRecord {
                        error: Some(error.to_string()),
                        updated_at: Utc::now(),
                        ..record
                    })
                    .await?;
                return Err(error);
            }
        };

        let record = DeploymentRecord {
            status: DeploymentStatus::Deployed,
            addresses: Some(addresses),
            error: None,
            failed_stage: None,
            updated_at: Utc::now(),
            ..record
        };
        self.store.upsert(record.clone()).await?;

        tracing::info!(
            property_id,
            tx_hash = ?record.tx_hash,
            token = %addresses.token_address,
            "Deployment reconciled"
        );
        Ok(record)
    }

    /// Run [`Self::reconcile`] over every record stuck at address resolution.
    pub async fn reconcile_all(&self) -> Result<ReconcileReport, StoreError> {
        let candidates: Vec<_> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|record| awaits_resolution(record) && record.tx_hash.is_some())
            .collect();

        tracing::debug!(count = candidates.len(), "Reconciling deployments");

        let mut report = ReconcileReport::default();
        for candidate in candidates {
            match self.reconcile(&candidate.property_id).await {
                Ok(record) => report.reconciled.push(record),
                Err(ReconcileError::Persistence(e)) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        property_id = %candidate.property_id,
                        error = %e,
                        "Deployment still unresolved"
                    );
                    report.still_failed.push(ReconcileFailure {
                        property_id: candidate.property_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

fn awaits_resolution(record: &DeploymentRecord) -> bool {
    record.status == DeploymentStatus::Failed
        && record.failed_stage == Some(ErrorStage::AddressResolution)
}
