//! Stage-tagged error taxonomy for suite deployments.

use alloy_core::primitives::B256;
use serde::{Deserialize, Serialize};

use crate::{
    chain::{ChainError, TxConfirmation},
    resolver::ResolveError,
    store::StoreError,
    types::DeployedSuite,
    validation::ValidationError,
};

/// The stage a deployment failed in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorStage {
    Validation,
    Simulation,
    GasEstimation,
    Submission,
    Confirmation,
    AddressResolution,
    Persistence,
}

/// A failed deployment attempt.
///
/// Each variant keeps the collaborator's error untouched so the chain-reported reason
/// (e.g. a revert message) always reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("simulation failed: {0}")]
    Simulation(#[source] ChainError),

    #[error("gas estimation failed: {0}")]
    GasEstimation(#[source] ChainError),

    #[error("submission failed: {0}")]
    Submission(#[source] ChainError),

    #[error("confirmation of transaction {tx_hash} failed: {source}")]
    Confirmation { tx_hash: B256, source: ChainError },

    /// The transaction is confirmed on-chain but the suite addresses are unknown.
    #[error("address resolution after confirmed transaction {tx_hash} failed: {source}")]
    AddressResolution {
        tx_hash: B256,
        confirmation: TxConfirmation,
        source: ResolveError,
    },

    #[error(
        "persisting deployment outcome failed: {source}{}{}",
        .suite.as_ref().map(|s| format!(
            " (suite deployed in transaction {}, token {})",
            s.tx_hash, s.addresses.token_address
        )).unwrap_or_default(),
        .outcome.as_ref().map(|e| format!(" (outcome: {e})")).unwrap_or_default()
    )]
    Persistence {
        source: StoreError,
        /// The suite that was deployed, when its record could not be written.
        suite: Option<Box<DeployedSuite>>,
        /// The error the attempt ended with, when the failure record could not be written.
        outcome: Option<Box<DeployError>>,
    },
}

impl DeployError {
    pub fn stage(&self) -> ErrorStage {
        match self {
            DeployError::Validation(_) => ErrorStage::Validation,
            DeployError::Simulation(_) => ErrorStage::Simulation,
            DeployError::GasEstimation(_) => ErrorStage::GasEstimation,
            DeployError::Submission(_) => ErrorStage::Submission,
            DeployError::Confirmation { .. } => ErrorStage::Confirmation,
            DeployError::AddressResolution { .. } => ErrorStage::AddressResolution,
            DeployError::Persistence { .. } => ErrorStage::Persistence,
        }
    }

    /// Hash of the submitted transaction, if the attempt got that far.
    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            DeployError::Confirmation { tx_hash, .. }
            | DeployError::AddressResolution { tx_hash, .. } => Some(*tx_hash),
            DeployError::Persistence {
                suite: Some(suite),
                ..
            } => Some(suite.tx_hash),
            DeployError::Persistence {
                outcome: Some(outcome),
                ..
            } => outcome.tx_hash(),
            _ => None,
        }
    }

    /// Confirmation details, present only when the transaction was mined.
    pub fn confirmation(&self) -> Option<&TxConfirmation> {
        match self {
            DeployError::AddressResolution { confirmation, .. } => Some(confirmation),
            DeployError::Persistence {
                outcome: Some(outcome),
                ..
            } => outcome.confirmation(),
            _ => None,
        }
    }

    /// The suite that is live on-chain even though this attempt reports an error.
    pub fn deployed_suite(&self) -> Option<&DeployedSuite> {
        match self {
            DeployError::Persistence { suite, .. } => suite.as_deref(),
            _ => None,
        }
    }

    /// Bad input: rejected before any gas was spent.
    pub fn is_client_error(&self) -> bool {
        matches!(self.stage(), ErrorStage::Validation | ErrorStage::Simulation)
    }

    /// Gas may already be spent; an operator should look at the record.
    pub fn requires_investigation(&self) -> bool {
        matches!(
            self.stage(),
            ErrorStage::Submission
                | ErrorStage::Confirmation
                | ErrorStage::AddressResolution
                | ErrorStage::Persistence
        )
    }
}

/// Errors from re-resolving the addresses of a stuck deployment.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("no deployment recorded for {0}")]
    NotFound(String),

    #[error("deployment {property_id} is not awaiting address resolution: {reason}")]
    NotReconcilable { property_id: String, reason: String },

    #[error("address resolution for {property_id} failed: {source}")]
    Resolution {
        property_id: String,
        source: ResolveError,
    },

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::SuiteContract;

    fn revert(message: &str) -> ChainError {
        ChainError::Rpc {
            code: 3,
            message: message.to_string(),
            data: None,
        }
    }

    #[test]
    fn test_stage_tags_and_classification() {
        let err = DeployError::Validation(ValidationError::MissingClaimTopics);
        assert_eq!(err.stage(), ErrorStage::Validation);
        assert!(err.is_client_error());
        assert!(!err.requires_investigation());

        let err = DeployError::Simulation(revert("execution reverted: salt already used"));
        assert_eq!(err.stage().to_string(), "simulation");
        assert!(err.is_client_error());

        let err = DeployError::Submission(revert("nonce too low"));
        assert_eq!(err.stage(), ErrorStage::Submission);
        assert!(!err.is_client_error());
        assert!(err.requires_investigation());
    }

    #[test]
    fn test_chain_message_is_preserved() {
        let err = DeployError::Simulation(revert("execution reverted: salt already used"));
        assert!(err.to_string().contains("execution reverted: salt already used"));
    }

    #[test]
    fn test_tx_hash_survives_persistence_failure() {
        let tx_hash = B256::repeat_byte(0xab);
        let outcome = DeployError::AddressResolution {
            tx_hash,
            confirmation: TxConfirmation {
                tx_hash,
                gas_used: 4_200_000,
                block_number: 17,
            },
            source: ResolveError::ZeroAddress {
                contract: SuiteContract::Compliance,
            },
        };
        let err = DeployError::Persistence {
            source: StoreError::EmptyKey,
            suite: None,
            outcome: Some(Box::new(outcome)),
        };

        assert_eq!(err.stage(), ErrorStage::Persistence);
        assert_eq!(err.tx_hash(), Some(tx_hash));
        assert_eq!(err.confirmation().map(|c| c.block_number), Some(17));
        assert!(err.to_string().contains("getCompliance"));
    }

    #[test]
    fn test_stage_serializes_as_snake_case() {
        let json = serde_json::to_string(&ErrorStage::AddressResolution).unwrap();
        assert_eq!(json, "\"address_resolution\"");
    }
}
