//! Domain types shared by the validator, executor, store and orchestrator.

use alloy_core::primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use derive_more::{Deref, Display, From};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{DeployError, ErrorStage};

/// Network selector for the chain the suite is deployed to.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Network {
    Mainnet,
    Sepolia,
    Polygon,
    PolygonAmoy,
    Base,
    BaseSepolia,
    /// Local development node.
    #[default]
    Anvil,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Sepolia => 11155111,
            Network::Polygon => 137,
            Network::PolygonAmoy => 80002,
            Network::Base => 8453,
            Network::BaseSepolia => 84532,
            Network::Anvil => 31337,
        }
    }
}

/// The salt as understood by the factory contract.
///
/// The 16 UUID bytes are left-aligned in a `bytes32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deref, Display, From)]
pub struct OnChainSalt(B256);

impl OnChainSalt {
    pub fn from_uuid(uuid: &Uuid) -> Self {
        Self(B256::right_padding_from(uuid.as_bytes()))
    }
}

/// Caller-supplied issuance intent.
///
/// Fields are kept close to the wire representation so that every malformed value
/// reaches [`crate::validate`] and is reported there, instead of failing during
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    /// Asset identifier the deployment record is stored under. Defaults to the salt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    /// UUID string; idempotency key and deterministic-deployment seed.
    pub salt: String,
    pub name: String,
    pub symbol: String,
    /// Decimal (or `0x` hex) integer, arbitrary precision.
    #[serde(deserialize_with = "deserialize_supply")]
    pub initial_supply: String,
    /// Any JSON numbers; only positive integers pass validation.
    pub claim_topics: Vec<serde_json::Number>,
    pub trusted_issuers: Vec<String>,
    #[serde(default)]
    pub compliance_modules: Vec<String>,
}

impl DeploymentRequest {
    /// The key the deployment record is stored under.
    pub fn asset_id(&self) -> &str {
        match self.property_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => self.salt.trim(),
        }
    }
}

/// Accept the supply either as a JSON string or as a JSON number.
fn deserialize_supply<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Supply {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Supply::deserialize(deserializer)? {
        Supply::Text(text) => text,
        Supply::Number(number) => number.to_string(),
    })
}

/// A request that passed every validation rule, with typed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    /// The salt as supplied by the caller (trimmed).
    pub salt: String,
    pub onchain_salt: OnChainSalt,
    pub name: String,
    pub symbol: String,
    pub initial_supply: U256,
    pub claim_topics: Vec<u64>,
    pub trusted_issuers: Vec<Address>,
    pub compliance_modules: Vec<Address>,
}

/// Addresses of the six contracts created by a suite deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteAddresses {
    pub token_address: Address,
    pub identity_registry_address: Address,
    pub compliance_address: Address,
    pub claim_topics_registry_address: Address,
    pub trusted_issuers_registry_address: Address,
    pub identity_registry_storage_address: Address,
}

impl SuiteAddresses {
    pub fn all_non_zero(&self) -> bool {
        [
            self.token_address,
            self.identity_registry_address,
            self.compliance_address,
            self.claim_topics_registry_address,
            self.trusted_issuers_registry_address,
            self.identity_registry_storage_address,
        ]
        .iter()
        .all(|address| !address.is_zero())
    }
}

/// On-chain outcome of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedSuite {
    pub salt: String,
    #[serde(flatten)]
    pub addresses: SuiteAddresses,
    pub tx_hash: B256,
    pub gas_used: u64,
    pub block_number: u64,
    pub deployed_at: DateTime<Utc>,
    pub deployer_address: Address,
    pub network: Network,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Deployed,
    Failed,
}

/// Durable projection of the latest deployment attempt for one asset.
///
/// Every upsert replaces the whole record, so fields from a previous attempt never
/// survive into the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub property_id: String,
    pub salt: String,
    pub status: DeploymentStatus,
    pub network: Network,
    pub deployer_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<SuiteAddresses>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<ErrorStage>,
    /// Start of the attempt this record describes.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeploymentRecord {
    /// Record written when an attempt starts.
    pub fn pending(
        property_id: &str,
        request: &DeploymentRequest,
        network: Network,
        deployer_address: &str,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            property_id: property_id.to_string(),
            salt: request.salt.trim().to_string(),
            status: DeploymentStatus::Pending,
            network,
            deployer_address: deployer_address.trim().to_string(),
            tx_hash: None,
            addresses: None,
            gas_used: None,
            block_number: None,
            error: None,
            failed_stage: None,
            created_at: started_at,
            updated_at: started_at,
        }
    }

    /// Record written once the suite is confirmed and every address is resolved.
    pub fn deployed(property_id: &str, suite: &DeployedSuite, started_at: DateTime<Utc>) -> Self {
        Self {
            property_id: property_id.to_string(),
            salt: suite.salt.clone(),
            status: DeploymentStatus::Deployed,
            network: suite.network,
            deployer_address: suite.deployer_address.to_string(),
            tx_hash: Some(suite.tx_hash),
            addresses: Some(suite.addresses),
            gas_used: Some(suite.gas_used),
            block_number: Some(suite.block_number),
            error: None,
            failed_stage: None,
            created_at: started_at,
            updated_at: Utc::now(),
        }
    }

    /// Turn a pending record into a failed one, keeping whatever the error collected.
    pub fn into_failed(self, error: &DeployError) -> Self {
        let confirmation = error.confirmation();
        Self {
            status: DeploymentStatus::Failed,
            tx_hash: error.tx_hash(),
            addresses: None,
            gas_used: confirmation.map(|c| c.gas_used),
            block_number: confirmation.map(|c| c.block_number),
            error: Some(error.to_string()),
            failed_stage: Some(error.stage()),
            updated_at: Utc::now(),
            ..self
        }
    }

    pub fn token_address(&self) -> Option<Address> {
        match self.status {
            DeploymentStatus::Deployed => self.addresses.map(|a| a.token_address),
            _ => None,
        }
    }
}
