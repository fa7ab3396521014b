//! Resolution of the contract addresses created by a suite deployment.
//!
//! The deployment transaction creates six contracts implicitly, so their addresses are
//! not taken from the receipt. Instead the factory is queried once per contract, keyed
//! by the salt. Resolution is all-or-nothing.

use alloy_core::primitives::Address;

use crate::{
    abi::{self, AbiError},
    chain::{ChainClient, ChainError, factory},
    types::{OnChainSalt, SuiteAddresses},
};

/// One of the contracts that make up a suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SuiteContract {
    Token,
    IdentityRegistry,
    Compliance,
    IdentityRegistryStorage,
    ClaimTopicsRegistry,
    TrustedIssuersRegistry,
}

impl SuiteContract {
    pub const ALL: [SuiteContract; 6] = [
        SuiteContract::Token,
        SuiteContract::IdentityRegistry,
        SuiteContract::Compliance,
        SuiteContract::IdentityRegistryStorage,
        SuiteContract::ClaimTopicsRegistry,
        SuiteContract::TrustedIssuersRegistry,
    ];

    /// Name of the factory getter returning this contract's address.
    pub fn getter(&self) -> &'static str {
        match self {
            SuiteContract::Token => "getToken",
            SuiteContract::IdentityRegistry => "getIdentityRegistry",
            SuiteContract::Compliance => "getCompliance",
            SuiteContract::IdentityRegistryStorage => "getIdentityRegistryStorage",
            SuiteContract::ClaimTopicsRegistry => "getClaimTopicsRegistry",
            SuiteContract::TrustedIssuersRegistry => "getTrustedIssuersRegistry",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("{} query failed: {source}", .contract.getter())]
    Query {
        contract: SuiteContract,
        source: ChainError,
    },

    #[error("{} returned an undecodable value: {source}", .contract.getter())]
    Decode {
        contract: SuiteContract,
        source: AbiError,
    },

    #[error("{} returned the zero address", .contract.getter())]
    ZeroAddress { contract: SuiteContract },
}

impl ResolveError {
    pub fn contract(&self) -> SuiteContract {
        match self {
            ResolveError::Query { contract, .. }
            | ResolveError::Decode { contract, .. }
            | ResolveError::ZeroAddress { contract } => *contract,
        }
    }
}

/// Queries the factory for the addresses of a deployed suite.
pub struct AddressResolver<'a, C> {
    chain: &'a C,
    factory: Address,
}

impl<'a, C: ChainClient> AddressResolver<'a, C> {
    pub fn new(chain: &'a C, factory: Address) -> Self {
        Self { chain, factory }
    }

    /// Resolve all six addresses for `salt`.
    ///
    /// The queries run concurrently. If any of them fails, or returns the zero address,
    /// the whole resolution fails.
    pub async fn resolve(&self, salt: OnChainSalt) -> Result<SuiteAddresses, ResolveError> {
        let (
            token_address,
            identity_registry_address,
            compliance_address,
            identity_registry_storage_address,
            claim_topics_registry_address,
            trusted_issuers_registry_address,
        ) = futures::try_join!(
            self.resolve_one(SuiteContract::Token, salt),
            self.resolve_one(SuiteContract::IdentityRegistry, salt),
            self.resolve_one(SuiteContract::Compliance, salt),
            self.resolve_one(SuiteContract::IdentityRegistryStorage, salt),
            self.resolve_one(SuiteContract::ClaimTopicsRegistry, salt),
            self.resolve_one(SuiteContract::TrustedIssuersRegistry, salt),
        )?;

        Ok(SuiteAddresses {
            token_address,
            identity_registry_address,
            compliance_address,
            claim_topics_registry_address,
            trusted_issuers_registry_address,
            identity_registry_storage_address,
        })
    }

    async fn resolve_one(
        &self,
        contract: SuiteContract,
        salt: OnChainSalt,
    ) -> Result<Address, ResolveError> {
        let call = factory::getter_call(self.factory, contract, salt);
        let data = self
            .chain
            .read(&call)
            .await
            .map_err(|source| ResolveError::Query { contract, source })?;

        let address =
            abi::decode_address(&data).map_err(|source| ResolveError::Decode { contract, source })?;
        if address.is_zero() {
            return Err(ResolveError::ZeroAddress { contract });
        }

        tracing::debug!(%contract, %address, "Resolved suite contract address");
        Ok(address)
    }
}
