//! Scripted in-memory chain used by the integration tests.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use alloy_core::primitives::{Address, B256, Bytes, keccak256};
use tokensuite_deploy::{
    ChainClient, ChainError, ContractCall, DeploymentRequest, Network, SimulationOutcome,
    SuiteAddresses, SuiteContract, TxConfirmation, TxRequest, cost::GasDefaults,
};

pub const SALT: &str = "a1b2c3d4-e5f6-47a8-89ab-cdef01234567";

pub fn factory() -> Address {
    Address::repeat_byte(0xfa)
}

pub fn deployer() -> String {
    format!("0x{}", "2".repeat(40))
}

pub fn gas_defaults() -> GasDefaults {
    GasDefaults {
        fallback_gas_estimate: 500_000,
        default_gas_price_wei: 20_000_000_000,
    }
}

/// The example request used throughout the tests.
pub fn request() -> DeploymentRequest {
    serde_json::from_value(serde_json::json!({
        "salt": SALT,
        "name": "Example Tower",
        "symbol": "EXT",
        "initialSupply": 1000000,
        "claimTopics": [1, 2, 7],
        "trustedIssuers": [format!("0x{}", "1".repeat(40))],
        "complianceModules": [],
    }))
    .unwrap()
}

pub fn request_with_salt(salt: &str) -> DeploymentRequest {
    DeploymentRequest {
        salt: salt.to_string(),
        ..request()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// How a getter misbehaves.
#[derive(Debug, Clone)]
pub enum GetterFault {
    Error(ChainError),
    ZeroAddress,
}

/// Failures to inject, one per stage. Each is persistent until cleared.
#[derive(Debug, Default)]
struct Faults {
    simulate: Option<ChainError>,
    estimate: Option<ChainError>,
    write: Option<ChainError>,
    confirm: Option<ChainError>,
    getter: Option<(SuiteContract, GetterFault)>,
    gas_price: Option<ChainError>,
}

/// A factory living in memory.
///
/// `deploySuite` rejects a salt that was already deployed, like the real factory does.
/// Getters return the zero address for unknown salts.
#[derive(Debug)]
pub struct MockChain {
    network: Network,
    faults: Mutex<Faults>,
    /// Gas reported by simulations; `None` mimics a client without gas reporting.
    simulation_gas: Mutex<Option<u64>>,
    gas_price: u128,
    deployed: Mutex<HashMap<B256, SuiteAddresses>>,
    submitted: Mutex<Vec<(B256, B256)>>,
    block_number: AtomicUsize,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            network: Network::Anvil,
            faults: Mutex::default(),
            simulation_gas: Mutex::new(Some(4_200_000)),
            gas_price: 1_000_000_000,
            deployed: Mutex::default(),
            submitted: Mutex::default(),
            block_number: AtomicUsize::new(100),
            calls: Mutex::default(),
        }
    }
}

pub fn revert(message: &str) -> ChainError {
    ChainError::Rpc {
        code: 3,
        message: format!("execution reverted: {message}"),
        data: None,
    }
}

/// The addresses the mock factory assigns to a salt.
pub fn expected_addresses(salt: B256) -> SuiteAddresses {
    let derive = |contract: SuiteContract| {
        let hash = keccak256([salt.as_slice(), contract.getter().as_bytes()].concat());
        Address::from_slice(&hash[12..])
    };
    SuiteAddresses {
        token_address: derive(SuiteContract::Token),
        identity_registry_address: derive(SuiteContract::IdentityRegistry),
        compliance_address: derive(SuiteContract::Compliance),
        claim_topics_registry_address: derive(SuiteContract::ClaimTopicsRegistry),
        trusted_issuers_registry_address: derive(SuiteContract::TrustedIssuersRegistry),
        identity_registry_storage_address: derive(SuiteContract::IdentityRegistryStorage),
    }
}

fn salt_of(calldata: &Bytes) -> B256 {
    B256::from_slice(&calldata[4..36])
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_simulation(&self, error: ChainError) {
        self.faults.lock().unwrap().simulate = Some(error);
    }

    pub fn fail_gas_estimation(&self, error: ChainError) {
        self.faults.lock().unwrap().estimate = Some(error);
    }

    pub fn fail_submission(&self, error: ChainError) {
        self.faults.lock().unwrap().write = Some(error);
    }

    pub fn fail_confirmation(&self, error: ChainError) {
        self.faults.lock().unwrap().confirm = Some(error);
    }

    pub fn fail_getter(&self, contract: SuiteContract, fault: GetterFault) {
        self.faults.lock().unwrap().getter = Some((contract, fault));
    }

    pub fn fail_gas_price(&self, error: ChainError) {
        self.faults.lock().unwrap().gas_price = Some(error);
    }

    pub fn clear_faults(&self) {
        *self.faults.lock().unwrap() = Faults::default();
    }

    pub fn without_simulation_gas(&self) {
        *self.simulation_gas.lock().unwrap() = None;
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Hash of the most recently broadcast transaction.
    pub fn last_tx_hash(&self) -> Option<B256> {
        self.submitted.lock().unwrap().last().map(|(hash, _)| *hash)
    }

    pub fn is_deployed(&self, salt: B256) -> bool {
        self.deployed.lock().unwrap().contains_key(&salt)
    }

    fn record(&self, method: &'static str) {
        *self.calls.lock().unwrap().entry(method).or_default() += 1;
    }

    fn check_deploy(&self, tx: &TxRequest) -> Result<B256, ChainError> {
        assert_eq!(tx.call.function, "deploySuite");
        let salt = salt_of(&tx.call.calldata);
        if self.is_deployed(salt) {
            return Err(revert("salt already used"));
        }
        Ok(salt)
    }
}

impl ChainClient for MockChain {
    fn network(&self) -> Network {
        self.network
    }

    async fn simulate(&self, tx: &TxRequest) -> Result<SimulationOutcome, ChainError> {
        self.record("simulate");
        if let Some(error) = self.faults.lock().unwrap().simulate.clone() {
            return Err(error);
        }
        self.check_deploy(tx)?;
        Ok(SimulationOutcome {
            return_data: Bytes::new(),
            gas_used: *self.simulation_gas.lock().unwrap(),
        })
    }

    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64, ChainError> {
        self.record("estimate_gas");
        if let Some(error) = self.faults.lock().unwrap().estimate.clone() {
            return Err(error);
        }
        self.check_deploy(tx)?;
        Ok(4_500_000)
    }

    async fn write(&self, tx: &TxRequest) -> Result<B256, ChainError> {
        self.record("write");
        if let Some(error) = self.faults.lock().unwrap().write.clone() {
            return Err(error);
        }
        assert!(tx.gas_limit.is_some(), "deployment sent without a gas limit");
        let salt = self.check_deploy(tx)?;

        let tx_hash = B256::from(rand::random::<[u8; 32]>());
        self.submitted.lock().unwrap().push((tx_hash, salt));
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: B256) -> Result<TxConfirmation, ChainError> {
        self.record("wait_for_confirmation");
        if let Some(error) = self.faults.lock().unwrap().confirm.clone() {
            return Err(error);
        }

        let salt = self
            .submitted
            .lock()
            .unwrap()
            .iter()
            .find(|(hash, _)| *hash == tx_hash)
            .map(|(_, salt)| *salt)
            .ok_or_else(|| ChainError::Transport(format!("unknown transaction {tx_hash}")))?;

        self.deployed
            .lock()
            .unwrap()
            .insert(salt, expected_addresses(salt));

        Ok(TxConfirmation {
            tx_hash,
            gas_used: 4_321_000,
            block_number: self.block_number.fetch_add(1, Ordering::SeqCst) as u64,
        })
    }

    async fn read(&self, call: &ContractCall) -> Result<Bytes, ChainError> {
        self.record("read");
        let contract = SuiteContract::ALL
            .into_iter()
            .find(|c| c.getter() == call.function)
            .unwrap_or_else(|| panic!("unexpected read {}", call.function));

        let fault = self.faults.lock().unwrap().getter.clone();
        let mut address = self
            .deployed
            .lock()
            .unwrap()
            .get(&salt_of(&call.calldata))
            .map(|addresses| match contract {
                SuiteContract::Token => addresses.token_address,
                SuiteContract::IdentityRegistry => addresses.identity_registry_address,
                SuiteContract::Compliance => addresses.compliance_address,
                SuiteContract::IdentityRegistryStorage => {
                    addresses.identity_registry_storage_address
                }
                SuiteContract::ClaimTopicsRegistry => addresses.claim_topics_registry_address,
                SuiteContract::TrustedIssuersRegistry => {
                    addresses.trusted_issuers_registry_address
                }
            })
            .unwrap_or(Address::ZERO);

        match fault {
            Some((faulty, GetterFault::Error(error))) if faulty == contract => return Err(error),
            Some((faulty, GetterFault::ZeroAddress)) if faulty == contract => {
                address = Address::ZERO
            }
            _ => {}
        }

        Ok(Bytes::from(B256::left_padding_from(address.as_slice()).to_vec()))
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.record("gas_price");
        if let Some(error) = self.faults.lock().unwrap().gas_price.clone() {
            return Err(error);
        }
        Ok(self.gas_price)
    }
}
