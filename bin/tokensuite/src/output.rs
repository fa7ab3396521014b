//! Human and JSON rendering of command results.

use std::process::ExitCode;

use alloy_core::primitives::{Address, U256};
use comfy_table::{Table, presets::UTF8_FULL};
use serde::Serialize;
use tokensuite_deploy::{
    ApiResponse, CostEstimate, DeployError, DeployedSuite, DeploymentRecord, ReconcileReport,
    SuiteAddresses, ValidatedRequest, api,
};

/// Print `data`, either through `human` or as a success envelope.
pub fn emit<T: Serialize>(json: bool, data: &T, human: impl FnOnce(&T)) {
    if json {
        print_json(&ApiResponse::ok(data));
    } else {
        human(data);
    }
}

/// Like [`emit`], but failures are printed as an error envelope and returned.
pub fn emit_result<T, E>(
    json: bool,
    result: Result<T, E>,
    human: impl FnOnce(&T),
) -> anyhow::Result<()>
where
    T: Serialize,
    E: std::error::Error + Send + Sync + 'static,
{
    match result {
        Ok(data) => {
            emit(json, &data, human);
            Ok(())
        }
        Err(e) => {
            if json {
                print_json(&ApiResponse::<T>::err(&e));
            }
            Err(e.into())
        }
    }
}

/// Like [`emit_result`] for deploy and estimate, whose failures become the exit status.
pub fn emit_deployment<T: Serialize>(
    json: bool,
    result: Result<T, DeployError>,
    human: impl FnOnce(&T),
) -> ExitCode {
    match result {
        Ok(data) => {
            emit(json, &data, human);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if json {
                print_json(&ApiResponse::<T>::err(&e));
            } else {
                eprintln!("Error: {e}");
            }
            let status = exit_status(&e);
            tracing::debug!(stage = %e.stage(), status, "Exiting after failed deployment operation");
            ExitCode::from(status)
        }
    }
}

/// 1 when the deployment itself failed (HTTP 400), 2 when the store failed (HTTP 500).
fn exit_status(error: &DeployError) -> u8 {
    match api::status_code(error) {
        500.. => 2,
        _ => 1,
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize output"),
    }
}

/// What the validator derived from a request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub salt: String,
    pub onchain_salt: String,
    pub name: String,
    pub symbol: String,
    pub initial_supply: U256,
    pub claim_topics: Vec<u64>,
    pub trusted_issuers: Vec<Address>,
    pub compliance_modules: Vec<Address>,
}

impl From<&ValidatedRequest> for ValidationSummary {
    fn from(request: &ValidatedRequest) -> Self {
        Self {
            salt: request.salt.clone(),
            onchain_salt: request.onchain_salt.to_string(),
            name: request.name.clone(),
            symbol: request.symbol.clone(),
            initial_supply: request.initial_supply,
            claim_topics: request.claim_topics.clone(),
            trusted_issuers: request.trusted_issuers.clone(),
            compliance_modules: request.compliance_modules.clone(),
        }
    }
}

pub fn print_validation(summary: &ValidationSummary) {
    println!("Request is valid");
    println!("  salt:             {}", summary.salt);
    println!("  on-chain salt:    {}", summary.onchain_salt);
    println!("  token:            {} ({})", summary.name, summary.symbol);
    println!("  initial supply:   {}", summary.initial_supply);
    println!("  claim topics:     {:?}", summary.claim_topics);
    println!("  trusted issuers:  {}", summary.trusted_issuers.len());
    println!("  compliance mods:  {}", summary.compliance_modules.len());
}

pub fn print_estimate(estimate: &CostEstimate) {
    println!(
        "Gas estimate:  {} ({})",
        estimate.gas_estimate, estimate.gas_estimate_source
    );
    println!(
        "Gas price:     {} wei ({})",
        estimate.gas_price_wei, estimate.gas_price_source
    );
    println!("Total cost:    {} wei", estimate.total_cost_wei);
    println!("  token:       {} wei", estimate.breakdown.token);
    println!("  identity:    {} wei", estimate.breakdown.identity);
    println!("  compliance:  {} wei", estimate.breakdown.compliance);
    println!("  registries:  {} wei", estimate.breakdown.registries);
    println!("Note: {}", estimate.notice);
}

fn print_addresses(addresses: &SuiteAddresses) {
    println!("  token:                     {}", addresses.token_address);
    println!("  identity registry:         {}", addresses.identity_registry_address);
    println!("  compliance:                {}", addresses.compliance_address);
    println!("  claim topics registry:     {}", addresses.claim_topics_registry_address);
    println!("  trusted issuers registry:  {}", addresses.trusted_issuers_registry_address);
    println!("  identity registry storage: {}", addresses.identity_registry_storage_address);
}

pub fn print_suite(suite: &DeployedSuite) {
    println!("Token suite deployed on {}", suite.network);
    println!("  salt:      {}", suite.salt);
    println!("  tx hash:   {}", suite.tx_hash);
    println!("  block:     {}", suite.block_number);
    println!("  gas used:  {}", suite.gas_used);
    println!("  deployer:  {}", suite.deployer_address);
    print_addresses(&suite.addresses);
}

pub fn print_record(record: &DeploymentRecord) {
    println!("Deployment {} [{}]", record.property_id, record.status);
    println!("  salt:      {}", record.salt);
    println!("  network:   {}", record.network);
    println!("  deployer:  {}", record.deployer_address);
    if let Some(tx_hash) = record.tx_hash {
        println!("  tx hash:   {tx_hash}");
    }
    if let Some(block_number) = record.block_number {
        println!("  block:     {block_number}");
    }
    if let Some(stage) = record.failed_stage {
        println!("  failed at: {stage}");
    }
    if let Some(error) = &record.error {
        println!("  error:     {error}");
    }
    println!("  updated:   {}", record.updated_at.to_rfc3339());
    if let Some(addresses) = &record.addresses {
        print_addresses(addresses);
    }
}

pub fn print_table(records: &[DeploymentRecord]) {
    if records.is_empty() {
        println!("No deployments recorded");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Property",
        "Status",
        "Network",
        "Token",
        "Tx hash",
        "Updated",
    ]);

    for record in records {
        let status = match record.failed_stage {
            Some(stage) => format!("{} ({stage})", record.status),
            None => record.status.to_string(),
        };
        table.add_row(vec![
            record.property_id.clone(),
            status,
            record.network.to_string(),
            record
                .token_address()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record
                .tx_hash
                .map(|h| h.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

pub fn print_report(report: &ReconcileReport) {
    if report.reconciled.is_empty() && report.still_failed.is_empty() {
        println!("Nothing to reconcile");
        return;
    }
    for record in &report.reconciled {
        println!(
            "reconciled  {}  token {}",
            record.property_id,
            record
                .token_address()
                .map(|a| a.to_string())
                .unwrap_or_default()
        );
    }
    for failure in &report.still_failed {
        println!("unresolved  {}  {}", failure.property_id, failure.error);
    }
}
