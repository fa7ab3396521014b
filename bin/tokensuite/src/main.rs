//! tokensuite deploys compliant security token suites and keeps track of them.

mod cli;
mod config;
mod output;

use std::{path::Path, process::ExitCode, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use tokensuite_deploy::{
    DeploymentRequest, FileDeploymentStore, JsonRpcChainClient, SuiteConfig,
    SuiteOrchestrator, validate,
};

type Orchestrator = SuiteOrchestrator<JsonRpcChainClient, FileDeploymentStore>;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize the logger. Logs go to stderr so that stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load(cli.config.as_deref(), &cli.overrides)?;
    let json = cli.json;

    match cli.command {
        Command::Salt => {
            let salt = uuid::Uuid::new_v4().to_string();
            output::emit(json, &salt, |salt| println!("{salt}"));
        }

        Command::Validate { request } => {
            let request = read_request(&request).await?;
            let result = validate(&request).map(|v| output::ValidationSummary::from(&v));
            output::emit_result(json, result, output::print_validation)?;
        }

        Command::Estimate { request, sender } => {
            let request = read_request(&request).await?;
            let orchestrator = orchestrator(&config)?;
            let result = orchestrator.estimate_cost(&request, sender).await;
            return Ok(output::emit_deployment(json, result, output::print_estimate));
        }

        Command::Deploy { request, deployer } => {
            let request = read_request(&request).await?;
            let orchestrator = orchestrator(&config)?;

            tracing::info!(
                property_id = request.asset_id(),
                salt = %request.salt,
                network = %config.network,
                deployer = %deployer,
                "Deploying token suite..."
            );

            let result = orchestrator.deploy_suite(&request, &deployer).await;
            if let Err(e) = &result
                && e.requires_investigation()
            {
                tracing::warn!(
                    property_id = request.asset_id(),
                    tx_hash = ?e.tx_hash(),
                    "Gas may have been spent; inspect the deployment record"
                );
            }
            return Ok(output::emit_deployment(json, result, output::print_suite));
        }

        Command::TokenAddress { salt } => {
            let orchestrator = orchestrator(&config)?;
            let address = orchestrator
                .get_token_address(&salt)
                .await?
                .with_context(|| format!("No deployed suite with salt {salt}"))?;
            output::emit(json, &address, |address| println!("{address}"));
        }

        Command::Deployment { property_id } => {
            let orchestrator = orchestrator(&config)?;
            let record = orchestrator
                .get_deployment(&property_id)
                .await?
                .with_context(|| format!("No deployment recorded for {property_id}"))?;
            output::emit(json, &record, output::print_record);
        }

        Command::List => {
            let orchestrator = orchestrator(&config)?;
            let records = orchestrator.list_deployments().await?;
            output::emit(json, &records, |records| output::print_table(records));
        }

        Command::Reconcile { property_id, watch } => {
            let orchestrator = orchestrator(&config)?;
            match property_id {
                Some(property_id) => {
                    let result = orchestrator.reconcile(&property_id).await;
                    output::emit_result(json, result, output::print_record)?;
                }
                None => reconcile_loop(&orchestrator, watch, json).await?,
            }
        }

        Command::Config => {
            if json {
                output::emit(json, &config, |_| {});
            } else {
                let rendered =
                    toml::to_string_pretty(&config).context("Failed to render configuration")?;
                print!("{rendered}");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn read_request(path: &Path) -> Result<DeploymentRequest> {
    let content = tokio::fs::read_to_string(path)
        .await
        .context(format!("Failed to read request from {}", path.display()))?;
    serde_json::from_str(&content).context(format!(
        "Failed to parse deployment request {}",
        path.display()
    ))
}

fn orchestrator(config: &SuiteConfig) -> Result<Orchestrator> {
    let factory = config.factory_address.context(
        "No factory address configured. Set factory_address in Tokensuite.toml, \
         TOKENSUITE_FACTORY_ADDRESS or --factory",
    )?;
    let chain =
        JsonRpcChainClient::from_config(config).context("Failed to create the chain client")?;

    Ok(SuiteOrchestrator::new(
        chain,
        FileDeploymentStore::new(&config.store_path),
        factory,
        config.gas_defaults(),
    ))
}

async fn reconcile_loop(orchestrator: &Orchestrator, watch: Option<u64>, json: bool) -> Result<()> {
    loop {
        let report = orchestrator.reconcile_all().await?;
        let done = report.still_failed.is_empty();
        output::emit(json, &report, output::print_report);

        let Some(secs) = watch else {
            return Ok(());
        };
        if done {
            tracing::info!("No unresolved deployments left");
            return Ok(());
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping reconciliation");
                return Ok(());
            }
        }
    }
}

