//! dexup is a CLI tool to deploy a minimal decentralized exchange to an EVM node in one command.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};

use cli::Cli;
use dexup_deploy::{ArtifactStore, Deployer, DeploymentResult, RpcClient};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = cli.load_config()?;

    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    tracing::info!(
        rpc_url = %config.rpc_url,
        artifacts_dir = %config.artifacts_dir.display(),
        identity = %config.identity,
        "Loaded configuration"
    );

    let client = RpcClient::new(&config.rpc_url)?;
    let chain_id = client
        .chain_id()
        .await
        .with_context(|| format!("Failed to reach node at {}", config.rpc_url))?;
    tracing::info!(chain_id, "Connected to node");

    let contracts = ArtifactStore::new(&config.artifacts_dir);
    let deployer = Deployer::new(config)?;

    let result = match deployer.deploy(&client, &contracts).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(phase = %e.phase(), "Deployment aborted");
            return Err(e.into());
        }
    };

    println!("{}", summary_table(&result));

    Ok(())
}

fn summary_table(result: &DeploymentResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Component"), Cell::new("Address")]);

    table.add_row(vec![
        Cell::new("Deployer"),
        Cell::new(result.identity.to_string()),
    ]);
    for (name, address) in result.addresses() {
        table.add_row(vec![Cell::new(name), Cell::new(address.to_string())]);
    }

    table
}
