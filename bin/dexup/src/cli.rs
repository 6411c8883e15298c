use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser};
use dexup_deploy::{DEXUP_CONFIG_FILENAME, DeployConfig, IdentitySelector};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::Serialize;
use tracing::level_filters::LevelFilter;

/// Prefix of the environment variables overriding the configuration file.
///
/// Nested keys are separated by a double underscore, e.g. `DEXUP_TOKEN_A__NAME`.
const ENV_PREFIX: &str = "DEXUP_";

#[derive(Parser)]
#[command(name = "dexup")]
#[command(
    author,
    version,
    about = "Deploy a token pair, factory and router to an EVM node in one command"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "DEXUP_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a Dexup.toml configuration file.
    ///
    /// If not provided, ./Dexup.toml is used when it exists.
    #[arg(short, long, alias = "conf", env = "DEXUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration as TOML and exit without deploying.
    #[arg(long)]
    pub dump_config: bool,

    #[clap(flatten)]
    pub overrides: ConfigOverrides,
}

/// Command-line values taking precedence over the file and the environment.
#[derive(Debug, Clone, Default, Args, Serialize)]
pub struct ConfigOverrides {
    /// The JSON-RPC endpoint of the node (Hardhat, Anvil, ...).
    #[arg(long, alias = "rpc")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,

    /// The directory holding the compiled contract artifacts.
    #[arg(long, alias = "artifacts")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts_dir: Option<PathBuf>,

    /// The acting identity: an index into the node's accounts or a 0x address.
    #[arg(long, alias = "from")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentitySelector>,

    /// Maximum time, in seconds, to wait for each transaction to be mined.
    #[arg(long, alias = "timeout")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_timeout_secs: Option<u64>,
}

impl Cli {
    /// Resolve the configuration: defaults, then the file, then `DEXUP_*`
    /// environment variables, then command-line overrides.
    pub fn load_config(&self) -> anyhow::Result<DeployConfig> {
        let mut figment = Figment::from(Serialized::defaults(DeployConfig::default()));

        match &self.config {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("Config file {} does not exist", path.display());
                }
                figment = figment.merge(Toml::file(path));
            }
            None => figment = figment.merge(Toml::file(DEXUP_CONFIG_FILENAME)),
        }

        figment
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .split("__")
                    .ignore(&["verbosity", "config", "test_rpc_url"]),
            )
            .merge(Serialized::defaults(&self.overrides))
            .extract()
            .context("Failed to load configuration")
    }
}
