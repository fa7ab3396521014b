use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tokensuite_deploy::{SuiteConfig, config::CONFIG_FILENAME};

use crate::cli::ConfigOverrides;

/// Prefix of the environment variables overriding configuration keys.
const ENV_PREFIX: &str = "TOKENSUITE_";

/// Build the effective configuration.
///
/// Later sources win: defaults, the TOML file, `TOKENSUITE_*` variables, CLI flags.
pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<SuiteConfig> {
    let mut figment = Figment::from(Serialized::defaults(SuiteConfig::default()));

    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file does not exist: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }
        None => {
            let default = PathBuf::from(CONFIG_FILENAME);
            if default.exists() {
                tracing::debug!(path = %default.display(), "Using default configuration file");
                figment = figment.merge(Toml::file(default));
            }
        }
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["verbosity", "config", "deployer"]))
        .merge(Serialized::defaults(overrides))
        .extract()
        .context("Failed to load configuration")
}
