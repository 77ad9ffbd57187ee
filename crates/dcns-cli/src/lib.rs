//! # dcns-cli: Command-Line Interface for DcNS
//!
//! Provides the `dcns` binary: offline helpers for the naming scheme and a
//! dry-run deployer for ledger configurations.
//!
//! ## Subcommands
//!
//! - `dcns name`: namehash, label hash, reverse node and label validity.
//! - `dcns price`: rent quote for a label and duration.
//! - `dcns deploy`: deploy a configuration and print the wiring.
//!
//! ```bash
//! dcns name hash newname.dc
//! dcns name valid newname 🐈 a
//! dcns --config deploy.yaml price abc --duration 31536000
//! dcns --config deploy.yaml deploy --events
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives next to its handler; handlers return the
//!   process exit code.
//! - Handlers delegate to the domain crates. No protocol logic here.

pub mod deploy;
pub mod name;
pub mod price;

use std::path::Path;

use anyhow::{Context, Result};

use dcns_ledger::DeploymentConfig;

/// Load the deployment configuration at `path`, if one was given.
pub fn load_config(path: Option<&Path>) -> Result<Option<DeploymentConfig>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let config = DeploymentConfig::load(path)
        .with_context(|| format!("loading configuration {}", path.display()))?;
    tracing::debug!(path = %path.display(), tld = %config.tld, "configuration loaded");
    Ok(Some(config))
}
