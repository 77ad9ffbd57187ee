//! # Deploy Subcommand
//!
//! Deploys a configuration onto a fresh in-memory ledger and prints the
//! resulting component addresses as JSON. Useful for checking a
//! configuration before handing it to anything long-lived.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use dcns_core::EventRecord;
use dcns_ledger::{Deployment, DeploymentConfig, Ledger};

use crate::load_config;

/// Arguments for the `dcns deploy` subcommand.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Include every deployment event in the output.
    #[arg(long)]
    pub events: bool,
}

/// What `dcns deploy` prints.
#[derive(Debug, Serialize)]
pub struct DeploySummary {
    pub deployment: Deployment,
    pub genesis: String,
    pub event_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventRecord>>,
}

/// Deploy `config` and summarize the result.
pub fn summarize(config: &DeploymentConfig, include_events: bool) -> Result<DeploySummary> {
    let ledger = Ledger::deploy(config)?;
    Ok(DeploySummary {
        deployment: ledger.deployment().clone(),
        genesis: ledger.now().to_iso8601(),
        event_count: ledger.log().len(),
        events: include_events.then(|| ledger.log().to_vec()),
    })
}

/// Execute the deploy subcommand.
pub fn run_deploy(args: &DeployArgs, config: Option<&Path>) -> Result<u8> {
    let config = load_config(config)?.context("deploy requires --config <FILE>")?;
    let summary = summarize(&config, args.events)?;
    tracing::info!(
        controller = %summary.deployment.controller,
        events = summary.event_count,
        "deployment succeeded"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcns_core::Address;

    #[test]
    fn test_summary_without_events() {
        let config = DeploymentConfig::new(Address::new([1; 20]));
        let summary = summarize(&config, false).unwrap();
        assert!(summary.events.is_none());
        assert!(summary.event_count > 0);
        assert_eq!(summary.deployment.tld, "dc");
        assert_eq!(summary.genesis, "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_summary_with_events() {
        let mut config = DeploymentConfig::new(Address::new([1; 20]));
        config.reverse_registrar = false;
        let summary = summarize(&config, true).unwrap();
        assert!(summary.deployment.reverse_registrar.is_none());
        assert_eq!(summary.events.unwrap().len(), summary.event_count);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        assert!(run_deploy(&DeployArgs { events: false }, None).is_err());
    }
}
