//! Ledger error types.
//!
//! Operation failures stay [`DcnsError`]. Loading a deployment
//! configuration and wiring the deployment have their own errors, carrying
//! the file path where there is one.

use std::path::PathBuf;

use thiserror::Error;

use dcns_core::DcnsError;

/// Errors loading or validating a [`DeploymentConfig`](crate::DeploymentConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parsing failed.
    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing failed.
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration parsed but is not deployable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors deploying a ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A wiring step was rejected.
    #[error("deployment failed: {0}")]
    Deploy(#[from] DcnsError),
}
