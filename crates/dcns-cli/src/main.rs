//! # dcns CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dcns_cli::deploy::{run_deploy, DeployArgs};
use dcns_cli::name::{run_name, NameArgs};
use dcns_cli::price::{run_price, PriceArgs};

/// DcNS toolchain.
///
/// Hashes names, checks labels, quotes rent and dry-runs deployments of the
/// DcNS naming protocol.
#[derive(Parser, Debug)]
#[command(name = "dcns", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Deployment configuration (YAML, or JSON with a `.json` extension).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Name hashing and label validation.
    Name(NameArgs),

    /// Quote rent for a label.
    Price(PriceArgs),

    /// Deploy a configuration onto an in-memory ledger.
    Deploy(DeployArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!("dcns CLI starting");

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Name(args) => run_name(args),
        Commands::Price(args) => run_price(args, config),
        Commands::Deploy(args) => run_deploy(args, config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
