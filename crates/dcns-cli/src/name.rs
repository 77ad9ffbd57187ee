//! # Name Subcommand
//!
//! Offline helpers over the naming scheme: hashes, reverse nodes and the
//! label validity rule used by the registration controller.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use dcns_core::{Address, LabelHash, Node};
use dcns_registrar::{grapheme_len, is_valid_label};
use dcns_registry::ReverseRegistrar;

/// Arguments for the `dcns name` subcommand.
#[derive(Args, Debug)]
pub struct NameArgs {
    #[command(subcommand)]
    pub command: NameCommand,
}

#[derive(Subcommand, Debug)]
pub enum NameCommand {
    /// Print the node of a dotted name (empty string for the root).
    Hash {
        /// Name such as `newname.dc`.
        name: String,
    },

    /// Print the hash of a single label.
    Label {
        /// A single label, without dots.
        label: String,
    },

    /// Print the reverse node of an account.
    Reverse {
        /// Account address, `0x` followed by 40 hex digits.
        address: Address,
    },

    /// Check labels against the registration rule.
    ///
    /// Exits with status 2 when any label is invalid.
    Valid {
        #[arg(required = true)]
        labels: Vec<String>,
    },
}

/// Validity verdict for one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelReport {
    pub label: String,
    /// Length in grapheme clusters.
    pub length: usize,
    pub valid: bool,
}

impl LabelReport {
    pub fn of(label: &str) -> Self {
        Self {
            label: label.to_string(),
            length: grapheme_len(label),
            valid: is_valid_label(label),
        }
    }
}

/// Execute the name subcommand.
pub fn run_name(args: &NameArgs) -> Result<u8> {
    match &args.command {
        NameCommand::Hash { name } => {
            println!("{}", Node::namehash(name));
            Ok(0)
        }
        NameCommand::Label { label } => {
            if label.contains('.') {
                anyhow::bail!("{label:?} contains a dot; use `dcns name hash` for dotted names");
            }
            println!("{}", LabelHash::of(label));
            Ok(0)
        }
        NameCommand::Reverse { address } => {
            println!("{}", ReverseRegistrar::node(*address));
            Ok(0)
        }
        NameCommand::Valid { labels } => {
            let reports: Vec<LabelReport> = labels.iter().map(|l| LabelReport::of(l)).collect();
            for report in &reports {
                let verdict = if report.valid { "valid" } else { "INVALID" };
                println!("{}\t{}\t{}", report.label, report.length, verdict);
            }
            let invalid = reports.iter().filter(|r| !r.valid).count();
            if invalid > 0 {
                tracing::warn!(invalid, "labels failed validation");
                return Ok(2);
            }
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_report_counts_clusters() {
        let report = LabelReport::of("🏴‍☠️");
        assert_eq!(report.length, 1);
        assert!(!report.valid);

        let report = LabelReport::of("newname");
        assert_eq!(report.length, 7);
        assert!(report.valid);
    }

    #[test]
    fn test_valid_exit_codes() {
        let ok = NameArgs {
            command: NameCommand::Valid {
                labels: vec!["abc".to_string(), "é".to_string()],
            },
        };
        assert_eq!(run_name(&ok).unwrap(), 0);

        let bad = NameArgs {
            command: NameCommand::Valid {
                labels: vec!["abc".to_string(), String::new()],
            },
        };
        assert_eq!(run_name(&bad).unwrap(), 2);
    }

    #[test]
    fn test_dotted_label_rejected() {
        let args = NameArgs {
            command: NameCommand::Label {
                label: "a.b".to_string(),
            },
        };
        assert!(run_name(&args).is_err());
    }
}
