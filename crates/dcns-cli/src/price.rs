//! # Price Subcommand
//!
//! Rent quotes from the oracle's tier table: the configured one when
//! `--config` is given, the default tiers otherwise.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use dcns_core::{Address, Wei};
use dcns_registrar::{grapheme_len, PriceOracle, DEFAULT_TIERS};

use crate::load_config;

const YEAR_SECS: u64 = 365 * 24 * 60 * 60;

/// Arguments for the `dcns price` subcommand.
#[derive(Args, Debug)]
pub struct PriceArgs {
    /// Label to quote.
    pub label: String,

    /// Registration duration in seconds.
    #[arg(long, default_value_t = YEAR_SECS)]
    pub duration: u64,
}

/// A rent quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub label: String,
    /// Length in grapheme clusters.
    pub length: usize,
    pub duration_secs: u64,
    /// Per-second rate applied, as a decimal string.
    pub rate: String,
    /// Total rent, as a decimal string.
    pub price: String,
}

/// Quote `label` for `duration_secs` against `tiers`.
pub fn quote(tiers: Vec<Wei>, label: &str, duration_secs: u64) -> Result<Quote> {
    let oracle = PriceOracle::new(Address::ZERO, Address::ZERO, tiers)?;
    let length = grapheme_len(label);
    let price = oracle.price(label, duration_secs)?;
    let rate = oracle.rate_for_length(length)?;
    Ok(Quote {
        label: label.to_string(),
        length,
        duration_secs,
        rate: rate.to_string(),
        price: price.to_string(),
    })
}

/// Execute the price subcommand.
pub fn run_price(args: &PriceArgs, config: Option<&Path>) -> Result<u8> {
    let tiers = match load_config(config)? {
        Some(config) => config.price_tiers,
        None => DEFAULT_TIERS.to_vec(),
    };
    let quote = quote(tiers, &args.label, args.duration)?;
    println!("{}", serde_json::to_string_pretty(&quote)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_default_tiers() {
        let q = quote(DEFAULT_TIERS.to_vec(), "aaa", YEAR_SECS).unwrap();
        assert_eq!(q.length, 3);
        assert_eq!(q.rate, "234496672381308");
        assert_eq!(q.price, "7395087060216929088000");
    }

    #[test]
    fn test_long_labels_use_last_tier() {
        let q = quote(vec![10, 5, 1], "longname", 100).unwrap();
        assert_eq!(q.rate, "1");
        assert_eq!(q.price, "100");
    }

    #[test]
    fn test_empty_label_has_no_quote() {
        assert!(quote(DEFAULT_TIERS.to_vec(), "", YEAR_SECS).is_err());
    }
}
