//! # Price Oracle
//!
//! Rent is quoted per second from a tier table indexed by label length.
//! Tier `i` (zero-based) applies to labels of `i + 1` grapheme clusters;
//! labels longer than the table collapse onto the last tier:
//!
//! ```text
//! price(label, d) = tiers[min(len(label), tiers.len()) - 1] * d
//! ```
//!
//! Quotes are pure. Replacing the table only affects later quotes.

use serde::{Deserialize, Serialize};

use dcns_core::{Address, Contract, DcnsError, Env, Event, Ownership, Wei};

use crate::label::grapheme_len;

/// Default per-second rent by label length (1 through 5+).
pub const DEFAULT_TIERS: [Wei; 5] = [0, 0, 234_496_672_381_308, 58_624_168_095_327, 7_288_410_087_527];

/// Length-tiered rent table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceOracle {
    address: Address,
    ownership: Ownership,
    tiers: Vec<Wei>,
}

impl Contract for PriceOracle {
    fn address(&self) -> Address {
        self.address
    }
}

impl PriceOracle {
    /// Deploy with an initial table. An empty table is rejected.
    pub fn new(address: Address, admin: Address, tiers: Vec<Wei>) -> Result<Self, DcnsError> {
        check_tiers(&tiers)?;
        Ok(Self {
            address,
            ownership: Ownership::new(admin),
            tiers,
        })
    }

    /// Administrator record.
    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    /// The current per-second rent table.
    pub fn tiers(&self) -> &[Wei] {
        &self.tiers
    }

    /// Per-second rent for a label of `len` grapheme clusters.
    pub fn rate_for_length(&self, len: usize) -> Result<Wei, DcnsError> {
        if len == 0 {
            return Err(DcnsError::InvalidInput("cannot price an empty label".to_string()));
        }
        let index = len.min(self.tiers.len()) - 1;
        self.tiers
            .get(index)
            .copied()
            .ok_or_else(|| DcnsError::InvalidInput("price table is empty".to_string()))
    }

    /// Rent for holding `label` for `duration_secs` seconds.
    pub fn price(&self, label: &str, duration_secs: u64) -> Result<Wei, DcnsError> {
        let rate = self.rate_for_length(grapheme_len(label))?;
        rate.checked_mul(Wei::from(duration_secs)).ok_or_else(|| {
            DcnsError::InvalidInput(format!(
                "price of {label:?} for {duration_secs}s overflows"
            ))
        })
    }

    /// Replace the table. Administrator-only.
    pub fn set_prices(
        &mut self,
        env: &mut Env,
        caller: Address,
        tiers: Vec<Wei>,
    ) -> Result<(), DcnsError> {
        self.ownership.require_owner(caller, "set prices")?;
        check_tiers(&tiers)?;
        tracing::info!(tiers = tiers.len(), "price table replaced");
        self.tiers = tiers.clone();
        env.emit(self.address, Event::PricesChanged { tiers });
        Ok(())
    }

    /// Hand administration to another account.
    pub fn transfer_ownership(
        &mut self,
        env: &mut Env,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), DcnsError> {
        self.ownership
            .transfer_ownership(env, self.address, caller, new_owner)
    }
}

fn check_tiers(tiers: &[Wei]) -> Result<(), DcnsError> {
    if tiers.is_empty() {
        Err(DcnsError::InvalidInput("price table must have at least one tier".to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcns_core::Timestamp;

    const YEAR: u64 = 31_556_951;

    fn account(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn oracle() -> PriceOracle {
        PriceOracle::new(account(0xAA), account(1), DEFAULT_TIERS.to_vec()).unwrap()
    }

    fn env() -> Env {
        Env::new(Timestamp::from_epoch_secs(1_700_000_000).unwrap())
    }

    #[test]
    fn test_tiered_prices() {
        let oracle = oracle();
        assert_eq!(oracle.price("a", YEAR).unwrap(), 0);
        assert_eq!(oracle.price("aa", YEAR).unwrap(), 0);
        assert_eq!(oracle.price("aaa", YEAR).unwrap(), 7_399_999_999_999_989_871_908);
        assert_eq!(oracle.price("aaaa", YEAR).unwrap(), 1_849_999_999_999_997_467_977);
        assert_eq!(oracle.price("aaaaa", YEAR).unwrap(), 229_999_999_999_995_250_177);
        assert_eq!(oracle.price("aaaaaa", YEAR).unwrap(), 229_999_999_999_995_250_177);
    }

    #[test]
    fn test_length_counts_graphemes() {
        let oracle = oracle();
        // Three CJK clusters price like "aaa", not like nine bytes.
        assert_eq!(
            oracle.price("\u{4f60}\u{597d}\u{5417}", YEAR).unwrap(),
            oracle.price("aaa", YEAR).unwrap()
        );
    }

    #[test]
    fn test_empty_label_rejected() {
        assert!(matches!(
            oracle().price("", YEAR),
            Err(DcnsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_overflow_rejected() {
        let oracle = PriceOracle::new(account(0xAA), account(1), vec![Wei::MAX]).unwrap();
        assert!(matches!(
            oracle.price("a", 2),
            Err(DcnsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_only_admin_sets_prices() {
        let mut oracle = oracle();
        let mut env = env();
        assert!(matches!(
            oracle.set_prices(&mut env, account(2), vec![]),
            Err(DcnsError::Unauthorized { .. })
        ));
        assert!(matches!(
            oracle.set_prices(&mut env, account(1), vec![]),
            Err(DcnsError::InvalidInput(_))
        ));
        oracle.set_prices(&mut env, account(1), vec![5, 3]).unwrap();
        assert_eq!(oracle.price("abcdef", 10).unwrap(), 30);
        assert_eq!(env.events().len(), 1);
        assert_eq!(env.events()[0].event.name(), "prices_changed");
    }

    #[test]
    fn test_empty_table_rejected_at_deploy() {
        assert!(PriceOracle::new(account(0xAA), account(1), vec![]).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn price_is_monotonic_in_duration(
                label in "[a-z]{1,12}",
                d1 in 0u64..=10_000_000_000,
                d2 in 0u64..=10_000_000_000,
            ) {
                let oracle = oracle();
                let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
                prop_assert!(oracle.price(&label, lo).unwrap() <= oracle.price(&label, hi).unwrap());
            }

            #[test]
            fn long_labels_use_last_tier(label in "[a-z]{5,40}", d in 0u64..=10_000_000_000) {
                let oracle = oracle();
                prop_assert_eq!(oracle.price(&label, d).unwrap(), DEFAULT_TIERS[4] * Wei::from(d));
            }
        }
    }
}
