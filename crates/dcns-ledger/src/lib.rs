//! # dcns-ledger: Shared Ledger
//!
//! Hosts one deployment of every DcNS component and executes operations
//! against it one at a time.
//!
//! - **Configuration** (`config.rs`): [`DeploymentConfig`], loaded from YAML
//!   or JSON, with defaults for every tunable.
//! - **Ledger** (`ledger.rs`): deployment wiring, the clock, held funds, the
//!   event log, and [`Ledger::transact`], which restores a snapshot when an
//!   operation fails.
//!
//! ## Example
//!
//! ```
//! use dcns_core::Address;
//! use dcns_ledger::{DeploymentConfig, Ledger};
//!
//! let admin = Address::new([1; 20]);
//! let user = Address::new([2; 20]);
//! let mut config = DeploymentConfig::new(admin);
//! config.balances.insert(user, 10u128.pow(20));
//! let mut ledger = Ledger::deploy(&config).unwrap();
//!
//! let price = ledger.price("newname", 28 * 86_400).unwrap();
//! ledger.register(user, "newname", user, 28 * 86_400, price).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod ledger;

pub use config::{DeploymentConfig, RESERVED_TLDS};
pub use error::{ConfigError, LedgerError};
pub use ledger::{Deployment, Ledger, LedgerState, OwnerDirectory, Receipt};
