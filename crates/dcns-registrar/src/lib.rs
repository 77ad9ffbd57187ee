//! # dcns-registrar: Registration Layer
//!
//! Everything between a user asking for `newname.dc` and the registry
//! recording it.
//!
//! - **Label validity** (`label.rs`): grapheme segmentation and the default
//!   validity rule. Label length for pricing is counted in clusters.
//!
//! - **PriceOracle** (`oracle.rs`): per-second rent by label length.
//!
//! - **LabelRegistrar** (`base.rs`): expiring, transferable leases on the
//!   labels under one top-level node, with a grace period for renewal.
//!
//! - **MetadataDatastore** (`datastore.rs`): per-token name metadata for
//!   indexers.
//!
//! - **RegistrationController** (`controller.rs`): takes payment and wires a
//!   registration through every other component.
//!
//! ## Crate Policy
//!
//! - Components hold collaborator addresses, never references. The caller
//!   supplies the instances per call, and the component checks they are the
//!   bound ones.
//! - A rejected call leaves no partial effect once the ledger restores its
//!   snapshot. Within this crate, checks run before writes where possible.

pub mod base;
pub mod controller;
pub mod datastore;
pub mod label;
pub mod oracle;

pub use base::{LabelRegistrar, Registration, RegistrationState, GRACE_PERIOD_SECS};
pub use controller::{ControllerDeps, RegistrationController, MIN_REGISTRATION_DURATION_SECS};
pub use datastore::{MetadataDatastore, MetadataRecord};
pub use label::{grapheme_len, graphemes, is_valid_label, LabelRule};
pub use oracle::{PriceOracle, DEFAULT_TIERS};
