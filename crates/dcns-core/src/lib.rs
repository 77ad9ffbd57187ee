//! # dcns-core: Foundational Types for the DcNS Naming Protocol
//!
//! This crate is the bedrock of the DcNS workspace. It defines the primitive
//! types every component shares. Every other crate in the workspace depends on
//! `dcns-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifier namespaces.** `Address`, `Node` and
//!    `LabelHash` are distinct types. A label hash cannot be passed where a
//!    node is expected, even though both are 32 bytes.
//!
//! 2. **One hashing path.** Every node and label identifier is produced by
//!    [`keccak256`], through [`LabelHash::of`], [`Node::child`] or
//!    [`Node::namehash`].
//!
//! 3. **One error taxonomy.** [`DcnsError`] has one variant per rejection
//!    class. Every mutating operation in the workspace returns it.
//!
//! 4. **Explicit context.** Operations receive the calling account and an
//!    [`Env`] (block time plus event buffer) as arguments. There is no ambient
//!    "current sender".
//!
//! ## Crate Policy
//!
//! - No dependencies on other `dcns-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod access;
pub mod address;
pub mod env;
pub mod error;
pub mod event;
pub mod funds;
pub mod hash;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use access::{Contract, ContractDirectory, ControllerSet, OperatorApprovals, Ownership};
pub use address::Address;
pub use env::Env;
pub use error::DcnsError;
pub use event::{Event, EventRecord};
pub use funds::{Funds, Wei};
pub use hash::{keccak256, LabelHash, Node};
pub use temporal::Timestamp;
