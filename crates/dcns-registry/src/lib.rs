//! # dcns-registry: Registry Layer
//!
//! The components that hold the ownership tree and the records hanging off
//! it.
//!
//! - **NodeRegistry** (`registry.rs`): node → (owner, resolver, ttl), with
//!   owner-granted operators. Ownership of a node implies authority over
//!   every subnode created beneath it.
//!
//! - **RecordResolver** (`resolver.rs`): address and name records per node,
//!   writable by whoever the registry currently says owns the node (or that
//!   owner's operators).
//!
//! - **ReverseRegistrar** (`reverse.rs`): owns `addr.reverse` and hands out
//!   one reverse node per account, so accounts can publish a display name.
//!
//! Every mutating operation takes the calling account explicitly and an
//! [`Env`](dcns_core::Env) for block time and events. Nested calls into the
//! registry use the calling component's own address as `caller`.

pub mod registry;
pub mod resolver;
pub mod reverse;

pub use registry::{NodeRecord, NodeRegistry};
pub use resolver::{InterfaceId, RecordResolver};
pub use reverse::{addr_reverse_node, ReverseRegistrar, ADDR_REVERSE_NAME};
