//! # Events
//!
//! Every successful mutating call emits one or more events carrying the
//! changed fields. Events are buffered in the call's [`Env`](crate::Env) and
//! only reach the ledger log when the whole operation commits.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::funds::Wei;
use crate::hash::{LabelHash, Node};
use crate::temporal::Timestamp;

/// A state-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    // ── Registry ────────────────────────────────────────────────────
    /// A subnode was assigned an owner.
    NewOwner {
        node: Node,
        label: LabelHash,
        owner: Address,
    },
    /// A node's owner changed.
    Transfer { node: Node, owner: Address },
    /// A node's resolver changed.
    NewResolver { node: Node, resolver: Address },
    /// A node's TTL changed.
    NewTtl { node: Node, ttl: u64 },
    /// An operator approval was granted or revoked.
    ApprovalForAll {
        owner: Address,
        operator: Address,
        approved: bool,
    },

    // ── Label registrar ─────────────────────────────────────────────
    /// A label was registered (fresh or after lapsing).
    RegistrationCreated {
        id: LabelHash,
        owner: Address,
        expires: Timestamp,
    },
    /// A registration's expiry was extended.
    RegistrationRenewed { id: LabelHash, expires: Timestamp },
    /// Registration ownership moved between accounts.
    RegistrationTransferred {
        id: LabelHash,
        from: Address,
        to: Address,
    },
    /// A per-label approval was set.
    RegistrationApproval {
        id: LabelHash,
        owner: Address,
        approved: Address,
    },
    /// A controller was added to a controller set.
    ControllerAdded { controller: Address },
    /// A controller was removed from a controller set.
    ControllerRemoved { controller: Address },

    // ── Price oracle ────────────────────────────────────────────────
    /// The rent table was replaced.
    PricesChanged { tiers: Vec<Wei> },

    // ── Registration controller ─────────────────────────────────────
    /// A paid registration completed.
    NameRegistered {
        name: String,
        label: LabelHash,
        owner: Address,
        cost: Wei,
        expires: Timestamp,
    },
    /// A paid renewal completed.
    NameRenewed {
        name: String,
        label: LabelHash,
        cost: Wei,
        expires: Timestamp,
    },
    /// The controller was rebound to another price oracle.
    PriceOracleChanged { oracle: Address },
    /// Held funds were paid out to the administrator.
    FundsWithdrawn { to: Address, amount: Wei },

    // ── Resolver ────────────────────────────────────────────────────
    /// An address record was written.
    AddrChanged { node: Node, addr: Address },
    /// A name record was written.
    NameChanged { node: Node, name: String },

    // ── Reverse registrar ───────────────────────────────────────────
    /// A reverse node was claimed.
    ReverseClaimed { addr: Address, node: Node },
    /// A reverse-registrar controller was enabled or disabled.
    ControllerChanged { controller: Address, enabled: bool },
    /// The default resolver for reverse records changed.
    DefaultResolverChanged { resolver: Address },

    // ── Metadata datastore ──────────────────────────────────────────
    /// Metadata record: the bare label.
    NewName { token_id: LabelHash, name: String },
    /// Metadata record: the label hash.
    NewLabelHash { token_id: LabelHash, label: LabelHash },
    /// Metadata record: the full node.
    NewNodeHash { token_id: LabelHash, node: Node },

    // ── Administration ──────────────────────────────────────────────
    /// A component's administrator changed.
    OwnershipTransferred { previous: Address, new: Address },
}

impl Event {
    /// The snake_case event name used in serialized logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewOwner { .. } => "new_owner",
            Self::Transfer { .. } => "transfer",
            Self::NewResolver { .. } => "new_resolver",
            Self::NewTtl { .. } => "new_ttl",
            Self::ApprovalForAll { .. } => "approval_for_all",
            Self::RegistrationCreated { .. } => "registration_created",
            Self::RegistrationRenewed { .. } => "registration_renewed",
            Self::RegistrationTransferred { .. } => "registration_transferred",
            Self::RegistrationApproval { .. } => "registration_approval",
            Self::ControllerAdded { .. } => "controller_added",
            Self::ControllerRemoved { .. } => "controller_removed",
            Self::PricesChanged { .. } => "prices_changed",
            Self::NameRegistered { .. } => "name_registered",
            Self::NameRenewed { .. } => "name_renewed",
            Self::PriceOracleChanged { .. } => "price_oracle_changed",
            Self::FundsWithdrawn { .. } => "funds_withdrawn",
            Self::AddrChanged { .. } => "addr_changed",
            Self::NameChanged { .. } => "name_changed",
            Self::ReverseClaimed { .. } => "reverse_claimed",
            Self::ControllerChanged { .. } => "controller_changed",
            Self::DefaultResolverChanged { .. } => "default_resolver_changed",
            Self::NewName { .. } => "new_name",
            Self::NewLabelHash { .. } => "new_label_hash",
            Self::NewNodeHash { .. } => "new_node_hash",
            Self::OwnershipTransferred { .. } => "ownership_transferred",
        }
    }
}

/// An event together with the component that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Address of the emitting component.
    pub emitter: Address,
    /// The event payload.
    #[serde(flatten)]
    pub event: Event,
}
