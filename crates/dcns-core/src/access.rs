//! # Access Records
//!
//! The capability sets every component builds its authorization predicate
//! from:
//!
//! - [`Ownership`]: the single administrator established at deployment.
//! - [`ControllerSet`]: accounts the administrator granted limited rights.
//! - [`OperatorApprovals`]: owner → operator approvals ("operator-for-all").
//!
//! and the two traits that let components refer to each other:
//!
//! - [`Contract`]: anything deployed at an address.
//! - [`ContractDirectory`]: answers "who owns the contract at this address",
//!   used for contract-owner-by-proxy authorization.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::env::Env;
use crate::error::DcnsError;
use crate::event::Event;

/// A component deployed at a ledger address.
pub trait Contract {
    /// The component's own address (the `caller` it uses for nested calls).
    fn address(&self) -> Address;
}

/// Resolves the owner of a deployed contract.
pub trait ContractDirectory {
    /// The account the contract at `contract` reports as its owner, if the
    /// address is a contract exposing an owner query.
    fn contract_owner(&self, contract: Address) -> Option<Address>;
}

/// Administrator record of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    owner: Address,
}

impl Ownership {
    /// Establish `owner` as administrator (deployment time).
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    /// The current administrator.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Whether `account` is the administrator.
    pub fn is_owner(&self, account: Address) -> bool {
        self.owner == account
    }

    /// Reject any caller other than the administrator.
    pub fn require_owner(&self, caller: Address, action: &str) -> Result<(), DcnsError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(DcnsError::unauthorized(caller, action))
        }
    }

    /// Hand administration to `new_owner`. Administrator-only.
    pub fn transfer_ownership(
        &mut self,
        env: &mut Env,
        emitter: Address,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), DcnsError> {
        self.require_owner(caller, "transfer ownership")?;
        if new_owner.is_zero() {
            return Err(DcnsError::InvalidInput(
                "new administrator is the zero address".to_string(),
            ));
        }
        let previous = self.owner;
        self.owner = new_owner;
        env.emit(emitter, Event::OwnershipTransferred { previous, new: new_owner });
        Ok(())
    }
}

/// Accounts granted controller rights by a component's administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSet {
    controllers: BTreeSet<Address>,
}

impl ControllerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `account` is a controller.
    pub fn contains(&self, account: Address) -> bool {
        self.controllers.contains(&account)
    }

    /// Enable or disable `account`. Returns whether membership changed.
    pub fn set(&mut self, account: Address, enabled: bool) -> bool {
        if enabled {
            self.controllers.insert(account)
        } else {
            self.controllers.remove(&account)
        }
    }

    /// Iterate controllers in address order.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.controllers.iter()
    }
}

/// Owner → operator approvals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorApprovals {
    approvals: BTreeMap<Address, BTreeSet<Address>>,
}

impl OperatorApprovals {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `owner` approved `operator` to act on all its entities.
    pub fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.approvals
            .get(&owner)
            .is_some_and(|ops| ops.contains(&operator))
    }

    /// Grant or revoke `operator` for `owner` and emit `ApprovalForAll`.
    pub fn set_approval_for_all(
        &mut self,
        env: &mut Env,
        emitter: Address,
        owner: Address,
        operator: Address,
        approved: bool,
    ) -> Result<(), DcnsError> {
        if owner == operator {
            return Err(DcnsError::SelfApproval { account: owner });
        }
        if approved {
            self.approvals.entry(owner).or_default().insert(operator);
        } else if let Some(ops) = self.approvals.get_mut(&owner) {
            ops.remove(&operator);
            if ops.is_empty() {
                self.approvals.remove(&owner);
            }
        }
        env.emit(
            emitter,
            Event::ApprovalForAll {
                owner,
                operator,
                approved,
            },
        );
        Ok(())
    }
}
