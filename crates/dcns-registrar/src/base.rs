//! # Label Registrar
//!
//! Owns one top-level node (e.g. `dc`) in the registry and leases the labels
//! beneath it. Each lease is a [`Registration`] keyed by the label hash,
//! held in a table of its own; the registry subnode is only synced on
//! registration and on an explicit [`LabelRegistrar::reclaim`].
//!
//! ## States
//!
//! ```text
//!                 register                expires            expires + grace
//! Unregistered ──────────────▶ Live ──────────────▶ Grace ──────────────▶ Unregistered
//!                               ▲                     │
//!                               └─────── renew ───────┘
//! ```
//!
//! - `Live` while `now < expires`. Owner queries and transfers work.
//! - `Grace` while `expires <= now <= expires + grace`. Only renewal works.
//! - `Unregistered` afterwards, or if never registered. Fresh registration
//!   works.
//!
//! ## Authorization
//!
//! | Operation | Caller |
//! |---|---|
//! | `register`, `register_only`, `renew` | controller |
//! | `add_controller`, `remove_controller`, `set_resolver` | administrator |
//! | `reclaim`, `transfer_from` | owner, approved account, or owner's operator |

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use dcns_core::{
    Address, Contract, ControllerSet, DcnsError, Env, Event, LabelHash, Node, OperatorApprovals,
    Ownership, Timestamp,
};
use dcns_registry::NodeRegistry;

/// Renewal window after expiry: 90 days.
pub const GRACE_PERIOD_SECS: u64 = 90 * 24 * 60 * 60;

// ─── Registration ────────────────────────────────────────────────────

/// Where a label stands relative to its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationState {
    /// Never registered, or lapsed past the grace period.
    Unregistered,
    /// Registered and not yet expired.
    Live,
    /// Expired, still renewable.
    Grace,
}

impl RegistrationState {
    /// Whether a fresh registration is allowed.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Unregistered)
    }

    /// Whether a renewal is allowed.
    pub fn is_renewable(&self) -> bool {
        matches!(self, Self::Live | Self::Grace)
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unregistered => "UNREGISTERED",
            Self::Live => "LIVE",
            Self::Grace => "GRACE",
        };
        f.write_str(s)
    }
}

/// A lease on one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Current holder of the lease.
    pub owner: Address,
    /// Moment the lease stops being live.
    pub expires: Timestamp,
}

// ─── Registrar ───────────────────────────────────────────────────────

/// Expiring leases on the labels under one top-level node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRegistrar {
    address: Address,
    registry: Address,
    base_node: Node,
    tld: String,
    grace_period_secs: u64,
    ownership: Ownership,
    controllers: ControllerSet,
    registrations: BTreeMap<LabelHash, Registration>,
    token_approvals: BTreeMap<LabelHash, Address>,
    operators: OperatorApprovals,
}

impl Contract for LabelRegistrar {
    fn address(&self) -> Address {
        self.address
    }
}

impl LabelRegistrar {
    /// Deploy a registrar for `tld`, whose node in `registry` is
    /// `namehash(tld)`.
    pub fn new(address: Address, admin: Address, registry: Address, tld: impl Into<String>) -> Self {
        let tld = tld.into();
        Self {
            address,
            registry,
            base_node: Node::namehash(&tld),
            tld,
            grace_period_secs: GRACE_PERIOD_SECS,
            ownership: Ownership::new(admin),
            controllers: ControllerSet::new(),
            registrations: BTreeMap::new(),
            token_approvals: BTreeMap::new(),
            operators: OperatorApprovals::new(),
        }
    }

    /// Override the grace period.
    pub fn with_grace_period(mut self, secs: u64) -> Self {
        self.grace_period_secs = secs;
        self
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// The top-level node this registrar leases labels under.
    pub fn base_node(&self) -> Node {
        self.base_node
    }

    /// The top-level label, e.g. `dc`.
    pub fn tld(&self) -> &str {
        &self.tld
    }

    /// Seconds a lapsed registration stays reserved for renewal.
    pub fn grace_period_secs(&self) -> u64 {
        self.grace_period_secs
    }

    /// Administrator record.
    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    /// Whether `account` may register and renew.
    pub fn is_controller(&self, account: Address) -> bool {
        self.controllers.contains(account)
    }

    /// The raw registration of `id`, expired or not.
    pub fn registration(&self, id: LabelHash) -> Option<&Registration> {
        self.registrations.get(&id)
    }

    /// Expiry of `id`, or `None` if it was never registered.
    pub fn name_expires(&self, id: LabelHash) -> Option<Timestamp> {
        self.registrations.get(&id).map(|r| r.expires)
    }

    /// Lifecycle state of `id` at `now`.
    pub fn state(&self, id: LabelHash, now: Timestamp) -> RegistrationState {
        let Some(reg) = self.registrations.get(&id) else {
            return RegistrationState::Unregistered;
        };
        let now = now.epoch_secs();
        let expires = reg.expires.epoch_secs();
        if now < expires {
            RegistrationState::Live
        } else if now <= expires.saturating_add(self.grace_period_secs) {
            RegistrationState::Grace
        } else {
            RegistrationState::Unregistered
        }
    }

    /// Whether `id` can be freshly registered at `now`.
    pub fn available(&self, id: LabelHash, now: Timestamp) -> bool {
        self.state(id, now).is_available()
    }

    /// Owner of a live registration.
    pub fn owner_of(&self, id: LabelHash, now: Timestamp) -> Result<Address, DcnsError> {
        match (self.registrations.get(&id), self.state(id, now)) {
            (Some(reg), RegistrationState::Live) => Ok(reg.owner),
            (_, state) => Err(DcnsError::conflict(
                "owner query",
                format!("label {id} is {state}"),
            )),
        }
    }

    /// Account approved for `id`, or zero.
    pub fn get_approved(&self, id: LabelHash) -> Address {
        self.token_approvals.get(&id).copied().unwrap_or(Address::ZERO)
    }

    /// Whether `owner` approved `operator` for all its registrations.
    pub fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.operators.is_approved_for_all(owner, operator)
    }

    /// Whether `spender` may move or reclaim `id` at `now`.
    pub fn is_approved_or_owner(&self, spender: Address, id: LabelHash, now: Timestamp) -> bool {
        match self.owner_of(id, now) {
            Ok(owner) => {
                spender == owner
                    || self.get_approved(id) == spender
                    || self.is_approved_for_all(owner, spender)
            }
            Err(_) => false,
        }
    }

    /// Whether this registrar owns its base node in `registry`.
    pub fn live(&self, registry: &NodeRegistry) -> bool {
        registry.owner(self.base_node) == self.address
    }

    // ── Controller operations ───────────────────────────────────────

    /// Lease `id` to `owner` for `duration_secs` and, when the registrar
    /// owns its base node, assign the registry subnode as well.
    pub fn register(
        &mut self,
        env: &mut Env,
        registry: &mut NodeRegistry,
        caller: Address,
        id: LabelHash,
        owner: Address,
        duration_secs: u64,
    ) -> Result<Timestamp, DcnsError> {
        self.check_registry(registry, "register")?;
        let expires = self.lease(env, caller, id, owner, duration_secs)?;
        if self.live(registry) {
            registry.set_subnode_owner(env, self.address, self.base_node, id, owner)?;
        }
        Ok(expires)
    }

    /// Lease `id` without touching the registry.
    pub fn register_only(
        &mut self,
        env: &mut Env,
        caller: Address,
        id: LabelHash,
        owner: Address,
        duration_secs: u64,
    ) -> Result<Timestamp, DcnsError> {
        self.lease(env, caller, id, owner, duration_secs)
    }

    /// Extend the lease on `id` by `duration_secs`.
    pub fn renew(
        &mut self,
        env: &mut Env,
        caller: Address,
        id: LabelHash,
        duration_secs: u64,
    ) -> Result<Timestamp, DcnsError> {
        self.require_controller(caller, "renew")?;
        let state = self.state(id, env.now());
        let Some(reg) = self.registrations.get(&id).copied() else {
            return Err(DcnsError::conflict("renew", format!("label {id} was never registered")));
        };
        if !state.is_renewable() {
            return Err(DcnsError::conflict(
                "renew",
                format!("label {id} lapsed past its grace period"),
            ));
        }
        let expires = reg.expires.checked_add_secs(duration_secs)?;
        expires.checked_add_secs(self.grace_period_secs)?;
        self.registrations.insert(id, Registration { expires, ..reg });
        tracing::info!(%id, %expires, "registration renewed");
        env.emit(self.address, Event::RegistrationRenewed { id, expires });
        Ok(expires)
    }

    // ── Holder operations ───────────────────────────────────────────

    /// Sync the registry subnode of `id` to `owner`.
    pub fn reclaim(
        &mut self,
        env: &mut Env,
        registry: &mut NodeRegistry,
        caller: Address,
        id: LabelHash,
        owner: Address,
    ) -> Result<(), DcnsError> {
        self.check_registry(registry, "reclaim")?;
        if !self.live(registry) {
            return Err(DcnsError::conflict(
                "reclaim",
                format!("registrar does not own {}", self.tld),
            ));
        }
        if !self.is_approved_or_owner(caller, id, env.now()) {
            return Err(DcnsError::unauthorized(caller, format!("reclaim label {id}")));
        }
        registry.set_subnode_owner(env, self.address, self.base_node, id, owner)?;
        Ok(())
    }

    /// Move the registration of `id` from `from` to `to`. The registry is
    /// left alone.
    pub fn transfer_from(
        &mut self,
        env: &mut Env,
        caller: Address,
        from: Address,
        to: Address,
        id: LabelHash,
    ) -> Result<(), DcnsError> {
        let now = env.now();
        if !self.is_approved_or_owner(caller, id, now) {
            return Err(DcnsError::unauthorized(caller, format!("transfer label {id}")));
        }
        let owner = self.owner_of(id, now)?;
        if owner != from {
            return Err(DcnsError::conflict(
                "transfer",
                format!("label {id} is held by {owner}, not {from}"),
            ));
        }
        if to.is_zero() {
            return Err(DcnsError::InvalidInput(
                "cannot transfer to the zero address".to_string(),
            ));
        }
        self.token_approvals.remove(&id);
        if let Some(reg) = self.registrations.get_mut(&id) {
            reg.owner = to;
        }
        tracing::debug!(%id, %from, %to, "registration transferred");
        env.emit(self.address, Event::RegistrationTransferred { id, from, to });
        Ok(())
    }

    /// Approve `to` for `id`. Owner or operator only.
    pub fn approve(
        &mut self,
        env: &mut Env,
        caller: Address,
        to: Address,
        id: LabelHash,
    ) -> Result<(), DcnsError> {
        let owner = self.owner_of(id, env.now())?;
        if to == owner {
            return Err(DcnsError::InvalidInput(
                "approval to current owner".to_string(),
            ));
        }
        if caller != owner && !self.is_approved_for_all(owner, caller) {
            return Err(DcnsError::unauthorized(caller, format!("approve label {id}")));
        }
        self.token_approvals.insert(id, to);
        env.emit(
            self.address,
            Event::RegistrationApproval {
                id,
                owner,
                approved: to,
            },
        );
        Ok(())
    }

    /// Grant or revoke `operator` over all of `caller`'s registrations.
    pub fn set_approval_for_all(
        &mut self,
        env: &mut Env,
        caller: Address,
        operator: Address,
        approved: bool,
    ) -> Result<(), DcnsError> {
        self.operators
            .set_approval_for_all(env, self.address, caller, operator, approved)
    }

    // ── Administration ──────────────────────────────────────────────

    /// Authorize `controller` to register and renew.
    pub fn add_controller(
        &mut self,
        env: &mut Env,
        caller: Address,
        controller: Address,
    ) -> Result<(), DcnsError> {
        self.ownership.require_owner(caller, "add controller")?;
        self.controllers.set(controller, true);
        env.emit(self.address, Event::ControllerAdded { controller });
        Ok(())
    }

    /// Revoke `controller`.
    pub fn remove_controller(
        &mut self,
        env: &mut Env,
        caller: Address,
        controller: Address,
    ) -> Result<(), DcnsError> {
        self.ownership.require_owner(caller, "remove controller")?;
        self.controllers.set(controller, false);
        env.emit(self.address, Event::ControllerRemoved { controller });
        Ok(())
    }

    /// Set the resolver of the registrar's own base node.
    pub fn set_resolver(
        &mut self,
        env: &mut Env,
        registry: &mut NodeRegistry,
        caller: Address,
        resolver: Address,
    ) -> Result<(), DcnsError> {
        self.ownership.require_owner(caller, "set base resolver")?;
        self.check_registry(registry, "set base resolver")?;
        registry.set_resolver(env, self.address, self.base_node, resolver)
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

    // ── Internals ───────────────────────────────────────────────────

    fn check_registry(&self, registry: &NodeRegistry, operation: &str) -> Result<(), DcnsError> {
        if registry.address() == self.registry {
            Ok(())
        } else {
            Err(DcnsError::conflict(
                operation,
                format!("expected registry {}, got {}", self.registry, registry.address()),
            ))
        }
    }

    fn require_controller(&self, caller: Address, action: &str) -> Result<(), DcnsError> {
        if self.controllers.contains(caller) {
            Ok(())
        } else {
            Err(DcnsError::unauthorized(caller, action))
        }
    }

    fn lease(
        &mut self,
        env: &mut Env,
        caller: Address,
        id: LabelHash,
        owner: Address,
        duration_secs: u64,
    ) -> Result<Timestamp, DcnsError> {
        self.require_controller(caller, "register")?;
        let now = env.now();
        let state = self.state(id, now);
        if !state.is_available() {
            return Err(DcnsError::conflict("register", format!("label {id} is {state}")));
        }
        if owner.is_zero() {
            return Err(DcnsError::InvalidInput(
                "cannot register to the zero address".to_string(),
            ));
        }
        let expires = now.checked_add_secs(duration_secs)?;
        expires.checked_add_secs(self.grace_period_secs)?;

        self.token_approvals.remove(&id);
        self.registrations.insert(id, Registration { owner, expires });
        tracing::info!(%id, %owner, %expires, "label registered");
        env.emit(
            self.address,
            Event::RegistrationCreated { id, owner, expires },
        );
        Ok(expires)
    }
}
