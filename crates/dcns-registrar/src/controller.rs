//! # Registration Controller
//!
//! The paid front door to the label registrar. It validates the label,
//! quotes rent through the price oracle, takes payment and then drives the
//! registrar, registry, resolver, datastore and reverse registrar through
//! one registration.
//!
//! ## Registration with a resolver
//!
//! ```text
//! 1. register the label to the controller itself
//! 2. set the node's resolver
//! 3. set the address record (only if `addr` is non-zero)
//! 4. reclaim the registry node for `owner`
//! 5. transfer the registration to `owner`
//! ```
//!
//! Without a resolver the label is registered straight to `owner`.
//!
//! ## Funds
//!
//! The attached payment moves from the caller to the controller before any
//! registration state is written. Excess payment is kept. Only
//! [`RegistrationController::withdraw`] moves funds out, to the
//! administrator.
//!
//! ## Editions
//!
//! A controller built without a reverse registrar or without a datastore is
//! the reduced edition. Operations that need the missing collaborator fail
//! with [`DcnsError::StateConflict`].

use serde::{Deserialize, Serialize};

use dcns_core::{
    Address, Contract, ContractDirectory, DcnsError, Env, Event, Funds, LabelHash, Ownership,
    Timestamp, Wei,
};
use dcns_registry::{NodeRegistry, RecordResolver, ReverseRegistrar};

use crate::base::LabelRegistrar;
use crate::datastore::MetadataDatastore;
use crate::label::{is_valid_label, LabelRule};
use crate::oracle::PriceOracle;

/// Shortest registration the controller sells: 28 days.
pub const MIN_REGISTRATION_DURATION_SECS: u64 = 28 * 24 * 60 * 60;

/// The collaborators one controller call works against.
///
/// The controller stores only their addresses. Each supplied instance must
/// be the one bound at deployment.
pub struct ControllerDeps<'a> {
    pub registry: &'a mut NodeRegistry,
    pub registrar: &'a mut LabelRegistrar,
    pub oracle: &'a PriceOracle,
    /// The resolver address records are written through. It must also be
    /// the reverse registrar's default resolver for reverse records.
    pub resolver: &'a mut RecordResolver,
    pub reverse: Option<&'a ReverseRegistrar>,
    pub datastore: Option<&'a mut MetadataDatastore>,
    pub funds: &'a mut Funds,
    pub directory: &'a dyn ContractDirectory,
}

fn default_label_rule() -> LabelRule {
    is_valid_label
}

/// Sells and renews registrations for payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationController {
    address: Address,
    ownership: Ownership,
    label_registrar: Address,
    oracle: Address,
    reverse_registrar: Option<Address>,
    datastore: Option<Address>,
    min_duration_secs: u64,
    #[serde(skip, default = "default_label_rule")]
    label_rule: LabelRule,
}

impl Contract for RegistrationController {
    fn address(&self) -> Address {
        self.address
    }
}

struct Request<'l> {
    label: &'l str,
    owner: Address,
    duration_secs: u64,
    resolver: Address,
    addr: Address,
    payment: Wei,
}

impl RegistrationController {
    /// A reduced-edition controller. Attach the optional collaborators with
    /// [`Self::with_reverse_registrar`] and [`Self::with_datastore`].
    pub fn new(address: Address, admin: Address, label_registrar: Address, oracle: Address) -> Self {
        Self {
            address,
            ownership: Ownership::new(admin),
            label_registrar,
            oracle,
            reverse_registrar: None,
            datastore: None,
            min_duration_secs: MIN_REGISTRATION_DURATION_SECS,
            label_rule: is_valid_label,
        }
    }

    /// Record names for registrants through this reverse registrar.
    pub fn with_reverse_registrar(mut self, reverse_registrar: Address) -> Self {
        self.reverse_registrar = Some(reverse_registrar);
        self
    }

    /// Write registration metadata to this datastore.
    pub fn with_datastore(mut self, datastore: Address) -> Self {
        self.datastore = Some(datastore);
        self
    }

    /// Override the shortest accepted registration.
    pub fn with_min_duration(mut self, secs: u64) -> Self {
        self.min_duration_secs = secs;
        self
    }

    /// Replace the label validity rule.
    pub fn with_label_rule(mut self, rule: LabelRule) -> Self {
        self.label_rule = rule;
        self
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Administrator record.
    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    /// The registrar this controller leases labels through.
    pub fn label_registrar(&self) -> Address {
        self.label_registrar
    }

    /// The oracle currently quoting rent.
    pub fn price_oracle(&self) -> Address {
        self.oracle
    }

    /// The wired reverse registrar, if any.
    pub fn reverse_registrar(&self) -> Option<Address> {
        self.reverse_registrar
    }

    /// The wired metadata datastore, if any.
    pub fn datastore(&self) -> Option<Address> {
        self.datastore
    }

    /// Shortest accepted registration, in seconds.
    pub fn min_duration_secs(&self) -> u64 {
        self.min_duration_secs
    }

    /// Whether `label` passes the validity rule.
    pub fn valid(&self, label: &str) -> bool {
        (self.label_rule)(label)
    }

    /// Whether `id` can be registered at `now`.
    pub fn available(&self, registrar: &LabelRegistrar, now: Timestamp, id: LabelHash) -> bool {
        registrar.available(id, now)
    }

    /// Whether `label` is valid and can be registered at `now`.
    pub fn available_name(&self, registrar: &LabelRegistrar, now: Timestamp, label: &str) -> bool {
        self.valid(label) && self.available(registrar, now, LabelHash::of(label))
    }

    /// Rent for `label` over `duration_secs`, from the bound oracle.
    pub fn rent_price(
        &self,
        oracle: &PriceOracle,
        label: &str,
        duration_secs: u64,
    ) -> Result<Wei, DcnsError> {
        check_binding("price oracle", self.oracle, oracle.address())?;
        oracle.price(label, duration_secs)
    }

    // ── Payable operations ──────────────────────────────────────────

    /// Register `label` to `owner` without a resolver.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &self,
        env: &mut Env,
        deps: ControllerDeps<'_>,
        caller: Address,
        label: &str,
        owner: Address,
        duration_secs: u64,
        payment: Wei,
    ) -> Result<Timestamp, DcnsError> {
        let request = Request {
            label,
            owner,
            duration_secs,
            resolver: Address::ZERO,
            addr: Address::ZERO,
            payment,
        };
        self.register_request(env, deps, caller, request, false)
    }

    /// Register `label` to `owner`, pointing the node at `resolver` and,
    /// when `addr` is non-zero, its address record at `addr`.
    #[allow(clippy::too_many_arguments)]
    pub fn register_with_config(
        &self,
        env: &mut Env,
        deps: ControllerDeps<'_>,
        caller: Address,
        label: &str,
        owner: Address,
        duration_secs: u64,
        resolver: Address,
        addr: Address,
        payment: Wei,
    ) -> Result<Timestamp, DcnsError> {
        let request = Request {
            label,
            owner,
            duration_secs,
            resolver,
            addr,
            payment,
        };
        self.register_request(env, deps, caller, request, false)
    }

    /// [`Self::register_with_config`], then name the caller's reverse
    /// record `<label>.<tld>`.
    #[allow(clippy::too_many_arguments)]
    pub fn register_with_reverse_record(
        &self,
        env: &mut Env,
        deps: ControllerDeps<'_>,
        caller: Address,
        label: &str,
        owner: Address,
        duration_secs: u64,
        resolver: Address,
        addr: Address,
        payment: Wei,
    ) -> Result<Timestamp, DcnsError> {
        let request = Request {
            label,
            owner,
            duration_secs,
            resolver,
            addr,
            payment,
        };
        self.register_request(env, deps, caller, request, true)
    }

    /// Extend `label` by `duration_secs`. Anyone may pay.
    pub fn renew(
        &self,
        env: &mut Env,
        deps: ControllerDeps<'_>,
        caller: Address,
        label: &str,
        duration_secs: u64,
        payment: Wei,
    ) -> Result<Timestamp, DcnsError> {
        let ControllerDeps {
            registrar,
            oracle,
            funds,
            ..
        } = deps;
        check_binding("label registrar", self.label_registrar, registrar.address())?;
        check_binding("price oracle", self.oracle, oracle.address())?;

        let cost = oracle.price(label, duration_secs)?;
        if payment < cost {
            return Err(DcnsError::InsufficientPayment {
                required: cost,
                provided: payment,
            });
        }
        funds.transfer(caller, self.address, payment)?;

        let id = LabelHash::of(label);
        let expires = registrar.renew(env, self.address, id, duration_secs)?;
        tracing::info!(label, %expires, cost, "name renewed");
        env.emit(
            self.address,
            Event::NameRenewed {
                name: label.to_string(),
                label: id,
                cost,
                expires,
            },
        );
        Ok(expires)
    }

    // ── Administration ──────────────────────────────────────────────

    /// Pay the controller's whole balance to the administrator.
    pub fn withdraw(&self, env: &mut Env, funds: &mut Funds, caller: Address) -> Result<Wei, DcnsError> {
        self.ownership.require_owner(caller, "withdraw")?;
        let to = self.ownership.owner();
        let amount = funds.balance_of(self.address);
        tracing::info!(%to, amount, "controller funds withdrawn");
        env.emit(self.address, Event::FundsWithdrawn { to, amount });
        funds.transfer(self.address, to, amount)?;
        Ok(amount)
    }

    /// Rebind the controller to another price oracle.
    pub fn set_price_oracle(
        &mut self,
        env: &mut Env,
        caller: Address,
        oracle: Address,
    ) -> Result<(), DcnsError> {
        self.ownership.require_owner(caller, "set price oracle")?;
        if oracle.is_zero() {
            return Err(DcnsError::InvalidInput(
                "price oracle must not be the zero address".to_string(),
            ));
        }
        self.oracle = oracle;
        env.emit(self.address, Event::PriceOracleChanged { oracle });
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

    // ── Internals ───────────────────────────────────────────────────

    fn register_request(
        &self,
        env: &mut Env,
        deps: ControllerDeps<'_>,
        caller: Address,
        req: Request<'_>,
        with_reverse: bool,
    ) -> Result<Timestamp, DcnsError> {
        let ControllerDeps {
            registry,
            registrar,
            oracle,
            resolver,
            reverse,
            datastore,
            funds,
            directory,
        } = deps;
        check_binding("label registrar", self.label_registrar, registrar.address())?;
        check_binding("price oracle", self.oracle, oracle.address())?;

        let label = req.label;
        if !self.valid(label) {
            return Err(DcnsError::InvalidInput(format!("invalid label {label:?}")));
        }
        if req.duration_secs < self.min_duration_secs {
            return Err(DcnsError::InvalidInput(format!(
                "duration {}s is below the minimum of {}s",
                req.duration_secs, self.min_duration_secs
            )));
        }
        let id = LabelHash::of(label);
        if !registrar.available(id, env.now()) {
            return Err(DcnsError::conflict(
                "register",
                format!("{label}.{} is not available", registrar.tld()),
            ));
        }
        let cost = oracle.price(label, req.duration_secs)?;
        if req.payment < cost {
            return Err(DcnsError::InsufficientPayment {
                required: cost,
                provided: req.payment,
            });
        }
        let reverse = if with_reverse {
            if req.resolver.is_zero() {
                return Err(DcnsError::InvalidInput(
                    "a reverse record needs a resolver".to_string(),
                ));
            }
            Some(self.bound_reverse(reverse)?)
        } else {
            None
        };
        let datastore = self.bound_datastore(datastore)?;

        funds.transfer(caller, self.address, req.payment)?;

        let node = registrar.base_node().child(id);
        let expires = if req.resolver.is_zero() {
            registrar.register(env, registry, self.address, id, req.owner, req.duration_secs)?
        } else {
            let expires =
                registrar.register(env, registry, self.address, id, self.address, req.duration_secs)?;
            registry.set_resolver(env, self.address, node, req.resolver)?;
            if !req.addr.is_zero() {
                check_binding("resolver", req.resolver, resolver.address())?;
                resolver.set_addr(env, registry, self.address, node, req.addr)?;
            }
            registrar.reclaim(env, registry, self.address, id, req.owner)?;
            registrar.transfer_from(env, self.address, self.address, req.owner, id)?;
            expires
        };

        if let Some(store) = datastore {
            store.set_record(env, self.address, registrar.address(), id, label, id, node)?;
        }
        if let Some(reverse) = reverse {
            let name = format!("{label}.{}", registrar.tld());
            reverse.set_name_for_addr(
                env, registry, resolver, directory, self.address, caller, caller, &name,
            )?;
        }

        tracing::info!(label, owner = %req.owner, %expires, cost, "name registered");
        env.emit(
            self.address,
            Event::NameRegistered {
                name: label.to_string(),
                label: id,
                owner: req.owner,
                cost,
                expires,
            },
        );
        Ok(expires)
    }

    fn bound_reverse<'b>(
        &self,
        supplied: Option<&'b ReverseRegistrar>,
    ) -> Result<&'b ReverseRegistrar, DcnsError> {
        let Some(expected) = self.reverse_registrar else {
            return Err(DcnsError::conflict(
                "reverse record",
                "controller was deployed without a reverse registrar",
            ));
        };
        match supplied {
            Some(reverse) if reverse.address() == expected => Ok(reverse),
            _ => Err(DcnsError::conflict(
                "reverse record",
                format!("reverse registrar {expected} was not supplied"),
            )),
        }
    }

    fn bound_datastore<'b>(
        &self,
        supplied: Option<&'b mut MetadataDatastore>,
    ) -> Result<Option<&'b mut MetadataDatastore>, DcnsError> {
        match (self.datastore, supplied) {
            (None, _) => Ok(None),
            (Some(expected), Some(store)) if store.address() == expected => Ok(Some(store)),
            (Some(expected), _) => Err(DcnsError::conflict(
                "register",
                format!("datastore {expected} was not supplied"),
            )),
        }
    }
}

fn check_binding(what: &str, expected: Address, supplied: Address) -> Result<(), DcnsError> {
    if expected == supplied {
        Ok(())
    } else {
        Err(DcnsError::conflict(
            format!("call {what}"),
            format!("expected {what} {expected}, got {supplied}"),
        ))
    }
}
