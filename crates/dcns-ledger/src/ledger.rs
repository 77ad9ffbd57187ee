//! # Ledger
//!
//! The shared, strictly sequential state every component lives in.
//!
//! ## Transactions
//!
//! [`Ledger::transact`] runs one operation against the whole
//! [`LedgerState`]:
//!
//! ```text
//! snapshot state ─▶ run op with a fresh Env(now)
//!                      │
//!          Ok ◀────────┴────────▶ Err
//!   append events to log     restore snapshot, drop events
//! ```
//!
//! A rejected operation therefore never leaves partial effects, however
//! many components it touched before failing.
//!
//! ## Deployment
//!
//! [`Ledger::deploy`] turns a [`DeploymentConfig`] into a wired set of
//! components. Contract addresses are derived from the administrator and a
//! deployment nonce.

use std::collections::BTreeMap;

use serde::Serialize;

use dcns_core::{
    Address, Contract, ContractDirectory, DcnsError, Env, EventRecord, Funds, LabelHash, Node,
    Timestamp, Wei,
};
use dcns_registrar::{
    ControllerDeps, LabelRegistrar, MetadataDatastore, PriceOracle, RegistrationController,
};
use dcns_registry::{NodeRegistry, RecordResolver, ReverseRegistrar};

use crate::config::DeploymentConfig;
use crate::error::LedgerError;

// ─── Deployment record ───────────────────────────────────────────────

/// Addresses of the deployed components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deployment {
    pub admin: Address,
    pub tld: String,
    pub registry: Address,
    pub resolver: Address,
    pub label_registrar: Address,
    pub price_oracle: Address,
    pub reverse_registrar: Option<Address>,
    pub datastore: Option<Address>,
    pub controller: Address,
}

/// Outcome of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt<T> {
    /// The operation's return value.
    pub value: T,
    /// Events the operation emitted, in order.
    pub events: Vec<EventRecord>,
}

// ─── Contract directory ──────────────────────────────────────────────

/// Snapshot of "who owns the contract at this address".
#[derive(Debug, Clone, Default)]
pub struct OwnerDirectory(BTreeMap<Address, Address>);

impl ContractDirectory for OwnerDirectory {
    fn contract_owner(&self, contract: Address) -> Option<Address> {
        self.0.get(&contract).copied()
    }
}

// ─── State ───────────────────────────────────────────────────────────

/// Every component plus held funds.
#[derive(Debug, Clone)]
pub struct LedgerState {
    pub registry: NodeRegistry,
    pub resolver: RecordResolver,
    pub registrar: LabelRegistrar,
    pub oracle: PriceOracle,
    pub reverse: Option<ReverseRegistrar>,
    pub datastore: Option<MetadataDatastore>,
    pub controller: RegistrationController,
    pub funds: Funds,
    ownables: BTreeMap<Address, Address>,
}

impl LedgerState {
    /// Owners of every owned contract: the administered components and the
    /// contracts created with [`Ledger::deploy_ownable`].
    pub fn directory(&self) -> OwnerDirectory {
        let mut owners = self.ownables.clone();
        owners.insert(self.registrar.address(), self.registrar.ownership().owner());
        owners.insert(self.oracle.address(), self.oracle.ownership().owner());
        owners.insert(self.controller.address(), self.controller.ownership().owner());
        if let Some(reverse) = &self.reverse {
            owners.insert(reverse.address(), reverse.ownership().owner());
        }
        if let Some(store) = &self.datastore {
            owners.insert(store.address(), store.ownership().owner());
        }
        OwnerDirectory(owners)
    }

    /// The controller together with the collaborators it calls.
    pub fn controller_call<'a>(
        &'a mut self,
        directory: &'a OwnerDirectory,
    ) -> (&'a RegistrationController, ControllerDeps<'a>) {
        let LedgerState {
            registry,
            resolver,
            registrar,
            oracle,
            reverse,
            datastore,
            controller,
            funds,
            ..
        } = self;
        let deps = ControllerDeps {
            registry,
            registrar,
            oracle,
            resolver,
            reverse: reverse.as_ref(),
            datastore: datastore.as_mut(),
            funds,
            directory,
        };
        (controller, deps)
    }

    /// The reverse registrar, or `StateConflict` if none was deployed.
    pub fn reverse(&self) -> Result<&ReverseRegistrar, DcnsError> {
        self.reverse
            .as_ref()
            .ok_or_else(|| DcnsError::conflict("reverse", "no reverse registrar deployed"))
    }
}

// ─── Ledger ──────────────────────────────────────────────────────────

/// Sequential executor over [`LedgerState`].
#[derive(Debug)]
pub struct Ledger {
    state: LedgerState,
    deployment: Deployment,
    now: Timestamp,
    nonce: u64,
    log: Vec<EventRecord>,
}

impl Ledger {
    /// Validate `config`, deploy every component and wire them together.
    pub fn deploy(config: &DeploymentConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let admin = config.admin;
        let now = Timestamp::from_epoch_secs(config.genesis_time)?;
        let mut env = Env::new(now);
        let mut nonce = 0u64;
        let mut next_address = || {
            let address = Address::contract(admin, nonce);
            nonce += 1;
            address
        };

        let mut registry = NodeRegistry::new(next_address(), admin);
        let mut resolver = RecordResolver::new(next_address());
        let mut registrar =
            LabelRegistrar::new(next_address(), admin, registry.address(), config.tld.as_str())
                .with_grace_period(config.grace_period_secs);
        let oracle = PriceOracle::new(next_address(), admin, config.price_tiers.clone())?;
        let mut reverse = config
            .reverse_registrar
            .then(|| ReverseRegistrar::new(next_address(), admin, resolver.address()));
        let mut datastore = config
            .datastore
            .then(|| MetadataDatastore::new(next_address(), admin));
        let mut controller =
            RegistrationController::new(next_address(), admin, registrar.address(), oracle.address())
                .with_min_duration(config.min_registration_secs);
        if let Some(reverse) = &reverse {
            controller = controller.with_reverse_registrar(reverse.address());
        }
        if let Some(store) = &datastore {
            controller = controller.with_datastore(store.address());
        }

        // The resolver resolves itself under `resolver`.
        let resolver_node =
            registry.set_subnode_owner(&mut env, admin, Node::ROOT, LabelHash::of("resolver"), admin)?;
        registry.set_resolver(&mut env, admin, resolver_node, resolver.address())?;
        resolver.set_addr(&mut env, &registry, admin, resolver_node, resolver.address())?;

        registry.set_subnode_owner(
            &mut env,
            admin,
            Node::ROOT,
            LabelHash::of(&config.tld),
            registrar.address(),
        )?;
        registrar.add_controller(&mut env, admin, controller.address())?;
        registrar.set_resolver(&mut env, &mut registry, admin, resolver.address())?;

        if let Some(reverse) = &mut reverse {
            reverse.set_controller(&mut env, admin, controller.address(), true)?;
            let reverse_node = registry.set_subnode_owner(
                &mut env,
                admin,
                Node::ROOT,
                LabelHash::of("reverse"),
                admin,
            )?;
            registry.set_subnode_owner(
                &mut env,
                admin,
                reverse_node,
                LabelHash::of("addr"),
                reverse.address(),
            )?;
        }
        if let Some(store) = &mut datastore {
            store.set_controller(&mut env, admin, controller.address(), true)?;
        }
        if !registrar.live(&registry) {
            return Err(DcnsError::conflict(
                "deploy",
                format!("registrar does not own the {:?} node", config.tld),
            )
            .into());
        }

        let mut funds = Funds::new();
        for (account, amount) in &config.balances {
            funds.credit(*account, *amount)?;
        }

        let deployment = Deployment {
            admin,
            tld: config.tld.clone(),
            registry: registry.address(),
            resolver: resolver.address(),
            label_registrar: registrar.address(),
            price_oracle: oracle.address(),
            reverse_registrar: reverse.as_ref().map(Contract::address),
            datastore: datastore.as_ref().map(Contract::address),
            controller: controller.address(),
        };
        tracing::info!(
            %admin,
            tld = %config.tld,
            registry = %deployment.registry,
            controller = %deployment.controller,
            "ledger deployed"
        );

        Ok(Self {
            state: LedgerState {
                registry,
                resolver,
                registrar,
                oracle,
                reverse,
                datastore,
                controller,
                funds,
                ownables: BTreeMap::new(),
            },
            deployment,
            now,
            nonce,
            log: env.into_events(),
        })
    }

    // ── Inspection ──────────────────────────────────────────────────

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Every committed event, deployment included.
    pub fn log(&self) -> &[EventRecord] {
        &self.log
    }

    /// Current block time.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn balance_of(&self, account: Address) -> Wei {
        self.state.funds.balance_of(account)
    }

    /// Rent quote from the controller's oracle.
    pub fn price(&self, label: &str, duration_secs: u64) -> Result<Wei, DcnsError> {
        self.state
            .controller
            .rent_price(&self.state.oracle, label, duration_secs)
    }

    // ── Clock and funds ─────────────────────────────────────────────

    /// Move the clock forward.
    pub fn advance(&mut self, secs: u64) -> Result<Timestamp, DcnsError> {
        self.now = self.now.checked_add_secs(secs)?;
        Ok(self.now)
    }

    /// Create funds out of thin air (test and genesis use).
    pub fn mint(&mut self, account: Address, amount: Wei) -> Result<(), DcnsError> {
        self.state.funds.credit(account, amount)
    }

    /// Create a contract whose owner query answers `owner`.
    pub fn deploy_ownable(&mut self, owner: Address) -> Address {
        let address = Address::contract(owner, self.nonce);
        self.nonce += 1;
        self.state.ownables.insert(address, owner);
        address
    }

    // ── Execution ───────────────────────────────────────────────────

    /// Run `op` atomically. `name` labels the transaction in logs.
    pub fn transact<T, F>(&mut self, name: &str, op: F) -> Result<Receipt<T>, DcnsError>
    where
        F: FnOnce(&mut LedgerState, &mut Env) -> Result<T, DcnsError>,
    {
        let snapshot = self.state.clone();
        let mut env = Env::new(self.now);
        match op(&mut self.state, &mut env) {
            Ok(value) => {
                let events = env.into_events();
                tracing::debug!(tx = name, events = events.len(), "transaction committed");
                self.log.extend(events.iter().cloned());
                Ok(Receipt { value, events })
            }
            Err(err) => {
                self.state = snapshot;
                tracing::warn!(tx = name, error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }

    // ── Controller wrappers ─────────────────────────────────────────

    /// Paid registration without a resolver.
    pub fn register(
        &mut self,
        caller: Address,
        label: &str,
        owner: Address,
        duration_secs: u64,
        payment: Wei,
    ) -> Result<Receipt<Timestamp>, DcnsError> {
        self.transact("register", |state, env| {
            let directory = state.directory();
            let (controller, deps) = state.controller_call(&directory);
            controller.register(env, deps, caller, label, owner, duration_secs, payment)
        })
    }

    /// Paid registration with a resolver and optional address record.
    #[allow(clippy::too_many_arguments)]
    pub fn register_with_config(
        &mut self,
        caller: Address,
        label: &str,
        owner: Address,
        duration_secs: u64,
        resolver: Address,
        addr: Address,
        payment: Wei,
    ) -> Result<Receipt<Timestamp>, DcnsError> {
        self.transact("register_with_config", |state, env| {
            let directory = state.directory();
            let (controller, deps) = state.controller_call(&directory);
            controller.register_with_config(
                env, deps, caller, label, owner, duration_secs, resolver, addr, payment,
            )
        })
    }

    /// Paid registration that also names the caller's reverse record.
    #[allow(clippy::too_many_arguments)]
    pub fn register_with_reverse_record(
        &mut self,
        caller: Address,
        label: &str,
        owner: Address,
        duration_secs: u64,
        resolver: Address,
        addr: Address,
        payment: Wei,
    ) -> Result<Receipt<Timestamp>, DcnsError> {
        self.transact("register_with_reverse_record", |state, env| {
            let directory = state.directory();
            let (controller, deps) = state.controller_call(&directory);
            controller.register_with_reverse_record(
                env, deps, caller, label, owner, duration_secs, resolver, addr, payment,
            )
        })
    }

    /// Paid renewal.
    pub fn renew(
        &mut self,
        caller: Address,
        label: &str,
        duration_secs: u64,
        payment: Wei,
    ) -> Result<Receipt<Timestamp>, DcnsError> {
        self.transact("renew", |state, env| {
            let directory = state.directory();
            let (controller, deps) = state.controller_call(&directory);
            controller.renew(env, deps, caller, label, duration_secs, payment)
        })
    }

    /// Pay the controller's balance to its administrator.
    pub fn withdraw(&mut self, caller: Address) -> Result<Receipt<Wei>, DcnsError> {
        self.transact("withdraw", |state, env| {
            state.controller.withdraw(env, &mut state.funds, caller)
        })
    }

    // ── Reverse wrappers ────────────────────────────────────────────

    /// Set the caller's reverse name through the default resolver.
    pub fn set_reverse_name(&mut self, caller: Address, name: &str) -> Result<Receipt<Node>, DcnsError> {
        self.transact("set_reverse_name", |state, env| {
            let LedgerState {
                registry,
                resolver,
                reverse,
                ..
            } = state;
            let reverse = reverse
                .as_ref()
                .ok_or_else(|| DcnsError::conflict("set reverse name", "no reverse registrar deployed"))?;
            reverse.set_name(env, registry, resolver, caller, name)
        })
    }

    /// Set the reverse name of `addr` on its behalf.
    pub fn set_reverse_name_for_addr(
        &mut self,
        caller: Address,
        addr: Address,
        owner: Address,
        name: &str,
    ) -> Result<Receipt<Node>, DcnsError> {
        self.transact("set_reverse_name_for_addr", |state, env| {
            let directory = state.directory();
            let LedgerState {
                registry,
                resolver,
                reverse,
                ..
            } = state;
            let reverse = reverse.as_ref().ok_or_else(|| {
                DcnsError::conflict("set reverse name", "no reverse registrar deployed")
            })?;
            reverse.set_name_for_addr(env, registry, resolver, &directory, caller, addr, owner, name)
        })
    }

    /// Claim the reverse node of `addr` for `owner`.
    pub fn claim_reverse_for_addr(
        &mut self,
        caller: Address,
        addr: Address,
        owner: Address,
    ) -> Result<Receipt<Node>, DcnsError> {
        self.transact("claim_reverse_for_addr", |state, env| {
            let directory = state.directory();
            let reverse = state
                .reverse
                .as_ref()
                .ok_or_else(|| DcnsError::conflict("claim reverse", "no reverse registrar deployed"))?;
            reverse.claim_for_addr(env, &mut state.registry, &directory, caller, addr, owner)
        })
    }
}
