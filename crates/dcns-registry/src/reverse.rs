//! # Reverse Registrar
//!
//! Maps accounts back to names. Every account `A` has a reverse node
//!
//! ```text
//! node(A) = namehash("<lowercase hex of A without 0x>.addr.reverse")
//! ```
//!
//! and this registrar, which must own `addr.reverse` in the registry, hands
//! those nodes out.
//!
//! ## Authorization chain
//!
//! A caller `C` may act for account `A` when, checked in this order:
//!
//! 1. `C == A`;
//! 2. `C` is a registry operator of `A`;
//! 3. `C` is a controller of this registrar;
//! 4. `A` is a contract whose owner query returns `C`.

use serde::{Deserialize, Serialize};

use dcns_core::{
    Address, Contract, ContractDirectory, ControllerSet, DcnsError, Env, Event, LabelHash, Node,
    Ownership,
};

use crate::registry::NodeRegistry;
use crate::resolver::RecordResolver;

/// The namespace reverse nodes live under.
pub const ADDR_REVERSE_NAME: &str = "addr.reverse";

/// `namehash("addr.reverse")`.
pub fn addr_reverse_node() -> Node {
    Node::namehash(ADDR_REVERSE_NAME)
}

/// Issues reverse nodes and writes their name records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseRegistrar {
    address: Address,
    ownership: Ownership,
    controllers: ControllerSet,
    default_resolver: Address,
}

impl Contract for ReverseRegistrar {
    fn address(&self) -> Address {
        self.address
    }
}

impl ReverseRegistrar {
    /// Deploy at `address`, administered by `admin`.
    pub fn new(address: Address, admin: Address, default_resolver: Address) -> Self {
        Self {
            address,
            ownership: Ownership::new(admin),
            controllers: ControllerSet::new(),
            default_resolver,
        }
    }

    /// The reverse node of `addr`.
    pub fn node(addr: Address) -> Node {
        addr_reverse_node().child(Self::label(addr))
    }

    fn label(addr: Address) -> LabelHash {
        LabelHash::of(&addr.to_hex_lower())
    }

    /// Administrator record.
    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    /// Resolver assigned by `claim`, `claim_for_addr` and `set_name*`.
    pub fn default_resolver(&self) -> Address {
        self.default_resolver
    }

    /// Whether `account` is a controller.
    pub fn is_controller(&self, account: Address) -> bool {
        self.controllers.contains(account)
    }

    /// The reverse registrar's authorization predicate.
    pub fn is_authorised(
        &self,
        registry: &NodeRegistry,
        directory: &dyn ContractDirectory,
        caller: Address,
        addr: Address,
    ) -> bool {
        caller == addr
            || registry.is_approved_for_all(addr, caller)
            || self.controllers.contains(caller)
            || directory.contract_owner(addr) == Some(caller)
    }

    // ── Claims ──────────────────────────────────────────────────────

    /// Claim the caller's own reverse node for `owner`.
    pub fn claim(
        &self,
        env: &mut Env,
        registry: &mut NodeRegistry,
        caller: Address,
        owner: Address,
    ) -> Result<Node, DcnsError> {
        self.claim_node(env, registry, caller, owner, self.default_resolver)
    }

    /// Claim the reverse node of `addr` for `owner`.
    pub fn claim_for_addr(
        &self,
        env: &mut Env,
        registry: &mut NodeRegistry,
        directory: &dyn ContractDirectory,
        caller: Address,
        addr: Address,
        owner: Address,
    ) -> Result<Node, DcnsError> {
        self.authorize(registry, directory, caller, addr)?;
        self.claim_node(env, registry, addr, owner, self.default_resolver)
    }

    /// Claim the caller's reverse node for `owner` with a custom resolver.
    pub fn claim_with_resolver(
        &self,
        env: &mut Env,
        registry: &mut NodeRegistry,
        caller: Address,
        owner: Address,
        resolver: Address,
    ) -> Result<Node, DcnsError> {
        self.claim_node(env, registry, caller, owner, resolver)
    }

    /// Set the caller's display name through the default resolver.
    pub fn set_name(
        &self,
        env: &mut Env,
        registry: &mut NodeRegistry,
        resolver: &mut RecordResolver,
        caller: Address,
        name: &str,
    ) -> Result<Node, DcnsError> {
        self.write_name(env, registry, resolver, caller, caller, name)
    }

    /// Set the display name of `addr` and leave its reverse node with `owner`.
    #[allow(clippy::too_many_arguments)]
    pub fn set_name_for_addr(
        &self,
        env: &mut Env,
        registry: &mut NodeRegistry,
        resolver: &mut RecordResolver,
        directory: &dyn ContractDirectory,
        caller: Address,
        addr: Address,
        owner: Address,
        name: &str,
    ) -> Result<Node, DcnsError> {
        self.authorize(registry, directory, caller, addr)?;
        self.write_name(env, registry, resolver, addr, owner, name)
    }

    // ── Administration ──────────────────────────────────────────────

    /// Enable or disable a controller. Administrator-only.
    pub fn set_controller(
        &mut self,
        env: &mut Env,
        caller: Address,
        controller: Address,
        enabled: bool,
    ) -> Result<(), DcnsError> {
        self.ownership.require_owner(caller, "set reverse controller")?;
        self.controllers.set(controller, enabled);
        env.emit(
            self.address,
            Event::ControllerChanged {
                controller,
                enabled,
            },
        );
        Ok(())
    }

    /// Replace the default resolver. Administrator-only.
    pub fn set_default_resolver(
        &mut self,
        env: &mut Env,
        caller: Address,
        resolver: Address,
    ) -> Result<(), DcnsError> {
        self.ownership.require_owner(caller, "set default resolver")?;
        if resolver.is_zero() {
            return Err(DcnsError::InvalidInput(
                "default resolver must not be the zero address".to_string(),
            ));
        }
        self.default_resolver = resolver;
        env.emit(self.address, Event::DefaultResolverChanged { resolver });
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

    fn authorize(
        &self,
        registry: &NodeRegistry,
        directory: &dyn ContractDirectory,
        caller: Address,
        addr: Address,
    ) -> Result<(), DcnsError> {
        if self.is_authorised(registry, directory, caller, addr) {
            Ok(())
        } else {
            Err(DcnsError::unauthorized(
                caller,
                format!("claim the reverse node of {addr}"),
            ))
        }
    }

    fn claim_node(
        &self,
        env: &mut Env,
        registry: &mut NodeRegistry,
        addr: Address,
        owner: Address,
        resolver: Address,
    ) -> Result<Node, DcnsError> {
        let node = registry.set_subnode_record(
            env,
            self.address,
            addr_reverse_node(),
            Self::label(addr),
            owner,
            resolver,
            0,
        )?;
        tracing::debug!(%addr, %owner, %node, "reverse node claimed");
        env.emit(self.address, Event::ReverseClaimed { addr, node });
        Ok(node)
    }

    // Claims the node for this registrar so it may write the record, then
    // hands the node to `owner`.
    fn write_name(
        &self,
        env: &mut Env,
        registry: &mut NodeRegistry,
        resolver: &mut RecordResolver,
        addr: Address,
        owner: Address,
        name: &str,
    ) -> Result<Node, DcnsError> {
        if self.default_resolver.is_zero() {
            return Err(DcnsError::conflict("set name", "no default resolver configured"));
        }
        if resolver.address() != self.default_resolver {
            return Err(DcnsError::conflict(
                "set name",
                format!(
                    "resolver {} is not the default resolver {}",
                    resolver.address(),
                    self.default_resolver
                ),
            ));
        }
        let node = self.claim_node(env, registry, addr, self.address, self.default_resolver)?;
        resolver.set_name(env, registry, self.address, node, name)?;
        if owner != self.address {
            registry.set_owner(env, self.address, node, owner)?;
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use dcns_core::Timestamp;

    fn account(n: u8) -> Address {
        Address::new([n; 20])
    }

    /// Contract directory backed by a plain map.
    struct Directory(BTreeMap<Address, Address>);

    impl ContractDirectory for Directory {
        fn contract_owner(&self, contract: Address) -> Option<Address> {
            self.0.get(&contract).copied()
        }
    }

    struct Fixture {
        env: Env,
        registry: NodeRegistry,
        resolver: RecordResolver,
        reverse: ReverseRegistrar,
        directory: Directory,
    }

    const ADMIN: u8 = 1;
    const OWNABLE: u8 = 0x0C;

    fn fixture() -> Fixture {
        let mut env = Env::new(Timestamp::from_epoch_secs(1_700_000_000).unwrap());
        let admin = account(ADMIN);
        let mut registry = NodeRegistry::new(account(0xEE), admin);
        let resolver = RecordResolver::new(account(0xDD));
        let reverse = ReverseRegistrar::new(account(0xCC), admin, resolver.address());
        registry
            .set_subnode_owner(&mut env, admin, Node::ROOT, LabelHash::of("reverse"), admin)
            .unwrap();
        registry
            .set_subnode_owner(
                &mut env,
                admin,
                Node::namehash("reverse"),
                LabelHash::of("addr"),
                reverse.address(),
            )
            .unwrap();
        let directory = Directory([(account(OWNABLE), admin)].into_iter().collect());
        Fixture {
            env,
            registry,
            resolver,
            reverse,
            directory,
        }
    }

    #[test]
    fn test_node_hash_matches_namehash() {
        let addr: Address = "0x00000000000000000000000000000000000012Ab".parse().unwrap();
        let expected = Node::namehash("00000000000000000000000000000000000012ab.addr.reverse");
        assert_eq!(ReverseRegistrar::node(addr), expected);
    }

    #[test]
    fn test_claim_own_address() {
        let mut f = fixture();
        f.reverse
            .claim(&mut f.env, &mut f.registry, account(1), account(2))
            .unwrap();
        let node = ReverseRegistrar::node(account(1));
        assert_eq!(f.registry.owner(node), account(2));
        assert_eq!(f.registry.resolver(node), f.resolver.address());
    }

    #[test]
    fn test_claim_for_addr_self() {
        let mut f = fixture();
        f.reverse
            .claim_for_addr(&mut f.env, &mut f.registry, &f.directory, account(1), account(1), account(2))
            .unwrap();
        assert_eq!(f.registry.owner(ReverseRegistrar::node(account(1))), account(2));
    }

    #[test]
    fn test_claim_for_another_address_rejected() {
        let mut f = fixture();
        let err = f
            .reverse
            .claim_for_addr(&mut f.env, &mut f.registry, &f.directory, account(1), account(2), account(1))
            .unwrap_err();
        assert!(matches!(err, DcnsError::Unauthorized { .. }));
    }

    #[test]
    fn test_registry_operator_may_claim() {
        let mut f = fixture();
        f.registry
            .set_approval_for_all(&mut f.env, account(2), account(1), true)
            .unwrap();
        f.reverse
            .claim_for_addr(&mut f.env, &mut f.registry, &f.directory, account(1), account(2), account(3))
            .unwrap();
        assert_eq!(f.registry.owner(ReverseRegistrar::node(account(2))), account(3));
    }

    #[test]
    fn test_controller_may_claim() {
        let mut f = fixture();
        f.reverse
            .set_controller(&mut f.env, account(ADMIN), account(1), true)
            .unwrap();
        f.reverse
            .claim_for_addr(&mut f.env, &mut f.registry, &f.directory, account(1), account(2), account(3))
            .unwrap();
        assert_eq!(f.registry.owner(ReverseRegistrar::node(account(2))), account(3));
    }

    #[test]
    fn test_contract_owner_may_claim() {
        let mut f = fixture();
        f.reverse
            .claim_for_addr(
                &mut f.env,
                &mut f.registry,
                &f.directory,
                account(ADMIN),
                account(OWNABLE),
                account(ADMIN),
            )
            .unwrap();
        assert_eq!(
            f.registry.owner(ReverseRegistrar::node(account(OWNABLE))),
            account(ADMIN)
        );
        // Someone else cannot use the same contract.
        assert!(f
            .reverse
            .claim_for_addr(&mut f.env, &mut f.registry, &f.directory, account(5), account(OWNABLE), account(5))
            .is_err());
    }

    #[test]
    fn test_claim_with_resolver() {
        let mut f = fixture();
        f.reverse
            .claim_with_resolver(&mut f.env, &mut f.registry, account(1), account(2), account(3))
            .unwrap();
        let node = ReverseRegistrar::node(account(1));
        assert_eq!(f.registry.owner(node), account(2));
        assert_eq!(f.registry.resolver(node), account(3));
    }

    #[test]
    fn test_set_name() {
        let mut f = fixture();
        let node = f
            .reverse
            .set_name(&mut f.env, &mut f.registry, &mut f.resolver, account(1), "testname")
            .unwrap();
        assert_eq!(node, ReverseRegistrar::node(account(1)));
        assert_eq!(f.registry.resolver(node), f.resolver.address());
        assert_eq!(f.resolver.name(node), "testname");
        assert_eq!(f.registry.owner(node), account(1));
    }

    #[test]
    fn test_set_name_for_addr_by_controller() {
        let mut f = fixture();
        f.reverse
            .set_controller(&mut f.env, account(ADMIN), account(1), true)
            .unwrap();
        let node = f
            .reverse
            .set_name_for_addr(
                &mut f.env,
                &mut f.registry,
                &mut f.resolver,
                &f.directory,
                account(1),
                account(2),
                account(1),
                "testname",
            )
            .unwrap();
        assert_eq!(f.registry.resolver(node), f.resolver.address());
        assert_eq!(f.resolver.name(node), "testname");
        assert_eq!(f.registry.owner(node), account(1));
    }

    #[test]
    fn test_set_name_for_addr_unauthorised() {
        let mut f = fixture();
        let result = f.reverse.set_name_for_addr(
            &mut f.env,
            &mut f.registry,
            &mut f.resolver,
            &f.directory,
            account(1),
            account(2),
            account(1),
            "testname",
        );
        assert!(matches!(result, Err(DcnsError::Unauthorized { .. })));
    }

    #[test]
    fn test_set_name_for_addr_by_contract_owner() {
        let mut f = fixture();
        let node = f
            .reverse
            .set_name_for_addr(
                &mut f.env,
                &mut f.registry,
                &mut f.resolver,
                &f.directory,
                account(ADMIN),
                account(OWNABLE),
                account(ADMIN),
                "dummyownable.dc",
            )
            .unwrap();
        assert_eq!(f.registry.owner(node), account(ADMIN));
        assert_eq!(f.resolver.name(node), "dummyownable.dc");
    }

    #[test]
    fn test_set_name_requires_default_resolver_instance() {
        let mut f = fixture();
        let mut other = RecordResolver::new(account(0xAB));
        let result = f
            .reverse
            .set_name(&mut f.env, &mut f.registry, &mut other, account(1), "x");
        assert!(matches!(result, Err(DcnsError::StateConflict { .. })));
    }

    #[test]
    fn test_claims_fail_without_addr_reverse_ownership() {
        let mut f = fixture();
        let addr_reverse = addr_reverse_node();
        f.registry
            .set_owner(&mut f.env, f.reverse.address(), addr_reverse, account(ADMIN))
            .unwrap_or_else(|_| panic!("registrar owns addr.reverse"));
        assert!(f
            .reverse
            .claim(&mut f.env, &mut f.registry, account(1), account(1))
            .is_err());
    }

    #[test]
    fn test_admin_only_configuration() {
        let mut f = fixture();
        assert!(f
            .reverse
            .set_controller(&mut f.env, account(2), account(2), true)
            .is_err());
        assert!(f
            .reverse
            .set_default_resolver(&mut f.env, account(2), account(2))
            .is_err());
        assert!(f
            .reverse
            .set_default_resolver(&mut f.env, account(ADMIN), Address::ZERO)
            .is_err());
        f.reverse
            .set_default_resolver(&mut f.env, account(ADMIN), account(7))
            .unwrap();
        assert_eq!(f.reverse.default_resolver(), account(7));
    }
}
