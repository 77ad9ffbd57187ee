//! # Record Resolver
//!
//! Stores the two record kinds of the protocol, per node:
//!
//! - **address**: the account a name points at (`addr`).
//! - **name**: a display name, used for reverse records (`name`).
//!
//! Reads never fail: unset records read as the zero address and the empty
//! string.
//!
//! ## Authorization
//!
//! Writes are gated on the node's owner as the registry reports it *at call
//! time*. The caller must be that owner, a registry operator of that owner,
//! or an operator the owner approved on this resolver. When a node changes
//! hands, operators of the previous owner lose their standing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use dcns_core::{Address, Contract, DcnsError, Env, Event, Node, OperatorApprovals};

use crate::registry::NodeRegistry;

/// A 4-byte capability identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceId(pub [u8; 4]);

impl InterfaceId {
    /// Address resolution (`addr(node)`).
    pub const ADDR: InterfaceId = InterfaceId([0x3b, 0x3b, 0x57, 0xde]);
    /// Name resolution (`name(node)`).
    pub const NAME: InterfaceId = InterfaceId([0x69, 0x1f, 0x34, 0x31]);
    /// Interface introspection (`supports_interface`).
    pub const INTROSPECTION: InterfaceId = InterfaceId([0x01, 0xff, 0xc9, 0xa7]);
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:02x}{:02x}{:02x}{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl FromStr for InterfaceId {
    type Err = DcnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bad = || DcnsError::InvalidInput(format!("invalid interface id: {s:?}"));
        if digits.len() != 8 {
            return Err(bad());
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| bad())?;
        Ok(Self(value.to_be_bytes()))
    }
}

/// Address and name records keyed by node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResolver {
    address: Address,
    addrs: BTreeMap<Node, Address>,
    names: BTreeMap<Node, String>,
    operators: OperatorApprovals,
}

impl Contract for RecordResolver {
    fn address(&self) -> Address {
        self.address
    }
}

impl RecordResolver {
    /// The capability set this resolver answers to.
    pub const SUPPORTED_INTERFACES: [InterfaceId; 3] = [
        InterfaceId::ADDR,
        InterfaceId::NAME,
        InterfaceId::INTROSPECTION,
    ];

    /// Deploy a resolver at `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            addrs: BTreeMap::new(),
            names: BTreeMap::new(),
            operators: OperatorApprovals::new(),
        }
    }

    /// Address record of `node`, or zero.
    pub fn addr(&self, node: Node) -> Address {
        self.addrs.get(&node).copied().unwrap_or(Address::ZERO)
    }

    /// Name record of `node`, or empty.
    pub fn name(&self, node: Node) -> &str {
        self.names.get(&node).map(String::as_str).unwrap_or("")
    }

    /// Whether `id` is one of [`Self::SUPPORTED_INTERFACES`].
    pub fn supports_interface(&self, id: InterfaceId) -> bool {
        Self::SUPPORTED_INTERFACES.contains(&id)
    }

    /// Whether `owner` approved `operator` on this resolver.
    pub fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.operators.is_approved_for_all(owner, operator)
    }

    /// The resolver's authorization predicate, evaluated against the
    /// registry's current owner of `node`.
    pub fn is_authorised(&self, registry: &NodeRegistry, caller: Address, node: Node) -> bool {
        let owner = registry.owner(node);
        owner == caller
            || registry.is_approved_for_all(owner, caller)
            || self.is_approved_for_all(owner, caller)
    }

    /// Set the address record of `node`.
    pub fn set_addr(
        &mut self,
        env: &mut Env,
        registry: &NodeRegistry,
        caller: Address,
        node: Node,
        addr: Address,
    ) -> Result<(), DcnsError> {
        self.authorize(registry, caller, node, "set addr")?;
        self.addrs.insert(node, addr);
        env.emit(self.address, Event::AddrChanged { node, addr });
        Ok(())
    }

    /// Set the name record of `node`.
    pub fn set_name(
        &mut self,
        env: &mut Env,
        registry: &NodeRegistry,
        caller: Address,
        node: Node,
        name: &str,
    ) -> Result<(), DcnsError> {
        self.authorize(registry, caller, node, "set name")?;
        self.names.insert(node, name.to_string());
        env.emit(
            self.address,
            Event::NameChanged {
                node,
                name: name.to_string(),
            },
        );
        Ok(())
    }

    /// Grant or revoke a resolver-local operator for `caller`.
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

    fn authorize(
        &self,
        registry: &NodeRegistry,
        caller: Address,
        node: Node,
        action: &str,
    ) -> Result<(), DcnsError> {
        if self.is_authorised(registry, caller, node) {
            Ok(())
        } else {
            Err(DcnsError::unauthorized(caller, format!("{action} on {node}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcns_core::{LabelHash, Timestamp};

    fn account(n: u8) -> Address {
        Address::new([n; 20])
    }

    /// Registry whose `dc` node is owned by account 10, plus a resolver.
    fn fixture() -> (Env, NodeRegistry, RecordResolver, Node) {
        let mut env = Env::new(Timestamp::from_epoch_secs(1_700_000_000).unwrap());
        let mut registry = NodeRegistry::new(account(0xEE), account(10));
        let node = registry
            .set_subnode_owner(&mut env, account(10), Node::ROOT, LabelHash::of("dc"), account(10))
            .unwrap();
        (env, registry, RecordResolver::new(account(0xDD)), node)
    }

    #[test]
    fn test_supports_known_interfaces() {
        let (_, _, resolver, _) = fixture();
        for id in ["0x3b3b57de", "0x691f3431", "0x01ffc9a7"] {
            assert!(resolver.supports_interface(id.parse().unwrap()), "{id}");
        }
        assert!(!resolver.supports_interface("0x3b3b57df".parse().unwrap()));
    }

    #[test]
    fn test_interface_id_display_roundtrip() {
        assert_eq!(InterfaceId::ADDR.to_string(), "0x3b3b57de");
        assert!("0x3b3b".parse::<InterfaceId>().is_err());
    }

    #[test]
    fn test_owner_sets_and_overwrites_addr() {
        let (mut env, registry, mut resolver, node) = fixture();
        resolver.set_addr(&mut env, &registry, account(10), node, account(1)).unwrap();
        assert_eq!(resolver.addr(node), account(1));
        resolver.set_addr(&mut env, &registry, account(10), node, account(1)).unwrap();
        resolver.set_addr(&mut env, &registry, account(10), node, account(10)).unwrap();
        assert_eq!(resolver.addr(node), account(10));
    }

    #[test]
    fn test_non_owner_cannot_write() {
        let (mut env, registry, mut resolver, node) = fixture();
        resolver.set_addr(&mut env, &registry, account(10), node, account(1)).unwrap();
        assert!(matches!(
            resolver.set_addr(&mut env, &registry, account(1), node, account(1)),
            Err(DcnsError::Unauthorized { .. })
        ));
        assert!(resolver.set_name(&mut env, &registry, account(1), node, "x").is_err());
        assert_eq!(resolver.addr(node), account(1));
    }

    #[test]
    fn test_unset_records_read_as_empty() {
        let (_, _, resolver, node) = fixture();
        assert_eq!(resolver.addr(node), Address::ZERO);
        assert_eq!(resolver.name(node), "");
    }

    #[test]
    fn test_name_records() {
        let (mut env, registry, mut resolver, node) = fixture();
        resolver.set_name(&mut env, &registry, account(10), node, "name1").unwrap();
        assert_eq!(resolver.name(node), "name1");
        resolver.set_name(&mut env, &registry, account(10), node, "name2").unwrap();
        assert_eq!(resolver.name(node), "name2");
    }

    #[test]
    fn test_resolver_operator_can_write_until_revoked() {
        let (mut env, registry, mut resolver, node) = fixture();
        resolver.set_approval_for_all(&mut env, account(10), account(1), true).unwrap();
        assert!(resolver.is_approved_for_all(account(10), account(1)));
        resolver.set_addr(&mut env, &registry, account(1), node, account(1)).unwrap();
        assert_eq!(resolver.addr(node), account(1));

        resolver.set_approval_for_all(&mut env, account(10), account(1), false).unwrap();
        assert!(resolver.set_addr(&mut env, &registry, account(1), node, account(10)).is_err());
    }

    #[test]
    fn test_registry_operator_can_write() {
        let (mut env, mut registry, mut resolver, node) = fixture();
        registry.set_approval_for_all(&mut env, account(10), account(3), true).unwrap();
        resolver.set_name(&mut env, &registry, account(3), node, "via-registry").unwrap();
        assert_eq!(resolver.name(node), "via-registry");
    }

    #[test]
    fn test_approvals_from_non_owner_have_no_effect() {
        let (mut env, registry, mut resolver, node) = fixture();
        resolver.set_approval_for_all(&mut env, account(1), account(2), true).unwrap();
        assert!(resolver.set_addr(&mut env, &registry, account(2), node, account(2)).is_err());
    }

    #[test]
    fn test_authorisation_checked_against_current_owner() {
        let (mut env, mut registry, mut resolver, node) = fixture();
        resolver.set_approval_for_all(&mut env, account(1), account(2), true).unwrap();
        resolver.set_approval_for_all(&mut env, account(10), account(4), true).unwrap();
        registry.set_owner(&mut env, account(10), node, account(1)).unwrap();

        resolver.set_addr(&mut env, &registry, account(2), node, account(10)).unwrap();
        assert_eq!(resolver.addr(node), account(10));
        // The previous owner's operator lost its standing with the transfer.
        assert!(resolver.set_addr(&mut env, &registry, account(4), node, account(4)).is_err());
    }

    #[test]
    fn test_self_approval_rejected() {
        let (mut env, _, mut resolver, _) = fixture();
        let err = resolver
            .set_approval_for_all(&mut env, account(1), account(1), true)
            .unwrap_err();
        assert!(err.to_string().contains("setting approval status for self"));
    }
}
