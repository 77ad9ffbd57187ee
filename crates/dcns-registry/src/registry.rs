//! # Node Registry
//!
//! The root of trust: a map from node to `(owner, resolver, ttl)`.
//!
//! ## Authorization
//!
//! A node may be mutated (owner, resolver, ttl, or a subnode created under
//! it) only by its current owner or by an operator that owner approved.
//! Authority is re-evaluated from the current record on every call.
//!
//! ## Lifecycle
//!
//! Nodes spring into existence on first write. A zero owner means
//! "unowned"; nodes are never deleted.
//!
//! ## Events
//!
//! | Operation | Events |
//! |---|---|
//! | `set_owner` | `Transfer` |
//! | `set_subnode_owner` | `NewOwner` |
//! | `set_resolver` | `NewResolver` |
//! | `set_ttl` | `NewTtl` |
//! | `set_record` | `Transfer`, then `NewResolver` / `NewTtl` if changed |
//! | `set_subnode_record` | `NewOwner`, then `NewResolver` / `NewTtl` if changed |
//! | `set_approval_for_all` | `ApprovalForAll` |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dcns_core::{Address, Contract, DcnsError, Env, Event, LabelHash, Node, OperatorApprovals};

/// The registry entry of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Owning account; zero means unowned.
    pub owner: Address,
    /// Resolver component; zero means none.
    pub resolver: Address,
    /// Caching time-to-live in seconds.
    pub ttl: u64,
}

/// Hierarchical owner/resolver/ttl tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRegistry {
    address: Address,
    records: BTreeMap<Node, NodeRecord>,
    operators: OperatorApprovals,
}

impl Contract for NodeRegistry {
    fn address(&self) -> Address {
        self.address
    }
}

impl NodeRegistry {
    /// Deploy a registry at `address` whose root node is owned by `root_owner`.
    pub fn new(address: Address, root_owner: Address) -> Self {
        let mut records = BTreeMap::new();
        records.insert(
            Node::ROOT,
            NodeRecord {
                owner: root_owner,
                ..NodeRecord::default()
            },
        );
        Self {
            address,
            records,
            operators: OperatorApprovals::new(),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// The full record of `node` (all-zero if never written).
    pub fn record(&self, node: Node) -> NodeRecord {
        self.records.get(&node).copied().unwrap_or_default()
    }

    /// Owner of `node`.
    pub fn owner(&self, node: Node) -> Address {
        self.record(node).owner
    }

    /// Resolver of `node`.
    pub fn resolver(&self, node: Node) -> Address {
        self.record(node).resolver
    }

    /// TTL of `node`.
    pub fn ttl(&self, node: Node) -> u64 {
        self.record(node).ttl
    }

    /// Whether `node` currently has an owner.
    pub fn record_exists(&self, node: Node) -> bool {
        !self.owner(node).is_zero()
    }

    /// Whether `owner` approved `operator` for all its nodes.
    pub fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.operators.is_approved_for_all(owner, operator)
    }

    /// The registry's single authorization predicate: `caller` is the current
    /// owner of `node` or an operator of that owner.
    pub fn is_authorized(&self, caller: Address, node: Node) -> bool {
        let owner = self.owner(node);
        owner == caller || self.is_approved_for_all(owner, caller)
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Transfer ownership of `node` to `owner`.
    pub fn set_owner(
        &mut self,
        env: &mut Env,
        caller: Address,
        node: Node,
        owner: Address,
    ) -> Result<(), DcnsError> {
        self.authorize(caller, node, "set owner")?;
        self.entry(node).owner = owner;
        tracing::debug!(%node, %owner, "node owner set");
        env.emit(self.address, Event::Transfer { node, owner });
        Ok(())
    }

    /// Create or reassign the subnode `label` under `parent`. Returns the
    /// subnode's id.
    pub fn set_subnode_owner(
        &mut self,
        env: &mut Env,
        caller: Address,
        parent: Node,
        label: LabelHash,
        owner: Address,
    ) -> Result<Node, DcnsError> {
        self.authorize(caller, parent, "create subnode")?;
        let node = parent.child(label);
        self.entry(node).owner = owner;
        tracing::debug!(%parent, %node, %owner, "subnode owner set");
        env.emit(
            self.address,
            Event::NewOwner {
                node: parent,
                label,
                owner,
            },
        );
        Ok(node)
    }

    /// Set the resolver of `node`.
    pub fn set_resolver(
        &mut self,
        env: &mut Env,
        caller: Address,
        node: Node,
        resolver: Address,
    ) -> Result<(), DcnsError> {
        self.authorize(caller, node, "set resolver")?;
        self.entry(node).resolver = resolver;
        env.emit(self.address, Event::NewResolver { node, resolver });
        Ok(())
    }

    /// Set the TTL of `node`.
    pub fn set_ttl(
        &mut self,
        env: &mut Env,
        caller: Address,
        node: Node,
        ttl: u64,
    ) -> Result<(), DcnsError> {
        self.authorize(caller, node, "set ttl")?;
        self.entry(node).ttl = ttl;
        env.emit(self.address, Event::NewTtl { node, ttl });
        Ok(())
    }

    /// Write owner, resolver and ttl of `node` in one call.
    pub fn set_record(
        &mut self,
        env: &mut Env,
        caller: Address,
        node: Node,
        owner: Address,
        resolver: Address,
        ttl: u64,
    ) -> Result<(), DcnsError> {
        self.set_owner(env, caller, node, owner)?;
        self.write_resolver_and_ttl(env, node, resolver, ttl);
        Ok(())
    }

    /// Create subnode `label` under `parent` and write all three fields.
    #[allow(clippy::too_many_arguments)]
    pub fn set_subnode_record(
        &mut self,
        env: &mut Env,
        caller: Address,
        parent: Node,
        label: LabelHash,
        owner: Address,
        resolver: Address,
        ttl: u64,
    ) -> Result<Node, DcnsError> {
        let node = self.set_subnode_owner(env, caller, parent, label, owner)?;
        self.write_resolver_and_ttl(env, node, resolver, ttl);
        Ok(node)
    }

    /// Grant or revoke `operator` over all of `caller`'s nodes.
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

    // ── Internals ───────────────────────────────────────────────────

    fn authorize(&self, caller: Address, node: Node, action: &str) -> Result<(), DcnsError> {
        if self.is_authorized(caller, node) {
            Ok(())
        } else {
            Err(DcnsError::unauthorized(caller, format!("{action} on {node}")))
        }
    }

    fn entry(&mut self, node: Node) -> &mut NodeRecord {
        self.records.entry(node).or_default()
    }

    // Caller authority was checked by the owner write that precedes this.
    fn write_resolver_and_ttl(&mut self, env: &mut Env, node: Node, resolver: Address, ttl: u64) {
        let record = self.entry(node);
        let resolver_changed = record.resolver != resolver;
        let ttl_changed = record.ttl != ttl;
        record.resolver = resolver;
        record.ttl = ttl;
        if resolver_changed {
            env.emit(self.address, Event::NewResolver { node, resolver });
        }
        if ttl_changed {
            env.emit(self.address, Event::NewTtl { node, ttl });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcns_core::Timestamp;

    fn account(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn env() -> Env {
        Env::new(Timestamp::from_epoch_secs(1_700_000_000).unwrap())
    }

    fn registry() -> NodeRegistry {
        NodeRegistry::new(account(0xEE), account(1))
    }

    #[test]
    fn test_root_owned_by_deployer() {
        let reg = registry();
        assert_eq!(reg.owner(Node::ROOT), account(1));
        assert!(reg.record_exists(Node::ROOT));
        assert!(!reg.record_exists(Node::namehash("dc")));
    }

    #[test]
    fn test_allows_ownership_transfers() {
        let mut env = env();
        let mut reg = registry();
        reg.set_owner(&mut env, account(1), Node::ROOT, account(0x34)).unwrap();
        assert_eq!(reg.owner(Node::ROOT), account(0x34));
        assert_eq!(env.events().len(), 1);
    }

    #[test]
    fn test_allows_setting_resolvers() {
        let mut env = env();
        let mut reg = registry();
        reg.set_resolver(&mut env, account(1), Node::ROOT, account(0x34)).unwrap();
        assert_eq!(reg.resolver(Node::ROOT), account(0x34));
        assert_eq!(env.events().len(), 1);
    }

    #[test]
    fn test_allows_setting_ttl() {
        let mut env = env();
        let mut reg = registry();
        reg.set_ttl(&mut env, account(1), Node::ROOT, 3600).unwrap();
        assert_eq!(reg.ttl(Node::ROOT), 3600);
        assert_eq!(env.events().len(), 1);
    }

    #[test]
    fn test_allows_creation_of_subnodes() {
        let mut env = env();
        let mut reg = registry();
        let node = reg
            .set_subnode_owner(&mut env, account(1), Node::ROOT, LabelHash::of("dc"), account(2))
            .unwrap();
        assert_eq!(node, Node::namehash("dc"));
        assert_eq!(reg.owner(Node::namehash("dc")), account(2));
        assert_eq!(env.events().len(), 1);
    }

    #[test]
    fn test_rejects_non_owner_mutations() {
        let mut env = env();
        let mut reg = registry();
        let stranger = account(9);
        assert!(matches!(
            reg.set_owner(&mut env, stranger, Node::ROOT, stranger),
            Err(DcnsError::Unauthorized { .. })
        ));
        assert!(reg.set_resolver(&mut env, stranger, Node::ROOT, stranger).is_err());
        assert!(reg.set_ttl(&mut env, stranger, Node::ROOT, 1).is_err());
        assert!(reg
            .set_subnode_owner(&mut env, stranger, Node::ROOT, LabelHash::of("x"), stranger)
            .is_err());
        assert_eq!(reg.owner(Node::ROOT), account(1));
        assert!(env.events().is_empty());
    }

    #[test]
    fn test_operator_acts_for_owner() {
        let mut env = env();
        let mut reg = registry();
        reg.set_approval_for_all(&mut env, account(1), account(2), true).unwrap();
        reg.set_ttl(&mut env, account(2), Node::ROOT, 60).unwrap();
        assert_eq!(reg.ttl(Node::ROOT), 60);

        reg.set_approval_for_all(&mut env, account(1), account(2), false).unwrap();
        assert!(reg.set_ttl(&mut env, account(2), Node::ROOT, 61).is_err());
    }

    #[test]
    fn test_operator_standing_follows_current_owner() {
        let mut env = env();
        let mut reg = registry();
        reg.set_approval_for_all(&mut env, account(1), account(2), true).unwrap();
        reg.set_owner(&mut env, account(1), Node::ROOT, account(3)).unwrap();
        assert!(!reg.is_authorized(account(2), Node::ROOT));
        assert!(reg.set_ttl(&mut env, account(2), Node::ROOT, 1).is_err());
    }

    #[test]
    fn test_self_approval_rejected() {
        let mut env = env();
        let mut reg = registry();
        assert!(matches!(
            reg.set_approval_for_all(&mut env, account(1), account(1), true),
            Err(DcnsError::SelfApproval { .. })
        ));
    }

    #[test]
    fn test_set_record_emits_each_change_once() {
        let mut env = env();
        let mut reg = registry();
        reg.set_record(&mut env, account(1), Node::ROOT, account(2), account(3), 10)
            .unwrap();
        let names: Vec<_> = env.events().iter().map(|r| r.event.name()).collect();
        assert_eq!(names, vec!["transfer", "new_resolver", "new_ttl"]);
        assert_eq!(
            reg.record(Node::ROOT),
            NodeRecord {
                owner: account(2),
                resolver: account(3),
                ttl: 10
            }
        );
    }

    #[test]
    fn test_set_record_skips_unchanged_fields() {
        let mut env = env();
        let mut reg = registry();
        reg.set_record(&mut env, account(1), Node::ROOT, account(1), Address::ZERO, 0)
            .unwrap();
        assert_eq!(env.events().len(), 1);
    }

    #[test]
    fn test_set_subnode_record() {
        let mut env = env();
        let mut reg = registry();
        let node = reg
            .set_subnode_record(
                &mut env,
                account(1),
                Node::ROOT,
                LabelHash::of("reverse"),
                account(4),
                account(5),
                0,
            )
            .unwrap();
        assert_eq!(reg.owner(node), account(4));
        assert_eq!(reg.resolver(node), account(5));
        let names: Vec<_> = env.events().iter().map(|r| r.event.name()).collect();
        assert_eq!(names, vec!["new_owner", "new_resolver"]);
    }

    #[test]
    fn test_subnode_authority_comes_from_parent() {
        let mut env = env();
        let mut reg = registry();
        let tld = reg
            .set_subnode_owner(&mut env, account(1), Node::ROOT, LabelHash::of("dc"), account(2))
            .unwrap();
        // The root owner no longer controls the delegated subtree.
        assert!(reg
            .set_subnode_owner(&mut env, account(1), tld, LabelHash::of("a"), account(1))
            .is_err());
        reg.set_subnode_owner(&mut env, account(2), tld, LabelHash::of("a"), account(6))
            .unwrap();
        assert_eq!(reg.owner(Node::namehash("a.dc")), account(6));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Mutations succeed exactly for the owner and its operators.
            #[test]
            fn mutation_succeeds_iff_authorized(
                owner in 1u8..=5,
                operator in 1u8..=5,
                caller in 1u8..=5,
                approve in any::<bool>(),
            ) {
                let mut env = env();
                let mut reg = NodeRegistry::new(account(0xEE), account(owner));
                if approve && operator != owner {
                    reg.set_approval_for_all(&mut env, account(owner), account(operator), true).unwrap();
                }
                let expected = caller == owner || (approve && operator != owner && caller == operator);
                let result = reg.set_ttl(&mut env, account(caller), Node::ROOT, 7);
                prop_assert_eq!(result.is_ok(), expected);
                prop_assert_eq!(reg.ttl(Node::ROOT) == 7, expected);
            }
        }
    }
}
