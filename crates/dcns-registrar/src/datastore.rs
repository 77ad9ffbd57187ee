//! # Metadata Datastore
//!
//! Keeps, per registered token, the bare label, its label hash and the full
//! node, so that off-ledger indexers can render a name from a token id.
//! Records are keyed by token collection (the label registrar's address)
//! and token id (the label hash). Only controllers write.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dcns_core::{Address, Contract, ControllerSet, DcnsError, Env, Event, LabelHash, Node, Ownership};

/// Metadata of one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// The bare label, e.g. `newname`.
    pub name: String,
    /// Hash of `name`, the token id.
    pub label: LabelHash,
    /// Full node of the registered name.
    pub node: Node,
}

/// Controller-written registration metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataDatastore {
    address: Address,
    ownership: Ownership,
    controllers: ControllerSet,
    records: BTreeMap<Address, BTreeMap<LabelHash, MetadataRecord>>,
}

impl Contract for MetadataDatastore {
    fn address(&self) -> Address {
        self.address
    }
}

impl MetadataDatastore {
    /// Deploy an empty datastore administered by `admin`.
    pub fn new(address: Address, admin: Address) -> Self {
        Self {
            address,
            ownership: Ownership::new(admin),
            controllers: ControllerSet::new(),
            records: BTreeMap::new(),
        }
    }

    /// Administrator record.
    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    /// Whether `account` may write records.
    pub fn is_controller(&self, account: Address) -> bool {
        self.controllers.contains(account)
    }

    /// The record of `token_id` in `collection`.
    pub fn record(&self, collection: Address, token_id: LabelHash) -> Option<&MetadataRecord> {
        self.records.get(&collection)?.get(&token_id)
    }

    /// Enable or disable a writer. Administrator-only.
    pub fn set_controller(
        &mut self,
        env: &mut Env,
        caller: Address,
        controller: Address,
        enabled: bool,
    ) -> Result<(), DcnsError> {
        self.ownership.require_owner(caller, "set datastore controller")?;
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

    /// Store the metadata of one token. Controller-only.
    #[allow(clippy::too_many_arguments)]
    pub fn set_record(
        &mut self,
        env: &mut Env,
        caller: Address,
        collection: Address,
        token_id: LabelHash,
        name: &str,
        label: LabelHash,
        node: Node,
    ) -> Result<(), DcnsError> {
        if !self.controllers.contains(caller) {
            return Err(DcnsError::unauthorized(caller, "write datastore record"));
        }
        self.records.entry(collection).or_default().insert(
            token_id,
            MetadataRecord {
                name: name.to_string(),
                label,
                node,
            },
        );
        env.emit(
            self.address,
            Event::NewName {
                token_id,
                name: name.to_string(),
            },
        );
        env.emit(self.address, Event::NewLabelHash { token_id, label });
        env.emit(self.address, Event::NewNodeHash { token_id, node });
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
}
