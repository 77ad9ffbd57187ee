//! # Name Hashing: Nodes and Label Hashes
//!
//! Defines the two 256-bit identifier namespaces of the protocol and the
//! Keccak-256 derivations that produce them.
//!
//! ## Derivation
//!
//! ```text
//! labelhash(label)       = keccak256(utf8(label))
//! child(parent, label)   = keccak256(parent ‖ labelhash(label))
//! namehash("")           = 0x00…00 (the root)
//! namehash("a.b")        = child(namehash("b"), labelhash("a"))
//! ```
//!
//! The derivation matches the ENS namehash algorithm byte for byte, so node
//! identifiers computed here agree with any other namehash implementation for
//! already-normalized names. No Unicode normalization is applied.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::DcnsError;

/// Compute the Keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let hash = Keccak256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    bytes
}

fn parse_hash32(s: &str) -> Result<[u8; 32], DcnsError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() != 64 {
        return Err(DcnsError::InvalidInput(format!(
            "hash must have 64 hex digits, got {}: {s:?}",
            digits.len()
        )));
    }
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(digits, &mut bytes)
        .map_err(|e| DcnsError::InvalidInput(format!("invalid hash {s:?}: {e}")))?;
    Ok(bytes)
}

macro_rules! hash32_newtype {
    ($name:ident) => {
        impl $name {
            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Access the raw bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = DcnsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hash32(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Hash of a single name segment. Identifies a registration in the label
/// registrar (the registrar's token id).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LabelHash([u8; 32]);

hash32_newtype!(LabelHash);

impl LabelHash {
    /// Hash a label.
    pub fn of(label: &str) -> Self {
        Self(keccak256(label.as_bytes()))
    }
}

/// A node in the ownership tree.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Node([u8; 32]);

hash32_newtype!(Node);

impl Node {
    /// The root of the tree.
    pub const ROOT: Node = Node([0u8; 32]);

    /// Derive the child node for `label` under this node.
    pub fn child(&self, label: LabelHash) -> Node {
        let mut preimage = [0u8; 64];
        preimage[..32].copy_from_slice(&self.0);
        preimage[32..].copy_from_slice(&label.0);
        Node(keccak256(&preimage))
    }

    /// Compute the node of a dotted name. The empty name is the root.
    pub fn namehash(name: &str) -> Node {
        if name.is_empty() {
            return Node::ROOT;
        }
        name.rsplit('.')
            .fold(Node::ROOT, |node, label| node.child(LabelHash::of(label)))
    }

    /// Whether this is the root node.
    pub fn is_root(&self) -> bool {
        self.0 == [0u8; 32]
    }
}
