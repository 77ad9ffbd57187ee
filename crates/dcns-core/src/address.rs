//! # Account Addresses
//!
//! A 20-byte account identifier. Externally-owned accounts and deployed
//! components share the same address space; a component's address is derived
//! from its deployer and a per-deployer nonce.
//!
//! Addresses render as `0x`-prefixed lowercase hex and parse case-insensitively,
//! so checksummed input is accepted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DcnsError;
use crate::hash::keccak256;

/// A 20-byte account address. The zero address means "nobody".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Lowercase hex without the `0x` prefix.
    ///
    /// This is the exact label string hashed into an account's reverse node.
    pub fn to_hex_lower(&self) -> String {
        hex::encode(self.0)
    }

    /// Derive the address of the `nonce`-th component deployed by `deployer`.
    pub fn contract(deployer: Address, nonce: u64) -> Self {
        let mut preimage = Vec::with_capacity(28);
        preimage.extend_from_slice(&deployer.0);
        preimage.extend_from_slice(&nonce.to_be_bytes());
        let digest = keccak256(&preimage);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex_lower())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = DcnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| DcnsError::InvalidInput(format!("address must start with 0x: {s:?}")))?;
        if digits.len() != 40 {
            return Err(DcnsError::InvalidInput(format!(
                "address must have 40 hex digits, got {}: {s:?}",
                digits.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| DcnsError::InvalidInput(format!("invalid address {s:?}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}
