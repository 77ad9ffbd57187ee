//! # Deployment Configuration
//!
//! Everything [`Ledger::deploy`](crate::Ledger::deploy) needs, loaded once
//! from YAML or JSON:
//!
//! ```yaml
//! admin: "0x1111111111111111111111111111111111111111"
//! tld: dc
//! genesis_time: 1700000000
//! price_tiers: [0, 0, 234496672381308, 58624168095327, 7288410087527]
//! balances:
//!   "0x2222222222222222222222222222222222222222": "100000000000000000000"
//! ```
//!
//! Amounts (tiers and balances) accept either an integer or a decimal
//! string, so values beyond `u64` survive the YAML parser. They serialize
//! as decimal strings.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use dcns_core::{Address, Wei};
use dcns_registrar::{DEFAULT_TIERS, GRACE_PERIOD_SECS, MIN_REGISTRATION_DURATION_SECS};

use crate::error::ConfigError;

fn default_tld() -> String {
    "dc".to_string()
}

fn default_tiers() -> Vec<Wei> {
    DEFAULT_TIERS.to_vec()
}

fn default_grace_period() -> u64 {
    GRACE_PERIOD_SECS
}

fn default_min_registration() -> u64 {
    MIN_REGISTRATION_DURATION_SECS
}

/// Root labels the deployment keeps for itself.
pub const RESERVED_TLDS: &[&str] = &["reverse", "resolver"];

fn enabled() -> bool {
    true
}

/// Parameters of one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    /// Deployer and administrator of every component.
    pub admin: Address,
    /// Top-level label leased by the label registrar.
    #[serde(default = "default_tld")]
    pub tld: String,
    /// Ledger clock at deployment, in epoch seconds.
    #[serde(default)]
    pub genesis_time: u64,
    /// Per-second rent by label length.
    #[serde(default = "default_tiers", with = "amounts")]
    pub price_tiers: Vec<Wei>,
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
    #[serde(default = "default_min_registration")]
    pub min_registration_secs: u64,
    /// Deploy the reverse registrar and wire it into the controller.
    #[serde(default = "enabled")]
    pub reverse_registrar: bool,
    /// Deploy the metadata datastore and wire it into the controller.
    #[serde(default = "enabled")]
    pub datastore: bool,
    /// Initial balances.
    #[serde(default, with = "balances")]
    pub balances: BTreeMap<Address, Wei>,
}

impl DeploymentConfig {
    /// A configuration with every default and the given administrator.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            tld: default_tld(),
            genesis_time: 0,
            price_tiers: default_tiers(),
            grace_period_secs: default_grace_period(),
            min_registration_secs: default_min_registration(),
            reverse_registrar: true,
            datastore: true,
            balances: BTreeMap::new(),
        }
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a file: `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Reject configurations that cannot be deployed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.is_zero() {
            return Err(ConfigError::Invalid(
                "admin must not be the zero address".to_string(),
            ));
        }
        if self.tld.is_empty() {
            return Err(ConfigError::Invalid("tld must not be empty".to_string()));
        }
        if self.tld.contains('.') {
            return Err(ConfigError::Invalid(format!(
                "tld {:?} must be a single label",
                self.tld
            )));
        }
        if RESERVED_TLDS.contains(&self.tld.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "tld {:?} is reserved",
                self.tld
            )));
        }
        if self.price_tiers.is_empty() {
            return Err(ConfigError::Invalid(
                "price_tiers must have at least one tier".to_string(),
            ));
        }
        Ok(())
    }
}

/// An amount written as an integer or a decimal string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(u64),
    Text(String),
}

impl RawAmount {
    fn into_wei<E: serde::de::Error>(self) -> Result<Wei, E> {
        match self {
            Self::Int(n) => Ok(Wei::from(n)),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid amount {s:?}"))),
        }
    }
}

mod amounts {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Wei], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(values.iter().map(|v| v.to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Wei>, D::Error> {
        Vec::<RawAmount>::deserialize(d)?
            .into_iter()
            .map(RawAmount::into_wei)
            .collect()
    }
}

mod balances {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        values: &BTreeMap<Address, Wei>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.collect_map(values.iter().map(|(k, v)| (k, v.to_string())))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<Address, Wei>, D::Error> {
        BTreeMap::<Address, RawAmount>::deserialize(d)?
            .into_iter()
            .map(|(k, v)| Ok((k, v.into_wei::<D::Error>()?)))
            .collect()
    }
}
