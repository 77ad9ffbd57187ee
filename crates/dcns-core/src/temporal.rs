//! # Temporal Types: Ledger Block Time
//!
//! Defines `Timestamp`, a UTC-only timestamp truncated to seconds precision.
//! Every expiry and grace-period comparison in the protocol is made between
//! two `Timestamp`s; durations are plain seconds (`u64`).
//!
//! The ledger supplies the current time to each operation through
//! [`Env`](crate::Env). Components never read the wall clock.

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DcnsError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::from_epoch_secs()`]: from Unix seconds (the ledger clock).
/// - [`Timestamp::parse()`]: from an RFC 3339 string with `Z` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: u64) -> Result<Self, DcnsError> {
        let secs = i64::try_from(secs)
            .map_err(|_| DcnsError::InvalidInput(format!("timestamp out of range: {secs}")))?;
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| DcnsError::InvalidInput(format!("timestamp out of range: {secs}")))
    }

    /// Parse an RFC 3339 timestamp. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, DcnsError> {
        if !s.ends_with('Z') {
            return Err(DcnsError::InvalidInput(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| DcnsError::InvalidInput(format!("invalid RFC 3339 timestamp {s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Returns the Unix epoch timestamp in seconds.
    ///
    /// Timestamps are only ever built from non-negative epoch seconds, so the
    /// conversion cannot lose information for ledger times.
    pub fn epoch_secs(&self) -> u64 {
        u64::try_from(self.0.timestamp()).unwrap_or(0)
    }

    /// Add `secs` seconds. Overflow is an input error.
    pub fn checked_add_secs(&self, secs: u64) -> Result<Self, DcnsError> {
        i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(Self)
            .ok_or_else(|| {
                DcnsError::InvalidInput(format!("duration of {secs}s overflows timestamp {self}"))
            })
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
