//! Strongly-typed migration name wrapper.
//!
//! A migration name is the artifact file name without its extension and
//! always has the shape `<timestamp>_<label>`, where the timestamp is a
//! 14-digit UTC `YYYYMMDDHHMMSS` string. Lexicographic order of names is
//! therefore chronological order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// `chrono` format string for the timestamp prefix.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Number of digits in the timestamp prefix.
pub const TIMESTAMP_LEN: usize = 14;

/// Strongly-typed wrapper for migration names (`<timestamp>_<label>`).
///
/// Ordering is plain string ordering, which the naming convention makes
/// identical to creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MigrationName(String);

impl MigrationName {
    /// Build a name from a creation instant and a label.
    ///
    /// The label is not validated here; the scaffolder checks it first.
    pub fn from_parts(created_at: DateTime<Utc>, label: &str) -> Self {
        Self(format!("{}_{}", created_at.format(TIMESTAMP_FORMAT), label))
    }

    /// Parse a name, returning the reason it is malformed on failure.
    pub fn parse(name: impl Into<String>) -> Result<Self, String> {
        let s = name.into();
        let Some((prefix, label)) = s.split_once('_') else {
            return Err("expected `<timestamp>_<label>`".to_string());
        };
        if prefix.len() != TIMESTAMP_LEN || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!(
                "timestamp prefix '{prefix}' must be {TIMESTAMP_LEN} digits (YYYYMMDDHHMMSS)"
            ));
        }
        if label.is_empty() {
            return Err("label after the timestamp is empty".to_string());
        }
        Ok(Self(s))
    }

    /// The timestamp prefix, used as the ledger `id`.
    pub fn id(&self) -> &str {
        &self.0[..TIMESTAMP_LEN]
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for MigrationName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MigrationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MigrationName {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<MigrationName> for String {
    fn from(name: MigrationName) -> Self {
        name.0
    }
}

impl PartialEq<str> for MigrationName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "migration_name_test.rs"]
mod tests;
