//! Migration versions and identifiers
//!
//! A version is the digit run of a migration identifier such as
//! `Version20240101000001_CreateCustomerTable`. Versions are compared as strings,
//! never as integers, so two versions only order correctly when they have the same
//! number of digits. [`crate::migration::MigrationRegistry`] enforces that.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[allow(clippy::expect_used)]
static MIGRATION_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Version(\d+)(?:_(\w+))?$").expect("valid migration id regex"));

/// Prefix shared by every migration identifier.
pub const VERSION_PREFIX: &str = "Version";

/// Fixed-width, lexicographically ordered migration version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(String);

impl Version {
    /// Parse a version from its digit string.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidVersion(s.to_string()));
        }
        Ok(Version(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits in this version.
    pub fn width(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Version::parse(&s)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.0
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A parsed migration identifier: `Version<digits>[_<name>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationId {
    pub version: Version,
    pub name: Option<String>,
}

impl MigrationId {
    pub fn parse(identifier: &str) -> Result<Self> {
        let caps = MIGRATION_ID_RE
            .captures(identifier)
            .ok_or_else(|| Error::InvalidMigrationId(identifier.to_string()))?;

        // both groups are guaranteed by the regex shape
        let digits = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        Ok(MigrationId {
            version: Version::parse(digits)?,
            name: caps.get(2).map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}{}_{}", VERSION_PREFIX, self.version, name),
            None => write!(f, "{}{}", VERSION_PREFIX, self.version),
        }
    }
}

impl FromStr for MigrationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MigrationId::parse(s)
    }
}
