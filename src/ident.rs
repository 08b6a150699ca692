//! Emitter identity - the (type, id) pair naming one emitter
//!
//! Format: `<TYPE>:<id>`
//!
//! Examples:
//! - `WLAN:00:11:22:33:44:55`
//! - `LTE:310/260/12345/678`

use crate::{Error, Result};
use crate::emitter::EmitterType;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Identity of one radio emitter.
///
/// Primary key of the emitter table and tie-break key when ranking
/// observations. Two identities are equal iff type and id are both equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RfIdentification {
    rf_type: EmitterType,
    rf_id: String,
}

impl RfIdentification {
    pub fn new(rf_id: impl Into<String>, rf_type: EmitterType) -> Self {
        Self {
            rf_type,
            rf_id: rf_id.into(),
        }
    }

    pub fn rf_type(&self) -> EmitterType {
        self.rf_type
    }

    pub fn rf_id(&self) -> &str {
        &self.rf_id
    }

    /// Parse `<TYPE>:<id>`. Only the first `:` separates, so MAC ids survive.
    pub fn parse(s: &str) -> Result<Self> {
        let (type_str, id) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidIdentity(format!("missing ':' in {}", s)))?;

        if id.is_empty() {
            return Err(Error::InvalidIdentity(format!("empty id in {}", s)));
        }

        Ok(Self::new(id, EmitterType::from_str(type_str)?))
    }
}

impl Ord for RfIdentification {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rf_type
            .as_str()
            .cmp(other.rf_type.as_str())
            .then_with(|| self.rf_id.cmp(&other.rf_id))
    }
}

impl PartialOrd for RfIdentification {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RfIdentification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.rf_type, self.rf_id)
    }
}

impl FromStr for RfIdentification {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for RfIdentification {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RfIdentification {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RfIdentification::parse(&s).map_err(serde::de::Error::custom)
    }
}
