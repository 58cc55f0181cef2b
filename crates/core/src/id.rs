//! Identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// Identifier of a catalog row (country, province, street, postal code, ...).
///
/// Catalog ids are small integers, except for levels without a numeric
/// catalog (streets, postal codes) where the display string is the id.
///
/// Construction normalizes: trimmed text in canonical integer form (`"12"`,
/// not `"012"`) becomes `Numeric`, so a persisted `"12"` and a fetched `12`
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    Numeric(i64),
    Text(String),
}

impl Identifier {
    /// Build an identifier from raw user or wire text.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(n) if n.to_string() == trimmed => Self::Numeric(n),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    pub fn numeric(n: i64) -> Self {
        Self::Numeric(n)
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// An empty text id carries no selection.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(t) if t.trim().is_empty())
    }

    /// Compare against raw text using the same normalization as [`Identifier::from_raw`].
    pub fn matches_raw(&self, raw: &str) -> bool {
        *self == Self::from_raw(raw)
    }
}

impl ValueObject for Identifier {}

impl core::fmt::Display for Identifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Numeric(n) => core::fmt::Display::fmt(n, f),
            Self::Text(t) => f.write_str(t),
        }
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::from_raw(value)
    }
}

impl FromStr for Identifier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(DomainError::invalid_id("Identifier: empty"));
        }
        Ok(Self::from_raw(s))
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Numeric(n) => serializer.serialize_i64(*n),
            Self::Text(t) => serializer.serialize_str(t),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentifier {
    Int(i64),
    Str(String),
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawIdentifier::deserialize(deserializer)? {
            RawIdentifier::Int(n) => Self::Numeric(n),
            RawIdentifier::Str(s) => Self::from_raw(&s),
        })
    }
}

/// Identifier of one mounted form (new or edit beneficiary).
///
/// Used to correlate log lines and notices of the two chains a form owns.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSessionId(Uuid);

impl FormSessionId {
    /// Uses UUIDv7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FormSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for FormSessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for FormSessionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("FormSessionId: {e}")))?;
        Ok(Self(uuid))
    }
}
