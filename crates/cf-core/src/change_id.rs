//! Strongly-typed change unit identifier.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Stable identity of a change unit.
///
/// Either declared explicitly in a changelog entry or derived from the
/// unit's path relative to the project root (e.g. `ods/create_table.sql`).
/// Once a unit has a success record in the ledger its id must not be
/// reused for different content.
///
/// Ids are non-empty, single-line and carry no surrounding whitespace, so
/// the value written to the history table is exactly the value read back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ChangeId(String);

impl ChangeId {
    /// `None` when the value is blank, spans lines, or has surrounding whitespace
    pub fn try_new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let valid = !value.is_empty() && value.trim() == value && !value.contains('\n');
        valid.then_some(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for ChangeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ChangeId::try_new(raw.as_str()).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "change id {:?} must be a non-empty single line without surrounding whitespace",
                raw
            ))
        })
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for ChangeId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ChangeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ChangeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ChangeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ChangeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for ChangeId {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}
