//! Unique identifiers for test results.
//!
//! `ResultId` is opaque: freshly created results get a UUID v4, but ids
//! carried in by imports or legacy snapshots may be any non-empty string
//! (older portal builds produced short base-36 ids, some exports carry
//! numbers). Equality is plain string equality.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a test result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResultId(String);

impl ResultId {
    /// Generate a new random result ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get a short representation (first 8 characters).
    pub fn short(&self) -> String {
        self.0.chars().take(8).collect()
    }

    /// Check whether this ID begins with the given prefix.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResultId {
    type Err = ResultIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ResultIdError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for ResultId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for ResultId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        let raw = match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        };

        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for ResultId parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResultIdError {
    #[error("result ID cannot be empty")]
    Empty,
}
