//! Proficiency levels.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A proficiency tier a test can be taken at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TestLevel {
    /// Intermediate.
    #[default]
    B1,
    /// Upper intermediate.
    B2,
    /// Advanced.
    C1,
}

impl TestLevel {
    /// Every level, in the order statistics are reported.
    pub const ALL: [TestLevel; 3] = [TestLevel::B1, TestLevel::B2, TestLevel::C1];

    /// The literal level code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
        }
    }
}

impl fmt::Display for TestLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestLevel {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            "C1" => Ok(Self::C1),
            _ => Err(LevelError::Unknown(s.to_string())),
        }
    }
}

/// Reads level codes the same way [`FromStr`] does, ignoring case.
impl<'de> Deserialize<'de> for TestLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for level parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LevelError {
    #[error("unknown test level '{0}' (expected B1, B2 or C1)")]
    Unknown(String),
}
