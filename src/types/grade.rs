//! Grading table.
//!
//! Grades are derived from a result's percentage, evaluated top-down with
//! the first matching threshold winning.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum percentage that counts toward a level's pass rate.
pub const PASS_THRESHOLD: f64 = 60.0;

/// Qualitative grade label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "Excellent")]
    Excellent,
    #[serde(rename = "Pass with Merit")]
    PassWithMerit,
    #[serde(rename = "Pass")]
    Pass,
    #[serde(rename = "Borderline")]
    Borderline,
    #[serde(rename = "Below Pass")]
    BelowPass,
}

impl Grade {
    /// Derive the grade for a percentage score.
    ///
    /// NaN compares false against every threshold and lands on `BelowPass`.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 85.0 {
            Self::Excellent
        } else if percentage >= 70.0 {
            Self::PassWithMerit
        } else if percentage >= PASS_THRESHOLD {
            Self::Pass
        } else if percentage >= 45.0 {
            Self::Borderline
        } else {
            Self::BelowPass
        }
    }

    /// The label shown in reports and CSV exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::PassWithMerit => "Pass with Merit",
            Self::Pass => "Pass",
            Self::Borderline => "Borderline",
            Self::BelowPass => "Below Pass",
        }
    }

    /// Human-readable description of the grade.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Outstanding performance",
            Self::PassWithMerit => "Very good performance",
            Self::Pass => "Good performance",
            Self::Borderline => "Need improvement",
            Self::BelowPass => "Requires significant improvement",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Grade as persisted: the label plus its description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeInfo {
    pub grade: Grade,
    pub description: String,
}

impl GradeInfo {
    /// Grade record for a percentage score.
    pub fn for_percentage(percentage: f64) -> Self {
        Grade::from_percentage(percentage).into()
    }
}

impl From<Grade> for GradeInfo {
    fn from(grade: Grade) -> Self {
        Self {
            grade,
            description: grade.description().to_string(),
        }
    }
}
