//! Score fields as they appear in stored and imported records.
//!
//! The portal front end serializes a NaN percentage as `null` and older
//! builds stored numbers as strings, so reading is tolerant while the
//! in-memory value is always a finite number.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Replace a non-finite percentage with zero.
pub fn finite_percentage(percentage: f64) -> f64 {
    if percentage.is_finite() {
        percentage
    } else {
        0.0
    }
}

fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Serde helper for `percentage`: numbers and numeric strings are taken
/// as-is, anything else (including `null`) reads as zero.
pub fn lenient_percentage<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(number_from(&raw).map_or(0.0, finite_percentage))
}

/// Serde helper for optional counts such as `totalScore`.
///
/// Whole non-negative numbers (or numeric strings) are kept; `null`,
/// fractions and negatives read as absent.
pub fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(number_from(&raw)
        .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32))
}
