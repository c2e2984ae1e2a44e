//! Per-level statistics aggregation.
//!
//! Statistics are always recomputed from the full result collection, never
//! patched incrementally, so they cannot drift from the results they
//! describe.

use super::model::{LevelStatistics, TestResult};
use crate::types::TestLevel;

/// Recompute one level's statistics from the current results.
///
/// Pure and idempotent; the caller writes the value back.
pub fn recompute(level: TestLevel, results: &[TestResult]) -> LevelStatistics {
    let (count, sum, passed) = results
        .iter()
        .filter(|r| r.test_level == level)
        .fold((0usize, 0.0f64, 0usize), |(count, sum, passed), r| {
            (count + 1, sum + r.percentage, passed + usize::from(r.is_pass()))
        });

    if count == 0 {
        return LevelStatistics::default();
    }

    LevelStatistics {
        total_tests: count,
        average_score: round_half_up(sum / count as f64),
        pass_rate: round_half_up(passed as f64 * 100.0 / count as f64),
    }
}

/// Round to the nearest integer, halves toward positive infinity.
fn round_half_up(value: f64) -> i64 {
    if value.is_finite() {
        (value + 0.5).floor() as i64
    } else {
        0
    }
}
