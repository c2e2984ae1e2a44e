//! Persisted data model.
//!
//! The JSON shape of [`Database`] is the snapshot contract shared with the
//! portal front end: camelCase field names, a statistics entry for every
//! level, results newest-first.

use crate::types::{
    finite_percentage, lenient_count, lenient_instant, lenient_optional_instant, lenient_percentage,
    GradeInfo, ResultId, TestLevel,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Snapshot schema version written by this crate.
pub const SCHEMA_VERSION: &str = "2.0";

/// A single recorded test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredResult")]
pub struct TestResult {
    pub id: ResultId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub test_level: TestLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u32>,
    pub percentage: f64,
    pub grade: GradeInfo,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub answers: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub correct_answers: Value,
    pub part_scores: Map<String, Value>,
}

/// Wire form accepted when reading snapshots and imports.
///
/// Only `id` is required. Unreadable timestamps, counts and percentages
/// are tolerated, and a missing or malformed grade is derived from the
/// percentage.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredResult {
    id: ResultId,
    #[serde(default, deserialize_with = "lenient_optional_instant")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    test_level: Option<TestLevel>,
    #[serde(default)]
    student_name: Option<String>,
    #[serde(default)]
    student_email: Option<String>,
    #[serde(default)]
    test_date: Option<String>,
    #[serde(default)]
    test_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    total_score: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    total_questions: Option<u32>,
    #[serde(default, deserialize_with = "lenient_percentage")]
    percentage: f64,
    #[serde(default)]
    grade: Option<Value>,
    #[serde(default)]
    answers: Value,
    #[serde(default)]
    correct_answers: Value,
    #[serde(default)]
    part_scores: Option<Map<String, Value>>,
}

impl From<StoredResult> for TestResult {
    fn from(raw: StoredResult) -> Self {
        Self {
            grade: raw
                .grade
                .and_then(|grade| serde_json::from_value(grade).ok())
                .unwrap_or_else(|| GradeInfo::for_percentage(raw.percentage)),
            id: raw.id,
            timestamp: raw.timestamp,
            test_level: raw.test_level.unwrap_or_default(),
            student_name: raw.student_name,
            student_email: raw.student_email,
            test_date: raw.test_date,
            test_time: raw.test_time,
            total_score: raw.total_score,
            total_questions: raw.total_questions,
            percentage: raw.percentage,
            answers: raw.answers,
            correct_answers: raw.correct_answers,
            part_scores: raw.part_scores.unwrap_or_default(),
        }
    }
}

impl TestResult {
    /// Build a fresh result from caller input: new id, timestamp now, grade
    /// derived from the supplied percentage. A non-finite percentage is
    /// stored as zero.
    pub fn create(input: NewResult) -> Self {
        let percentage = finite_percentage(input.percentage);
        Self {
            id: ResultId::generate(),
            timestamp: Some(Utc::now()),
            test_level: input.test_level.unwrap_or_default(),
            student_name: input.student_name,
            student_email: input.student_email,
            test_date: input.test_date,
            test_time: input.test_time,
            total_score: input.score,
            total_questions: input.total_questions,
            percentage,
            grade: GradeInfo::for_percentage(percentage),
            answers: input.answers,
            correct_answers: input.correct_answers,
            part_scores: input.part_scores.unwrap_or_default(),
        }
    }

    /// Shallow-merge a patch over this record, then re-derive the grade
    /// from the resulting percentage.
    pub fn apply(&mut self, patch: ResultPatch) {
        if let Some(level) = patch.test_level {
            self.test_level = level;
        }
        if let Some(name) = patch.student_name {
            self.student_name = Some(name);
        }
        if let Some(email) = patch.student_email {
            self.student_email = Some(email);
        }
        if let Some(date) = patch.test_date {
            self.test_date = Some(date);
        }
        if let Some(time) = patch.test_time {
            self.test_time = Some(time);
        }
        if let Some(score) = patch.total_score {
            self.total_score = Some(score);
        }
        if let Some(total) = patch.total_questions {
            self.total_questions = Some(total);
        }
        if let Some(percentage) = patch.percentage {
            self.percentage = finite_percentage(percentage);
        }
        if let Some(answers) = patch.answers {
            self.answers = answers;
        }
        if let Some(correct) = patch.correct_answers {
            self.correct_answers = correct;
        }
        if let Some(parts) = patch.part_scores {
            self.part_scores = parts;
        }

        self.grade = GradeInfo::for_percentage(self.percentage);
    }

    /// Whether this result counts toward its level's pass rate.
    pub fn is_pass(&self) -> bool {
        self.percentage >= crate::types::PASS_THRESHOLD
    }

    /// Case-insensitive substring match on name, email or level.
    ///
    /// `needle` must already be lowercase.
    pub(crate) fn matches_query(&self, needle: &str) -> bool {
        let contains = |field: Option<&str>| {
            field.is_some_and(|value| value.to_lowercase().contains(needle))
        };

        contains(self.student_name.as_deref())
            || contains(self.student_email.as_deref())
            || contains(Some(self.test_level.as_str()))
    }

    /// Get a short summary of the result.
    pub fn summary(&self) -> String {
        format!(
            "{} [{}] {} - {}% ({})",
            self.student_name.as_deref().unwrap_or("<unnamed>"),
            self.test_level,
            self.id.short(),
            self.percentage,
            self.grade.grade
        )
    }
}

/// Caller input for a new result.
///
/// No field is validated; absent options stay absent on the stored record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewResult {
    pub test_level: Option<TestLevel>,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub test_date: Option<String>,
    pub test_time: Option<String>,
    pub score: Option<u32>,
    pub total_questions: Option<u32>,
    pub percentage: f64,
    pub answers: Value,
    pub correct_answers: Value,
    pub part_scores: Option<Map<String, Value>>,
}

impl NewResult {
    /// Start an input for a level and percentage.
    pub fn new(level: TestLevel, percentage: f64) -> Self {
        Self {
            test_level: Some(level),
            percentage,
            ..Self::default()
        }
    }

    /// Set the student's identity fields.
    pub fn with_student(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.student_name = Some(name.into());
        self.student_email = Some(email.into());
        self
    }

    /// Set the raw score.
    pub fn with_score(mut self, score: u32, total_questions: u32) -> Self {
        self.score = Some(score);
        self.total_questions = Some(total_questions);
        self
    }

    /// Set the scheduling fields.
    pub fn with_schedule(mut self, date: impl Into<String>, time: impl Into<String>) -> Self {
        self.test_date = Some(date.into());
        self.test_time = Some(time.into());
        self
    }
}

/// Partial update merged over an existing result.
///
/// `id` and `timestamp` are fixed at creation and cannot be patched; the
/// grade always follows the merged percentage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultPatch {
    pub test_level: Option<TestLevel>,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub test_date: Option<String>,
    pub test_time: Option<String>,
    pub total_score: Option<u32>,
    pub total_questions: Option<u32>,
    pub percentage: Option<f64>,
    pub answers: Option<Value>,
    pub correct_answers: Option<Value>,
    pub part_scores: Option<Map<String, Value>>,
}

/// Aggregate figures for one level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelStatistics {
    pub total_tests: usize,
    pub average_score: i64,
    pub pass_rate: i64,
}

/// Per-level statistics, always carrying an entry for every level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statistics(BTreeMap<TestLevel, LevelStatistics>);

impl Default for Statistics {
    fn default() -> Self {
        Self(
            TestLevel::ALL
                .iter()
                .map(|level| (*level, LevelStatistics::default()))
                .collect(),
        )
    }
}

impl Statistics {
    /// Statistics for one level (zeroed when no result has that level).
    pub fn get(&self, level: TestLevel) -> LevelStatistics {
        self.0.get(&level).copied().unwrap_or_default()
    }

    pub(crate) fn set(&mut self, level: TestLevel, stats: LevelStatistics) {
        self.0.insert(level, stats);
    }

    /// Iterate over every level's statistics in level order.
    pub fn iter(&self) -> impl Iterator<Item = (TestLevel, LevelStatistics)> + '_ {
        TestLevel::ALL.iter().map(move |level| (*level, self.get(*level)))
    }
}

/// Snapshot bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, deserialize_with = "lenient_instant")]
    pub created: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_instant")]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub total_tests: usize,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

impl Metadata {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            last_updated: now,
            total_tests: 0,
            version: default_version(),
        }
    }

    /// Refresh `last_updated` to now.
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

/// The root aggregate persisted as one snapshot.
///
/// Reading a snapshot ignores its stored statistics and `totalTests`; both
/// are re-derived from `results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredDatabase")]
pub struct Database {
    pub metadata: Metadata,
    pub statistics: Statistics,
    pub results: Vec<TestResult>,
}

#[derive(Deserialize)]
struct StoredDatabase {
    #[serde(default)]
    metadata: Metadata,
    results: Vec<TestResult>,
}

impl From<StoredDatabase> for Database {
    fn from(raw: StoredDatabase) -> Self {
        let mut db = Self {
            metadata: raw.metadata,
            statistics: Statistics::default(),
            results: raw.results,
        };
        db.rederive();
        db
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::empty()
    }
}

impl Database {
    /// A fresh database with zeroed statistics for every level.
    pub fn empty() -> Self {
        Self {
            metadata: Metadata::new(),
            statistics: Statistics::default(),
            results: Vec::new(),
        }
    }

    /// Parse a snapshot.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Recompute `totalTests` and every level's statistics from `results`.
    pub fn rederive(&mut self) {
        self.metadata.total_tests = self.results.len();
        for level in TestLevel::ALL {
            self.refresh_level(level);
        }
    }

    /// Recompute one level's statistics from `results`.
    pub fn refresh_level(&mut self, level: TestLevel) {
        let stats = super::statistics::recompute(level, &self.results);
        self.statistics.set(level, stats);
    }

    /// Position of the first result with the given id.
    pub fn position(&self, id: &ResultId) -> Option<usize> {
        self.results.iter().position(|r| &r.id == id)
    }
}
