//! Id-based reconciliation of an external result set.
//!
//! Used by JSON import and by the one-time legacy key migration. The
//! incoming document is validated as a whole before anything is merged, so
//! a malformed record never leaves the store half-imported.

use super::model::TestResult;
use crate::error::{StoreError, StoreResult};
use crate::types::ResultId;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Validate an import document and extract its results.
///
/// Accepts either a snapshot-shaped object carrying a `results` array or a
/// bare array of records. Every record must be an object with an `id`.
pub fn parse_incoming(document: &Value) -> StoreResult<Vec<TestResult>> {
    let records = match document {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("results") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(StoreError::StructuralValidation(
                    "`results` is not an array".to_string(),
                ))
            }
            None => {
                return Err(StoreError::StructuralValidation(
                    "missing `results` array".to_string(),
                ))
            }
        },
        _ => {
            return Err(StoreError::StructuralValidation(
                "expected an object or an array".to_string(),
            ))
        }
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| parse_record(index, record))
        .collect()
}

fn parse_record(index: usize, record: &Value) -> StoreResult<TestResult> {
    let has_id = record
        .as_object()
        .and_then(|fields| fields.get("id"))
        .is_some_and(|id| !id.is_null());

    if !has_id {
        return Err(StoreError::StructuralValidation(format!(
            "record {} has no `id`",
            index
        )));
    }

    serde_json::from_value(record.clone())
        .map_err(|e| StoreError::StructuralValidation(format!("record {}: {}", index, e)))
}

/// Flatten a loosely shaped legacy value into records.
///
/// The value may be a single record, an array of records, or an object
/// with a `results` array. Returns the readable records and the number of
/// records that could not be parsed.
pub fn collect_lenient(value: Value) -> (Vec<TestResult>, usize) {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) if map.get("results").is_some_and(Value::is_array) => {
            match map.remove("results") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        }
        other => vec![other],
    };

    let mut records = Vec::new();
    let mut skipped = 0;

    for item in items {
        match serde_json::from_value::<TestResult>(item) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(error = %e, "Unreadable legacy record");
                skipped += 1;
            }
        }
    }

    (records, skipped)
}

/// Append every incoming record whose id is not already present.
///
/// Appends in incoming order (not newest-first). A repeated id inside
/// `incoming` is taken once. Returns the number of records added; the
/// caller re-derives the aggregate afterwards.
pub fn merge(existing: &mut Vec<TestResult>, incoming: Vec<TestResult>) -> usize {
    let mut seen: HashSet<ResultId> = existing.iter().map(|r| r.id.clone()).collect();
    let before = existing.len();

    for record in incoming {
        if seen.insert(record.id.clone()) {
            existing.push(record);
        }
    }

    existing.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::model::NewResult;
    use crate::types::TestLevel;
    use serde_json::json;

    fn ids(results: &[TestResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_parse_requires_results_array() {
        let err = parse_incoming(&json!({"metadata": {}})).unwrap_err();
        assert!(matches!(err, StoreError::StructuralValidation(_)));

        let err = parse_incoming(&json!({"results": "nope"})).unwrap_err();
        assert!(matches!(err, StoreError::StructuralValidation(_)));

        assert!(parse_incoming(&json!(42)).is_err());
    }

    #[test]
    fn test_parse_requires_ids() {
        let doc = json!({"results": [{"id": "a"}, {"percentage": 50}]});
        let err = parse_incoming(&doc).unwrap_err();
        assert!(err.to_string().contains("record 1"));

        let doc = json!({"results": [{"id": null}]});
        assert!(parse_incoming(&doc).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_level() {
        let doc = json!([{"id": "a", "testLevel": "A2"}]);
        assert!(parse_incoming(&doc).is_err());
    }

    #[test]
    fn test_collect_lenient_shapes() {
        let (single, skipped) = collect_lenient(json!({"id": "single"}));
        assert_eq!((ids(&single), skipped), (vec!["single"], 0));

        let (array, skipped) = collect_lenient(json!([{"id": "arr-1"}, {"broken": true}]));
        assert_eq!((ids(&array), skipped), (vec!["arr-1"], 1));

        let (nested, skipped) = collect_lenient(json!({"results": [{"id": "nested"}]}));
        assert_eq!((ids(&nested), skipped), (vec!["nested"], 0));

        let (noise, skipped) = collect_lenient(json!("noise"));
        assert!(noise.is_empty());
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_collect_lenient_reads_loose_legacy_fields() {
        let (records, skipped) = collect_lenient(json!(
            {"id": "old", "testLevel": "b2", "percentage": "75"}
        ));

        assert_eq!(skipped, 0);
        assert_eq!(records[0].test_level, TestLevel::B2);
        assert_eq!(records[0].percentage, 75.0);
        assert!(records[0].is_pass());
    }

    #[test]
    fn test_parse_accepts_loose_record_fields() {
        let doc = json!({"results": [
            {"id": "a", "timestamp": "2024-01-15", "testLevel": "c1"},
            {"id": "b", "percentage": null, "totalScore": null}
        ]});

        let records = parse_incoming(&doc).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].test_level, TestLevel::C1);
        assert!(records[0].timestamp.is_some());
        assert_eq!(records[1].percentage, 0.0);
    }

    #[test]
    fn test_merge_appends_in_incoming_order() {
        let mut existing = vec![TestResult::create(NewResult::new(TestLevel::B1, 70.0))];
        let incoming = parse_incoming(&json!({"results": [
            {"id": "x", "percentage": 10},
            {"id": "y", "percentage": 20},
            {"id": "z", "percentage": 30}
        ]}))
        .unwrap();

        let added = merge(&mut existing, incoming);
        assert_eq!(added, 3);
        assert_eq!(&ids(&existing)[1..], &["x", "y", "z"]);
    }

    #[test]
    fn test_merge_skips_known_and_repeated_ids() {
        let mut existing = parse_incoming(&json!([{"id": "a"}, {"id": "b"}])).unwrap();
        let incoming = parse_incoming(&json!([
            {"id": "b", "percentage": 99},
            {"id": "c"},
            {"id": "c", "percentage": 1}
        ]))
        .unwrap();

        let added = merge(&mut existing, incoming);
        assert_eq!(added, 1);
        assert_eq!(ids(&existing), vec!["a", "b", "c"]);
        assert_eq!(existing[1].percentage, 0.0);
    }
}
