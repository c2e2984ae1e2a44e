//! CSV export formatting.

use crate::error::{StoreError, StoreResult};
use crate::storage::TestResult;
use crate::types::TestLevel;
use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, WriterBuilder};

/// Column headers, in output order.
pub const CSV_HEADER: [&str; 11] = [
    "ID",
    "Test Level",
    "Student Name",
    "Email",
    "Test Date",
    "Test Time",
    "Score",
    "Total Questions",
    "Percentage",
    "Grade",
    "Timestamp",
];

/// File name for a CSV export, `test-results-<level|all>-<date>.csv`.
pub fn csv_filename(level: Option<TestLevel>, now: DateTime<Utc>) -> String {
    format!(
        "test-results-{}-{}.csv",
        level.map_or("all", |l| l.as_str()),
        now.format("%Y-%m-%d")
    )
}

/// Render results as CSV with every field quoted.
///
/// Absent fields render as empty strings; the grade column carries the
/// label only.
pub fn render_csv(results: &[TestResult]) -> StoreResult<Vec<u8>> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(vec![]);

    wtr.write_record(CSV_HEADER).map_err(csv_error)?;

    for r in results {
        let score = r.total_score.map_or(String::new(), |v| v.to_string());
        let total = r.total_questions.map_or(String::new(), |v| v.to_string());
        let percentage = r.percentage.to_string();
        let timestamp = r
            .timestamp
            .map_or(String::new(), |t| t.to_rfc3339_opts(SecondsFormat::Millis, true));

        wtr.write_record([
            r.id.as_str(),
            r.test_level.as_str(),
            r.student_name.as_deref().unwrap_or(""),
            r.student_email.as_deref().unwrap_or(""),
            r.test_date.as_deref().unwrap_or(""),
            r.test_time.as_deref().unwrap_or(""),
            score.as_str(),
            total.as_str(),
            percentage.as_str(),
            r.grade.grade.label(),
            timestamp.as_str(),
        ])
        .map_err(csv_error)?;
    }

    wtr.into_inner().map_err(|e| StoreError::Io(e.into_error()))
}

fn csv_error(err: csv::Error) -> StoreError {
    StoreError::Io(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewResult;
    use chrono::TimeZone;

    #[test]
    fn test_csv_header_and_quoting() {
        let result = TestResult::create(
            NewResult::new(TestLevel::B2, 65.0)
                .with_student("Anna \"Annie\" Berg", "anna@example.com")
                .with_score(26, 40)
                .with_schedule("2024-03-01", "10:00"),
        );

        let csv = String::from_utf8(render_csv(&[result.clone()]).unwrap()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "\"ID\",\"Test Level\",\"Student Name\",\"Email\",\"Test Date\",\"Test Time\",\
             \"Score\",\"Total Questions\",\"Percentage\",\"Grade\",\"Timestamp\""
        );

        let row = lines.next().unwrap();
        assert!(row.starts_with(&format!("\"{}\",\"B2\",\"Anna \"\"Annie\"\" Berg\"", result.id)));
        assert!(row.contains("\"26\",\"40\",\"65\",\"Pass\""));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_csv_absent_fields_are_empty() {
        let result = TestResult::create(NewResult::new(TestLevel::C1, 10.5));
        let csv = String::from_utf8(render_csv(&[result]).unwrap()).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("\"C1\",\"\",\"\",\"\",\"\",\"\",\"\",\"10.5\",\"Below Pass\""));
    }

    #[test]
    fn test_csv_filename() {
        let now = Utc.with_ymd_and_hms(2024, 6, 9, 12, 0, 0).unwrap();
        assert_eq!(csv_filename(None, now), "test-results-all-2024-06-09.csv");
        assert_eq!(
            csv_filename(Some(TestLevel::B1), now),
            "test-results-B1-2024-06-09.csv"
        );
    }
}
