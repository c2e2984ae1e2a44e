//! JSON export formatting.

use crate::error::StoreResult;
use crate::storage::Database;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Value recorded as the exporter in every export document.
pub const EXPORTED_BY: &str = "Test Portal Admin";

/// Provenance block appended to an exported snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInfo {
    pub export_date: DateTime<Utc>,
    pub exported_by: String,
    pub version: String,
}

/// An exported snapshot: the database plus `exportInfo`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    #[serde(flatten)]
    pub database: &'a Database,
    pub export_info: ExportInfo,
}

impl<'a> ExportDocument<'a> {
    /// Wrap a database for export at `now`.
    pub fn new(database: &'a Database, now: DateTime<Utc>) -> Self {
        Self {
            export_info: ExportInfo {
                export_date: now,
                exported_by: EXPORTED_BY.to_string(),
                version: database.metadata.version.clone(),
            },
            database,
        }
    }
}

/// File name for a JSON export, `testResults_<date>.json`.
pub fn json_filename(now: DateTime<Utc>) -> String {
    format!("testResults_{}.json", now.format("%Y-%m-%d"))
}

/// Render an export document as indented JSON.
pub fn render_json(document: &ExportDocument<'_>) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(document)?)
}
