//! Export and display formatting.
//!
//! Builds the JSON and CSV export artifacts, hands them to an
//! [`ExportSink`], and renders plain-text views for the terminal.

mod csv_format;
mod json_format;
mod plain;
mod sink;

pub use csv_format::{csv_filename, render_csv, CSV_HEADER};
pub use json_format::{json_filename, render_json, ExportDocument, ExportInfo, EXPORTED_BY};
pub use plain::{
    print_error, print_info, print_results, print_statistics, print_storage_info,
    print_success, print_warning,
};
pub use sink::{DirectorySink, ExportArtifact, ExportSink, MemorySink, StdoutSink};

/// Export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// Full snapshot with export information
    #[default]
    Json,
    /// Flat table of results
    Csv,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
