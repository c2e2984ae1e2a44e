//! Terminal rendering of results, statistics and storage info.

use crate::storage::{Statistics, StorageInfo, TestResult};
use crate::types::Grade;
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "───────────────────────────────────────────────────────────────────────";

/// Print a table of results.
pub fn print_results(results: &[TestResult]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if results.is_empty() {
        writeln!(out, "  {}", style("No results to display.").dim())?;
        return Ok(());
    }

    writeln!(out, "  {}", style(RULE).dim())?;
    writeln!(
        out,
        "  {:<8}  {:<5}  {:<22}  {:>6}  {:<16}  {}",
        style("ID").bold(),
        style("LEVEL").bold(),
        style("STUDENT").bold(),
        style("SCORE").bold(),
        style("GRADE").bold(),
        style("TAKEN").bold()
    )?;
    writeln!(out, "  {}", style(RULE).dim())?;

    for result in results {
        let grade_style = match result.grade.grade {
            Grade::Excellent | Grade::PassWithMerit => Style::new().green().bold(),
            Grade::Pass => Style::new().green(),
            Grade::Borderline => Style::new().yellow(),
            Grade::BelowPass => Style::new().red(),
        };

        let student = result
            .student_name
            .as_deref()
            .map(|name| truncate_string(name, 22))
            .unwrap_or_default();

        let taken = result
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        writeln!(
            out,
            "  {:<8}  {:<5}  {:<22}  {:>5}%  {:<16}  {}",
            style(result.id.short()).dim(),
            result.test_level,
            student,
            result.percentage,
            grade_style.apply_to(result.grade.grade.label()),
            style(taken).dim()
        )?;
    }

    writeln!(out, "  {}", style(RULE).dim())?;
    writeln!(out, "  {} result(s)", results.len())?;

    Ok(())
}

/// Print per-level statistics.
pub fn print_statistics(statistics: &Statistics) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out)?;
    writeln!(
        out,
        "  {:<6}  {:>6}  {:>8}  {:>9}",
        style("LEVEL").bold(),
        style("TESTS").bold(),
        style("AVERAGE").bold(),
        style("PASS RATE").bold()
    )?;

    for (level, stats) in statistics.iter() {
        writeln!(
            out,
            "  {:<6}  {:>6}  {:>7}%  {:>8}%",
            style(level).cyan().bold(),
            stats.total_tests,
            stats.average_score,
            stats.pass_rate
        )?;
    }

    writeln!(out)?;
    Ok(())
}

/// Print storage information.
pub fn print_storage_info(info: &StorageInfo) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out)?;
    writeln!(out, "  {} {}", style("Results:").bold(), info.total_results)?;
    writeln!(
        out,
        "  {} {} KB",
        style("Snapshot size:").bold(),
        (info.data_size_bytes + 512) / 1024
    )?;
    writeln!(
        out,
        "  {} {}",
        style("Last updated:").bold(),
        info.last_updated.to_rfc3339()
    )?;
    writeln!(
        out,
        "  {} {}",
        style("Backup:").bold(),
        if info.has_backup {
            style("present").green()
        } else {
            style("missing").yellow()
        }
    )?;
    writeln!(out)?;

    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate a string to a maximum number of characters, adding an
/// ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
