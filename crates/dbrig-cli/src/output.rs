//! Formatted output helpers for CLI commands.

use std::time::Duration;

use clap::ValueEnum;

/// How command results are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned key/value table for humans.
    #[default]
    Table,
    /// JSON for machines.
    Json,
}

/// Prints key/value rows with aligned keys.
pub fn print_rows(rows: &[(&str, String)]) {
    let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in rows {
        println!("  {key:<width$}  {value}");
    }
}

/// Formats a duration as fractional seconds, e.g. "2.3s".
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}
