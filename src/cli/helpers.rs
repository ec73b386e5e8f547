//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};
use uuid::Uuid;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::outcome::{Outcome, ResultCode};
use crate::core::workspace::Workspace;
use crate::storage::DataProvider;

/// Locate the workspace, resolve configuration and open the provider
pub fn open_provider(global: &GlobalOpts) -> Result<DataProvider> {
    let workspace = match &global.workspace {
        Some(path) => Workspace::discover_from(path),
        None => Workspace::discover(),
    }
    .map_err(|e| miette::miette!("{}", e))?;

    let mut config = Config::load(Some(&workspace));
    if let Some(backend) = global.backend {
        config.backend = Some(backend);
    }
    tracing::debug!(
        backend = %config.backend(),
        data_dir = %config.data_dir().display(),
        "configuration resolved"
    );

    Ok(DataProvider::open(&config)?)
}

/// Display name of an employee for denormalized author fields. Empty when
/// the employee is unknown; the integrity check then reports the id.
pub fn author_name(provider: &DataProvider, employee_id: Uuid) -> String {
    provider
        .get_employee_by_id(employee_id)
        .into_data()
        .map(|e| e.full_name)
        .unwrap_or_default()
}

/// Print an outcome and turn a failed one into an error.
///
/// JSON and YAML print the whole envelope. `Auto` hands the payload to
/// `human`. A NOT_FOUND listing (empty collection) counts as handled.
pub fn finish<T: Serialize>(
    outcome: Outcome<T>,
    format: OutputFormat,
    human: impl FnOnce(&T),
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&outcome).into_diagnostic()?);
        }
        OutputFormat::Auto => {}
    }

    let listing = outcome.code == ResultCode::NotFound && outcome.data.is_some();
    if outcome.is_success() || listing {
        if format == OutputFormat::Auto {
            if let Some(data) = &outcome.data {
                human(data);
            }
        }
        return Ok(());
    }
    Err(failure(&outcome))
}

/// Payload of a successful outcome, or the outcome rendered as an error
pub fn require<T>(outcome: Outcome<T>) -> Result<T> {
    if !outcome.is_success() {
        return Err(failure(&outcome));
    }
    outcome
        .data
        .ok_or_else(|| miette::miette!("{}: no data returned", outcome.code))
}

fn failure<T>(outcome: &Outcome<T>) -> miette::Report {
    let mut msg = outcome.code.to_string();
    if let Some(ref message) = outcome.message {
        msg.push_str(": ");
        msg.push_str(message);
    }
    for (field, error) in &outcome.errors {
        msg.push_str(&format!("\n  {}: {}", field, error));
    }
    miette::miette!("{}", msg)
}

/// Parse `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp
pub fn parse_datetime(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}': expected YYYY-MM-DD or RFC 3339", s))?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| format!("invalid date '{}'", s))
}

/// Parse `YYYY-MM-DD`
pub fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}': expected YYYY-MM-DD", s))
}

/// Parse a `Title=Text` documentation article
pub fn parse_article(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((title, text)) if !title.trim().is_empty() => {
            Ok((title.trim().to_string(), text.to_string()))
        }
        _ => Err(format!("invalid article '{}': expected TITLE=TEXT", s)),
    }
}

/// Format a date for table cells
pub fn format_date(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d").to_string()
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print rows as a table followed by a count line
pub fn print_table(header: &[&str], rows: Vec<Vec<String>>, noun: &str) {
    let count = rows.len();
    let mut builder = Builder::default();
    builder.push_record(header.iter().copied());
    for row in rows {
        builder.push_record(row);
    }
    println!("{}", builder.build().with(Style::sharp()));
    println!();
    println!("{} {}(s) found", style(count).cyan(), noun);
}

/// Print one `Label: value` line of a detail view
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("{}: {}", style(label).bold(), value);
}

/// Print the separator used around detail views
pub fn print_rule() {
    println!("{}", style("─".repeat(60)).dim());
}

/// Print the confirmation line after a mutation
pub fn print_done(action: &str, what: &str, id: impl std::fmt::Display) {
    println!(
        "{} {} {} {}",
        style("✓").green(),
        action,
        what,
        style(id).cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_datetime_accepts_plain_dates() {
        let t = parse_datetime("2023-12-24").unwrap();
        assert_eq!(format_date(&t), "2023-12-24");
        assert_eq!(t.hour(), 0);

        let t = parse_datetime("2023-12-24T10:30:00+02:00").unwrap();
        assert_eq!(t.hour(), 8);

        assert!(parse_datetime("24.12.2023").is_err());
    }

    #[test]
    fn test_parse_article() {
        assert_eq!(
            parse_article("Intro=Hello = world").unwrap(),
            ("Intro".to_string(), "Hello = world".to_string())
        );
        assert!(parse_article("=text").is_err());
        assert!(parse_article("no separator").is_err());
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_require_reports_code_and_errors() {
        let ok: Outcome<u8> = Outcome::success(1);
        assert_eq!(require(ok).unwrap(), 1);

        let mut errors = std::collections::BTreeMap::new();
        errors.insert("name".to_string(), "Name must not be empty".to_string());
        let bad: Outcome<u8> = Outcome::invalid("Validation failed", errors);
        let msg = require(bad).unwrap_err().to_string();
        assert!(msg.starts_with("INVALID_DATA: Validation failed"));
        assert!(msg.contains("name: Name must not be empty"));
    }
}
