//! Output formatting utilities.

use serde::Serialize;

use dyaml_canonical::{Severity, ValidationFinding, ValidationReport};

use crate::error::CliError;

/// Formats a value as pretty JSON.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Formats a finding as a single indented line.
pub fn format_finding(finding: &ValidationFinding) -> String {
    format!(
        "  {:<7} {:<20} {}: {}",
        finding.severity,
        format!("{:?}", finding.code),
        finding.location,
        finding.message
    )
}

/// Formats the findings of one file, headed by its verdict.
pub fn format_validation(file: &str, report: &ValidationReport) -> String {
    let verdict = if report.is_valid() { "[PASS]" } else { "[FAIL]" };
    let mut lines = vec![format!("{verdict} {file}")];
    lines.extend(report.findings.iter().map(format_finding));
    lines.join("\n")
}

/// Formats a summary row for one validated file.
pub fn format_summary_row(file: &str, report: Option<&ValidationReport>) -> String {
    let (status, errors, warnings) = match report {
        Some(r) if r.is_valid() => ("valid", r.count(Severity::Error), r.count(Severity::Warning)),
        Some(r) => ("invalid", r.count(Severity::Error), r.count(Severity::Warning)),
        None => ("malformed", 1, 0),
    };
    format!("{:<44} {:<10} {:>6} {:>8}", truncate(file, 44), status, errors, warnings)
}

/// Prints the summary table header.
#[allow(clippy::print_literal)]
pub fn print_summary_header() {
    println!("{:<44} {:<10} {:>6} {:>8}", "FILE", "STATUS", "ERRORS", "WARNINGS");
    println!("{}", "-".repeat(71));
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_names_are_truncated() {
        let name = "a".repeat(60);
        assert_eq!(truncate(&name, 10), "aaaaaaa...");
        assert_eq!(truncate("short", 10), "short");
    }
}
