//! Human-readable and JSON renderings of diff and drift results.

use dyaml_canonical::Node;

use crate::differ::{ChangeKind, ChangeRecord};
use crate::drift::DriftReport;

/// Inline rendering of a node for one-line reports.
fn inline(node: Option<&Node>) -> String {
    match node {
        None => "(none)".to_string(),
        Some(Node::Scalar(s)) => s.canonical_spelling(),
        Some(other) => serde_json::to_string(other).unwrap_or_else(|_| other.kind_name().to_string()),
    }
}

fn change_line(change: &ChangeRecord) -> String {
    let detail = match change.kind {
        ChangeKind::Added => inline(change.after.as_ref()),
        ChangeKind::Removed => inline(change.before.as_ref()),
        ChangeKind::Changed => format!(
            "{} -> {}",
            inline(change.before.as_ref()),
            inline(change.after.as_ref())
        ),
    };
    format!("[{}] {}: {}", change.kind.tag(), change.path, detail)
}

/// Formats a change list for human-readable display.
#[must_use]
pub fn format_diff(changes: &[ChangeRecord]) -> String {
    if changes.is_empty() {
        return "No differences.".to_string();
    }
    let mut lines: Vec<String> = changes.iter().map(change_line).collect();
    lines.push(String::new());
    lines.push(format!(
        "{} change{}.",
        changes.len(),
        if changes.len() == 1 { "" } else { "s" }
    ));
    lines.join("\n")
}

/// Formats a drift report for human-readable display.
#[must_use]
pub fn format_drift_report(report: &DriftReport) -> String {
    if report.findings.is_empty() {
        return "No drift detected.".to_string();
    }

    let mut lines = Vec::new();
    for finding in &report.findings {
        lines.push(change_line(&finding.change));
        if finding.contradicts_annotation {
            if let Some(text) = &finding.annotation_text {
                lines.push(format!("    ! contradicts annotation: \"{text}\""));
            }
            if let Some(reason) = finding.reason {
                lines.push(format!("    -> {reason}"));
            }
        }
    }
    lines.push(String::new());

    let total = report.contradiction_count();
    lines.push(format!(
        "{} change{}, {total} contradict{} an annotation.",
        report.findings.len(),
        if report.findings.len() == 1 { "" } else { "s" },
        if total == 1 { "s" } else { "" }
    ));
    lines.join("\n")
}

/// JSON rows for a change list.
pub fn diff_json(changes: &[ChangeRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(changes)
}

/// JSON rows for a drift report.
pub fn drift_json(report: &DriftReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
