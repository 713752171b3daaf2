//! Drift detection: changed values that contradict the baseline's annotations.
//!
//! Each change is checked against the `$human$` text of the nearest enclosing
//! mapping in the baseline. The checks are keyword heuristics: a cited value
//! that no longer holds, a bound that is exceeded, a value that was meant to
//! stay fixed, or a flag flipped against an explicit instruction. Detection is
//! advisory and never fails.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

use dyaml_canonical::{
    CanonicalTree, Node, NodePath, PathSegment, ScalarValue, ANNOTATION_SEPARATOR,
};

use crate::differ::{diff, ChangeKind, ChangeRecord};

/// Options for [`check_drift`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftOptions {
    /// Report only changes to annotation text.
    pub human_only: bool,
}

/// Why a change was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftReason {
    /// The annotation cites the old value.
    CitedValue,
    /// The new value exceeds an upper bound.
    UpperBound,
    /// The new value falls below a lower bound.
    LowerBound,
    /// The annotation says the value must not change.
    Frozen,
    /// A flag was flipped against an explicit instruction.
    Negation,
}

impl fmt::Display for DriftReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DriftReason::CitedValue => "annotation cites the previous value",
            DriftReason::UpperBound => "new value exceeds the annotated upper bound",
            DriftReason::LowerBound => "new value is below the annotated lower bound",
            DriftReason::Frozen => "annotation says the value must not change",
            DriftReason::Negation => "flag flipped against the annotation",
        };
        f.write_str(label)
    }
}

/// A change together with the drift verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftFinding {
    /// The underlying change, baseline to candidate.
    #[serde(flatten)]
    pub change: ChangeRecord,
    /// True when the change contradicts the annotation.
    pub contradicts_annotation: bool,
    /// The contradicted annotation segment, or the governing annotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_text: Option<String>,
    /// Machine-readable reason for a contradiction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DriftReason>,
}

/// Aggregated drift report between a candidate and its baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DriftReport {
    /// One finding per change, in canonical path order.
    pub findings: Vec<DriftFinding>,
}

impl DriftReport {
    /// Returns `true` if no change contradicts an annotation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.contradiction_count() == 0
    }

    /// Number of changes that contradict an annotation.
    #[must_use]
    pub fn contradiction_count(&self) -> usize {
        self.findings.iter().filter(|f| f.contradicts_annotation).count()
    }

    /// Only the contradicting findings.
    pub fn contradictions(&self) -> impl Iterator<Item = &DriftFinding> {
        self.findings.iter().filter(|f| f.contradicts_annotation)
    }
}

/// Diffs `baseline` against `candidate` and checks every change against the
/// baseline's annotations.
#[must_use]
pub fn check_drift(
    candidate: &CanonicalTree,
    baseline: &CanonicalTree,
    options: DriftOptions,
) -> DriftReport {
    let findings: Vec<DriftFinding> = diff(baseline, candidate)
        .into_iter()
        .filter(|change| !options.human_only || change.is_annotation)
        .map(|change| assess(change, baseline))
        .collect();

    let report = DriftReport { findings };
    debug!(
        changes = report.findings.len(),
        contradictions = report.contradiction_count(),
        "drift check complete"
    );
    report
}

fn assess(change: ChangeRecord, baseline: &CanonicalTree) -> DriftFinding {
    if change.is_annotation {
        return DriftFinding {
            change,
            contradicts_annotation: false,
            annotation_text: None,
            reason: None,
        };
    }

    let Some((owner, annotation)) = governing_annotation(&change.path, baseline) else {
        return DriftFinding {
            change,
            contradicts_annotation: false,
            annotation_text: None,
            reason: None,
        };
    };

    let sibling = match change.path.segments().get(owner.len()) {
        Some(PathSegment::Key(key)) => Some(key.as_str()),
        _ => None,
    };
    let siblings = baseline.get_path(&owner).and_then(Node::as_mapping);

    let verdict = annotation
        .split(ANNOTATION_SEPARATOR)
        .filter(|segment| {
            let Some((prefix, _)) = segment.split_once(": ") else {
                return true;
            };
            let names_other_key = siblings.is_some_and(|m| m.contains_key(prefix));
            !names_other_key || Some(prefix) == sibling
        })
        .find_map(|segment| contradiction(segment, &change).map(|reason| (segment, reason)));

    match verdict {
        Some((segment, reason)) => DriftFinding {
            contradicts_annotation: true,
            annotation_text: Some(segment.to_string()),
            reason: Some(reason),
            change,
        },
        None => DriftFinding {
            contradicts_annotation: false,
            annotation_text: Some(annotation.to_string()),
            reason: None,
            change,
        },
    }
}

/// Nearest ancestor mapping of `path` in `baseline` that carries an annotation.
fn governing_annotation<'t>(path: &NodePath, baseline: &'t CanonicalTree) -> Option<(NodePath, &'t str)> {
    let mut current = path.parent();
    while let Some(candidate) = current {
        if let Some(text) = baseline.annotation_at(&candidate) {
            return Some((candidate, text));
        }
        current = candidate.parent();
    }
    None
}

fn upper_bound() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:max|maximum|at most|no more than|up to|limit|cap|ceiling)\b(?:\s*(?:of|is|=|:))?\s*(-?\d+(?:\.\d+)?)?",
        )
        .expect("invalid regex")
    })
}

fn lower_bound() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:min|minimum|at least|no less than|floor)\b(?:\s*(?:of|is|=|:))?\s*(-?\d+(?:\.\d+)?)?",
        )
        .expect("invalid regex")
    })
}

fn no_increase() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:do not|don't|never|must not|should not|cannot|can't)\s+(?:increase|exceed|raise|go above|go over)\b(?:\s*(?:beyond|above|past|over|to))?\s*(-?\d+(?:\.\d+)?)?",
        )
        .expect("invalid regex")
    })
}

fn no_decrease() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:do not|don't|never|must not|should not|cannot|can't)\s+(?:decrease|reduce|lower|drop|go below|fall below)\b(?:\s*(?:below|under|past|to))?\s*(-?\d+(?:\.\d+)?)?",
        )
        .expect("invalid regex")
    })
}

fn frozen() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:do not change|don't change|never change|must not change|must remain|fixed)\b")
            .expect("invalid regex")
    })
}

fn keep_disabled() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:do not enable|never enable|must be disabled|keep disabled)\b")
            .expect("invalid regex")
    })
}

fn keep_enabled() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:do not disable|never disable|must be enabled|keep enabled|always enabled)\b",
        )
        .expect("invalid regex")
    })
}

fn numeral() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("invalid regex"))
}

fn scalar_of(node: Option<&Node>) -> Option<&ScalarValue> {
    node.and_then(Node::as_scalar).map(|s| s.value())
}

fn contradiction(segment: &str, change: &ChangeRecord) -> Option<DriftReason> {
    let before = scalar_of(change.before.as_ref());
    let after = scalar_of(change.after.as_ref());
    let changed = matches!(change.kind, ChangeKind::Changed | ChangeKind::Removed);

    if changed && frozen().is_match(segment) {
        return Some(DriftReason::Frozen);
    }

    match (before, after) {
        (Some(ScalarValue::Bool(false)), Some(ScalarValue::Bool(true))) if keep_disabled().is_match(segment) => {
            return Some(DriftReason::Negation);
        }
        (Some(ScalarValue::Bool(true)), Some(ScalarValue::Bool(false))) if keep_enabled().is_match(segment) => {
            return Some(DriftReason::Negation);
        }
        _ => {}
    }

    let old = before.and_then(ScalarValue::as_f64);
    if let Some(new) = after.and_then(ScalarValue::as_f64) {
        let above = |limit: f64| new > limit;
        if bound_violated(upper_bound(), segment, old, above)
            || bound_violated(no_increase(), segment, old, above)
        {
            return Some(DriftReason::UpperBound);
        }
        let below = |limit: f64| new < limit;
        if bound_violated(lower_bound(), segment, old, below)
            || bound_violated(no_decrease(), segment, old, below)
        {
            return Some(DriftReason::LowerBound);
        }
    }

    if changed && cites(segment, before?) {
        return Some(DriftReason::CitedValue);
    }
    None
}

/// Checks every bound keyword in `segment`, including negated directions
/// such as "do not increase". A keyword with a number is compared against
/// that number; a bare keyword against the old value.
fn bound_violated(pattern: &Regex, segment: &str, old: Option<f64>, violates: impl Fn(f64) -> bool) -> bool {
    pattern.captures_iter(segment).any(|caps| {
        let limit = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .or(old);
        limit.is_some_and(&violates)
    })
}

fn cites(segment: &str, value: &ScalarValue) -> bool {
    match value {
        ScalarValue::Int(_) | ScalarValue::Float(_) => {
            let Some(old) = value.as_f64() else {
                return false;
            };
            numeral()
                .find_iter(segment)
                .filter_map(|m| m.as_str().parse::<f64>().ok())
                .any(|cited| cited == old)
        }
        ScalarValue::String(text) if !text.trim().is_empty() => {
            let pattern = format!(r"(?i)(?:^|\W){}(?:$|\W)", regex::escape(text));
            Regex::new(&pattern).is_ok_and(|re| re.is_match(segment))
        }
        _ => false,
    }
}
