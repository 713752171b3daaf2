use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metric: annotations projected into `$human$` keys.
pub const METRIC_ANNOTATIONS_PROJECTED: &str = "annotations_projected";
/// Metric: data keys renamed with the annotation escape prefix.
pub const METRIC_KEYS_ESCAPED: &str = "keys_escaped";
/// Metric: mappings whose key order changed.
pub const METRIC_MAPPINGS_REORDERED: &str = "mappings_reordered";
/// Metric: scalars whose source spelling was not canonical.
pub const METRIC_SCALARS_RESPELLED: &str = "scalars_respelled";
/// Metric: literal or folded block scalars turned into quoted strings.
pub const METRIC_BLOCK_SCALARS_FOLDED: &str = "block_scalars_folded";
/// Metric: non-empty flow collections rewritten in block style.
pub const METRIC_FLOW_COLLECTIONS_EXPANDED: &str = "flow_collections_expanded";

/// Hygiene status for canonicalization attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HygieneStatus {
    /// The input was already canonical in structure and spelling.
    Ok,
    /// The input was accepted but had to be rewritten; metrics say how.
    Normalized,
    /// The input was rejected.
    Invalid,
}

/// Stable warning code emitted by canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HygieneWarning(String);

impl HygieneWarning {
    /// Creates a warning from a literal code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// A comment had no mapping to own it.
    pub fn orphaned_annotation() -> Self {
        Self::new("OrphanedAnnotation")
    }

    /// A data key named like the annotation key was escaped.
    pub fn annotation_key_escaped() -> Self {
        Self::new("AnnotationKeyEscaped")
    }

    /// An integer literal outside the 64-bit range was read as a float.
    pub fn integer_overflow() -> Self {
        Self::new("IntegerOverflow")
    }

    /// The warning code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

/// Hygiene reports produced during canonicalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HygieneReport {
    /// Overall hygiene status.
    pub status: HygieneStatus,
    /// Stable warning codes, each listed once.
    pub warnings: Vec<HygieneWarning>,
    /// Counters keyed by the `METRIC_*` names.
    pub metrics: BTreeMap<String, u64>,
}

impl HygieneReport {
    /// An empty report with status `Ok`.
    pub fn new() -> Self {
        Self {
            status: HygieneStatus::Ok,
            warnings: Vec::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Records a warning unless the same code is already present.
    pub fn warn(&mut self, warning: HygieneWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    /// Adds `by` to a metric.
    pub fn bump(&mut self, metric: &str, by: u64) {
        if by == 0 {
            return;
        }
        *self.metrics.entry(metric.to_string()).or_insert(0) += by;
    }

    /// Current value of a metric.
    pub fn metric(&self, metric: &str) -> u64 {
        self.metrics.get(metric).copied().unwrap_or(0)
    }

    /// Returns true when any rewrite metric is non-zero.
    pub fn rewrote_input(&self) -> bool {
        self.metrics.values().any(|count| *count > 0)
    }
}

impl Default for HygieneReport {
    fn default() -> Self {
        Self::new()
    }
}
