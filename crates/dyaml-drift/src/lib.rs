//! Structural diff and annotation drift detection over canonical trees.
//!
//! Both operations take [`dyaml_canonical::CanonicalTree`] values, so their
//! inputs are always in canonical form.
//!
#![deny(missing_docs)]

/// Lock-step structural diff.
pub mod differ;
/// Annotation-aware drift detection.
pub mod drift;
/// Text and JSON renderings.
pub mod report;

pub use differ::{diff, ChangeKind, ChangeRecord};
pub use drift::{check_drift, DriftFinding, DriftOptions, DriftReason, DriftReport};
pub use report::{diff_json, drift_json, format_diff, format_drift_report};
