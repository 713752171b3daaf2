//! Check-drift command implementation.
//!
//! Advisory by default: contradictions are reported but only change the exit
//! code with `--fail-on-contradiction`.

use std::path::Path;
use tracing::warn;

use dyaml_drift::{check_drift, drift_json, format_drift_report, DriftOptions};

use super::{load, Outcome};
use crate::error::CliError;

pub fn run(
    candidate: &Path,
    baseline: &Path,
    human_only: bool,
    fail_on_contradiction: bool,
    json_output: bool,
) -> Result<Outcome, CliError> {
    let candidate_tree = load(candidate, false)?.tree;
    let baseline_tree = load(baseline, false)?.tree;

    let report = check_drift(&candidate_tree, &baseline_tree, DriftOptions { human_only });
    for finding in report.contradictions() {
        warn!(path = %finding.change.path, "change contradicts annotation");
    }

    if json_output {
        println!("{}", drift_json(&report)?);
    } else {
        println!("{}", format_drift_report(&report));
    }
    Ok(Outcome::from_findings(
        fail_on_contradiction && report.contradiction_count() > 0,
    ))
}
