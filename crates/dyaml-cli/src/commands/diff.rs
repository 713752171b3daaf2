//! Diff command implementation.

use std::path::Path;

use dyaml_drift::{diff, diff_json, format_diff};

use super::{load, Outcome};
use crate::error::CliError;

pub fn run(a: &Path, b: &Path, no_annotations: bool, json_output: bool) -> Result<Outcome, CliError> {
    let before = load(a, no_annotations)?;
    let after = load(b, no_annotations)?;

    let changes = diff(&before.tree, &after.tree);
    if json_output {
        println!("{}", diff_json(&changes)?);
    } else {
        println!("{}", format_diff(&changes));
    }
    Ok(Outcome::from_findings(!changes.is_empty()))
}
