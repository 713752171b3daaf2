//! Validate command implementation.

use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use dyaml_canonical::validation;
use dyaml_canonical::{ValidationFinding, ValidationReport};

use super::{read_input, Outcome};
use crate::error::CliError;
use crate::output::{format_json, format_summary_row, format_validation, print_summary_header};

#[derive(Serialize)]
struct FileResult {
    file: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    findings: Option<Vec<ValidationFinding>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct Summary {
    valid: bool,
    files: Vec<FileResult>,
}

pub fn run(files: Vec<PathBuf>, strict: bool, json_output: bool) -> Result<Outcome, CliError> {
    let mut results = Vec::with_capacity(files.len());
    let mut reports: Vec<(String, Option<ValidationReport>)> = Vec::with_capacity(files.len());
    for file in &files {
        let text = read_input(file)?;
        let label = file.display().to_string();
        let result = match validation::validate(&text, strict) {
            Ok(report) => {
                debug!(file = %label, findings = report.findings.len(), "validated");
                if !json_output {
                    println!("{}", format_validation(&label, &report));
                }
                let result = FileResult {
                    file: label.clone(),
                    valid: report.is_valid(),
                    findings: Some(report.findings.clone()),
                    error: None,
                };
                reports.push((label, Some(report)));
                result
            }
            Err(err) => {
                if !json_output {
                    println!("[FAIL] {label}\n  error   {err}");
                }
                reports.push((label.clone(), None));
                FileResult {
                    file: label,
                    valid: false,
                    findings: None,
                    error: Some(err.to_string()),
                }
            }
        };
        results.push(result);
    }

    let valid = results.iter().all(|r| r.valid);
    if json_output {
        let summary = Summary {
            valid,
            files: results,
        };
        println!("{}", format_json(&summary)?);
    } else if files.len() > 1 {
        println!();
        print_summary_header();
        for (file, report) in &reports {
            println!("{}", format_summary_row(file, report.as_ref()));
        }
    }
    Ok(Outcome::from_findings(!valid))
}
