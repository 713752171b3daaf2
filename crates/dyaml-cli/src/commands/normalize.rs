//! Normalize command implementation.

use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use dyaml_canonical::{Digest, HygieneReport};

use super::{canonicalize, read_input, write_output, Outcome, STDIN};
use crate::error::CliError;
use crate::output::format_json;

/// What to do with the canonical text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print it.
    Print,
    /// Only report files that differ from it.
    Check,
    /// Overwrite files that differ from it.
    InPlace,
}

#[derive(Serialize)]
struct Normalized {
    file: String,
    normalized: bool,
    digest: Digest,
    report: HygieneReport,
}

pub fn run(
    files: Vec<PathBuf>,
    mode: Mode,
    strip_annotations: bool,
    json_output: bool,
) -> Result<Outcome, CliError> {
    let files = if files.is_empty() {
        vec![PathBuf::from(STDIN)]
    } else {
        files
    };
    if mode == Mode::InPlace && files.iter().any(|f| f.as_os_str() == STDIN) {
        return Err(CliError::Usage(
            "--in-place cannot rewrite standard input".to_string(),
        ));
    }

    let mut entries = Vec::with_capacity(files.len());
    for file in &files {
        let text = read_input(file)?;
        let result = canonicalize(file, &text, strip_annotations)?;
        let normalized = result.text == text;
        let label = file.display().to_string();

        match mode {
            Mode::Print if !json_output => {
                if files.len() > 1 {
                    println!("# {label}");
                }
                print!("{}", result.text);
            }
            Mode::Check if !json_output && !normalized => {
                println!("{label}: not normalized");
            }
            Mode::InPlace if !normalized => {
                write_output(file, &result.text)?;
                info!(file = %label, "rewrote");
                if !json_output {
                    println!("{label}: normalized");
                }
            }
            _ => {}
        }

        entries.push(Normalized {
            file: label,
            normalized,
            digest: result.tree.digest(),
            report: result.report,
        });
    }

    if json_output {
        println!("{}", format_json(&entries)?);
    }

    let pending = entries.iter().any(|e| !e.normalized);
    Ok(Outcome::from_findings(mode == Mode::Check && pending))
}
