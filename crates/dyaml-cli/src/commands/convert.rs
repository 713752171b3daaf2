//! Convert command implementation.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use dyaml_canonical::{Digest, HygieneReport};

use super::{converted_name, load, write_output, Outcome, STDIN};
use crate::error::CliError;
use crate::output::format_json;

#[derive(Serialize)]
struct Converted {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    digest: Digest,
    report: HygieneReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

pub fn run(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    in_place: bool,
    strip_annotations: bool,
    json_output: bool,
) -> Result<Outcome, CliError> {
    let inputs = if inputs.is_empty() {
        vec![PathBuf::from(STDIN)]
    } else {
        inputs
    };

    let to_directory = output.as_deref().is_some_and(|o| o.is_dir()) || inputs.len() > 1;
    if inputs.len() > 1 && output.is_none() && !in_place {
        return Err(CliError::Usage(
            "multiple inputs require --output <directory> or --in-place".to_string(),
        ));
    }
    if in_place && inputs.iter().any(|i| i.as_os_str() == STDIN) {
        return Err(CliError::Usage(
            "--in-place needs file inputs, not standard input".to_string(),
        ));
    }

    let mut converted = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let result = load(input, strip_annotations)?;
        let target = if in_place {
            Some(input.with_file_name(converted_name(input)))
        } else {
            output.as_deref().map(|o| target_path(o, input, to_directory))
        };

        if let Some(target) = &target {
            write_output(target, &result.text)?;
            info!(input = %input.display(), output = %target.display(), "converted");
        } else if !json_output {
            print!("{}", result.text);
        }

        converted.push(Converted {
            file: input.display().to_string(),
            output: target.as_ref().map(|t| t.display().to_string()),
            digest: result.tree.digest(),
            text: target.is_none().then(|| result.text.clone()),
            report: result.report,
        });
    }

    if json_output {
        println!("{}", format_json(&converted)?);
    } else if output.is_some() || in_place {
        for entry in &converted {
            if let Some(target) = &entry.output {
                eprintln!("{} -> {}", entry.file, target);
            }
        }
    }
    Ok(Outcome::Clean)
}

fn target_path(output: &Path, input: &Path, to_directory: bool) -> PathBuf {
    if to_directory {
        output.join(converted_name(input))
    } else {
        output.to_path_buf()
    }
}
