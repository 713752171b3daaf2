//! Subcommand implementations and the helpers they share.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use dyaml_canonical::{CanonicalizationResult, Canonicalizer, Document};

use crate::error::{CliError, EXIT_FINDINGS};

pub mod check_drift;
pub mod convert;
pub mod diff;
pub mod normalize;
pub mod validate;

/// How a command finished when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report.
    Clean,
    /// Findings, differences or unnormalized files were reported.
    Findings,
}

impl Outcome {
    /// Process exit code.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Clean => 0,
            Outcome::Findings => EXIT_FINDINGS,
        }
    }

    /// `Findings` when `found` is true.
    pub fn from_findings(found: bool) -> Self {
        if found {
            Outcome::Findings
        } else {
            Outcome::Clean
        }
    }
}

/// Path label used for standard input.
pub const STDIN: &str = "-";

/// Reads a file, or standard input for `-`.
pub fn read_input(path: &Path) -> Result<String, CliError> {
    if path == Path::new(STDIN) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| CliError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        return Ok(buffer);
    }
    fs::read_to_string(path).map_err(|source| CliError::read(path.to_path_buf(), source))
}

/// Writes `contents` to `path`, creating parent directories.
pub fn write_output(path: &Path, contents: &str) -> Result<(), CliError> {
    let write_err = |source| CliError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}

/// Parses and canonicalizes text read from `path`.
pub fn canonicalize(
    path: &Path,
    text: &str,
    strip_annotations: bool,
) -> Result<CanonicalizationResult, CliError> {
    let document_err = |source: dyaml_canonical::Error| CliError::Document {
        path: path.to_path_buf(),
        source,
    };
    let document = Document::parse(text).map_err(|err| document_err(err.into()))?;
    Canonicalizer::new()
        .with_stripped_annotations(strip_annotations)
        .canonicalize_with_report(&document)
        .map_err(|(err, _)| document_err(err.into()))
}

/// Reads and canonicalizes one input.
pub fn load(path: &Path, strip_annotations: bool) -> Result<CanonicalizationResult, CliError> {
    let text = read_input(path)?;
    canonicalize(path, &text, strip_annotations)
}

/// Output file name for a converted input: `<stem>.d.yaml`.
pub fn converted_name(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stdin".to_string());
    let stem = stem.strip_suffix(".d").unwrap_or(&stem).to_string();
    PathBuf::from(format!("{stem}.d.yaml"))
}
