//! CLI error type and exit-code mapping.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for rejected documents and findings.
pub const EXIT_FINDINGS: i32 = 1;
/// Exit code for invalid invocations (matches clap's usage errors).
pub const EXIT_USAGE: i32 = 2;
/// Exit code for a missing input file.
pub const EXIT_NOT_FOUND: i32 = 3;

/// Failure of a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// An input file does not exist.
    #[error("{}: file not found", path.display())]
    NotFound {
        /// Missing path.
        path: PathBuf,
    },
    /// An input could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Input path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// An output could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A document was malformed or rejected.
    #[error("{}: {source}", path.display())]
    Document {
        /// Input path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: dyaml_canonical::Error,
    },
    /// The configuration file is malformed.
    #[error("invalid configuration {}: {reason}", path.display())]
    Config {
        /// Configuration path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
    /// JSON rendering failed.
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Flags that cannot be combined.
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => EXIT_NOT_FOUND,
            CliError::Usage(_) => EXIT_USAGE,
            _ => EXIT_FINDINGS,
        }
    }

    /// Maps an I/O error on `path`, keeping "not found" distinct.
    pub fn read(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            CliError::NotFound { path }
        } else {
            CliError::Read { path, source }
        }
    }
}
