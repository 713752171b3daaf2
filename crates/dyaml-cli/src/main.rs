//! dyaml CLI - canonicalize, validate, normalize and compare Deterministic YAML.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod output;

use commands::normalize::Mode;
use commands::{check_drift, convert, diff, normalize, validate, Outcome};
use config::Config;
use error::CliError;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "DYAML_LOG";

#[derive(Parser)]
#[command(name = "dyaml")]
#[command(version)]
#[command(about = "Deterministic YAML canonicalizer, validator and drift checker")]
struct Cli {
    /// Configuration file (default: ./dyaml.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert YAML to canonical Deterministic YAML
    Convert {
        /// Input files (stdin if none, or `-`)
        inputs: Vec<PathBuf>,
        /// Output file, or directory when converting several inputs
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write `<stem>.d.yaml` next to each input
        #[arg(long, conflicts_with = "output")]
        in_place: bool,
        /// Drop comments instead of keeping them as annotations
        #[arg(long)]
        strip_annotations: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check files against the canonical form
    Validate {
        /// Files to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Report stylistic findings as errors
        #[arg(long)]
        strict: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rewrite files into canonical form
    Normalize {
        /// Files to normalize (stdin if none)
        files: Vec<PathBuf>,
        /// Exit non-zero if any file is not already canonical
        #[arg(long, conflicts_with = "in_place")]
        check: bool,
        /// Overwrite files in place
        #[arg(long)]
        in_place: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show structural differences between two documents
    Diff {
        /// First document
        a: PathBuf,
        /// Second document
        b: PathBuf,
        /// Ignore annotation changes
        #[arg(long)]
        no_annotations: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Flag changes that contradict the baseline's annotations
    CheckDrift {
        /// Changed document
        candidate: PathBuf,
        /// Document the change is checked against
        baseline: PathBuf,
        /// Only report annotation changes
        #[arg(long)]
        human_only: bool,
        /// Exit non-zero when a change contradicts an annotation
        #[arg(long)]
        fail_on_contradiction: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<Outcome, CliError> {
    let config = Config::resolve(cli.config.as_deref())?;
    init_tracing(&config);

    let strip = !config.preserve_annotations;
    match cli.command {
        Commands::Convert {
            inputs,
            output,
            in_place,
            strip_annotations,
            json,
        } => convert::run(
            inputs,
            output,
            in_place,
            strip_annotations || strip,
            json || config.json,
        ),
        Commands::Validate {
            files,
            strict,
            json,
        } => validate::run(files, strict || config.strict, json || config.json),
        Commands::Normalize {
            files,
            check,
            in_place,
            json,
        } => {
            let mode = if check {
                Mode::Check
            } else if in_place {
                Mode::InPlace
            } else {
                Mode::Print
            };
            normalize::run(files, mode, strip, json || config.json)
        }
        Commands::Diff {
            a,
            b,
            no_annotations,
            json,
        } => diff::run(&a, &b, no_annotations, json || config.json),
        Commands::CheckDrift {
            candidate,
            baseline,
            human_only,
            fail_on_contradiction,
            json,
        } => check_drift::run(
            &candidate,
            &baseline,
            human_only,
            fail_on_contradiction,
            json || config.json,
        ),
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
