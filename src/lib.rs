//! ngffcheck: metadata and structure validation for OME-NGFF (OME-Zarr).
//!
//! ngffcheck checks OME-NGFF 0.4 and 0.5 hierarchies in two passes. The
//! metadata pass resolves each JSON document to one of seven node kinds and
//! checks every field. The structural pass walks the store and cross-checks
//! what the metadata references against what is actually there. Every
//! defect is collected, not just the first.
//!
//! # Modules
//!
//! - [`model`]: Typed metadata (Image, LabelImage, Plate, Well, ...)
//! - [`schema`]: Metadata validation, from untyped JSON to [`model`] types
//! - [`store`]: Read-only zarr stores (local, in-memory, HTTP)
//! - [`validation`]: Structural validation and the shared report types
//! - [`error`]: Error types for ngffcheck operations

pub mod error;
pub mod model;
pub mod schema;
pub mod store;
pub mod validation;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

pub use error::NgffError;

use schema::{MetadataValidator, SchemaTable};
use store::StoreOptions;
use validation::{StoreValidation, ValidateOptions, ValidationReport};

/// The ngffcheck CLI application.
#[derive(Parser)]
#[command(name = "ngffcheck")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate an OME-Zarr store or a single metadata document.
    Validate(ValidateArgs),
}

/// Output format for the report.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Store root (directory, file:// or http(s):// URI), or a .json/.zattrs
    /// metadata document to check without a store.
    uri: String,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Worker threads for independent wells and collection images.
    #[arg(long, env = "NGFFCHECK_JOBS", default_value_t = 1)]
    jobs: usize,

    /// Deepest nesting to descend into before reporting a cycle.
    #[arg(long, default_value_t = 16)]
    max_depth: usize,

    /// Do not warn about node names outside [A-Za-z0-9._-].
    #[arg(long, env = "NGFFCHECK_ALLOW_RISKY_NAMES")]
    allow_risky_names: bool,

    /// Per-request timeout in seconds for remote stores.
    #[arg(long, env = "NGFFCHECK_TIMEOUT", default_value_t = 30)]
    timeout: u64,
}

impl ValidateArgs {
    fn options(&self) -> ValidateOptions {
        ValidateOptions {
            strict: self.strict,
            jobs: self.jobs.max(1),
            max_depth: self.max_depth,
            allow_risky_names: self.allow_risky_names,
        }
    }
}

/// Run the ngffcheck CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), NgffError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("ngffcheck {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Metadata and structure validator for OME-NGFF (OME-Zarr).");
            println!();
            println!("Run 'ngffcheck --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), NgffError> {
    let opts = args.options();
    let outcome = if is_metadata_file(&args.uri) {
        debug!(path = %args.uri, "validating metadata document only");
        validate_metadata_file(Path::new(&args.uri), &opts)?
    } else {
        let store = store::open_store(
            &args.uri,
            &StoreOptions {
                timeout: Duration::from_secs(args.timeout),
            },
        )?;
        validation::validate_store(store.as_ref(), &opts)?
    };

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome).map_err(|source| {
                NgffError::JsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{}", json);
        }
        OutputFormat::Text => print_text(&args.uri, &outcome, &opts),
    }

    if opts.passes(&outcome.report) {
        Ok(())
    } else {
        Err(NgffError::ValidationFailed {
            error_count: outcome.report.error_count(),
            warning_count: outcome.report.warning_count(),
            report: outcome.report,
        })
    }
}

fn print_text(uri: &str, outcome: &StoreValidation, opts: &ValidateOptions) {
    if opts.passes(&outcome.report) {
        let version = outcome
            .version
            .map_or_else(|| "unknown".to_string(), |v| v.to_string());
        let kind = outcome
            .kind
            .map_or_else(|| "unknown".to_string(), |k| k.to_string());
        println!("Validation passed: {} is OME-NGFF {} {}", uri, version, kind);
        if !outcome.report.is_clean() {
            println!();
            print!("{}", outcome.report);
        }
    } else {
        print!("{}", outcome.report);
    }
}

fn is_metadata_file(uri: &str) -> bool {
    let path = Path::new(uri);
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".json") || name == ".zattrs")
}

/// Validates a standalone metadata document, without a store.
fn validate_metadata_file(path: &Path, opts: &ValidateOptions) -> Result<StoreValidation, NgffError> {
    let raw = model::io_json::read_json_file(path)?;
    let table = SchemaTable::new();
    let validator = MetadataValidator::new(&table).allow_risky_names(opts.allow_risky_names);
    Ok(match validator.validate_document(&raw) {
        Ok(validated) => StoreValidation {
            version: Some(validated.value.version),
            kind: Some(validated.value.kind()),
            report: validated.warnings,
        },
        Err(report) => StoreValidation {
            version: None,
            kind: None,
            report: with_fs_path(report, path),
        },
    })
}

fn with_fs_path(report: ValidationReport, path: &Path) -> ValidationReport {
    let fs_path = path.display().to_string();
    let mut tagged = ValidationReport::new();
    for issue in report.issues {
        tagged.add(issue.with("fs_path", fs_path.clone()));
    }
    tagged
}
