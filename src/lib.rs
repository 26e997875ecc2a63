//! labelstate: the state engine behind an interactive annotation editor.
//!
//! An [`Annotation`](annotation::Annotation) owns regions (shapes on an
//! image, audio track, text or video plus their label results), the
//! relations between them and a snapshot history for undo/redo. Drawing
//! tools turn pointer events into regions, and the whole state converts to
//! and from the portable result array.
//!
//! # Modules
//!
//! - [`model`]: Ids, coordinate spaces, geometry, regions and results
//! - [`serialize`]: The result array wire format, import and export
//! - [`relations`]: Directed, labelled links between regions
//! - [`history`]: Snapshot undo/redo stack
//! - [`annotation`]: The annotation aggregate and the per-task session
//! - [`tools`]: Drawing and selection tools
//! - [`comments`]: Comments and draft autosave over a persistence gateway
//! - [`validation`]: Result array validation and error reporting
//! - [`config`]: Engine options
//! - [`error`]: Error types for labelstate operations

pub mod annotation;
pub mod comments;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod relations;
pub mod serialize;
pub mod tools;
pub mod validation;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

pub use error::{GatewayError, LabelError};

use annotation::Annotation;
use model::{AcceptAll, AnnotationId, ControlResolver, LabelConfig};

/// The labelstate CLI application.
#[derive(Parser)]
#[command(name = "labelstate")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate a result array for errors and warnings.
    Validate(ValidateArgs),
    /// Load a result array into an annotation and write it back out.
    Normalize(NormalizeArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Result array (or an object with a `result` array) to validate.
    input: PathBuf,

    /// Label config (JSON or YAML). Without it every control is accepted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value = "text")]
    output: ReportFormat,
}

/// Arguments for the normalize subcommand.
#[derive(clap::Args)]
struct NormalizeArgs {
    /// Result array to load.
    input: PathBuf,

    /// Where to write the re-exported result array.
    #[arg(long)]
    out: PathBuf,

    /// Label config (JSON or YAML). Without it every control is accepted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engine options (JSON or YAML).
    #[arg(long)]
    options: Option<PathBuf>,
}

/// Run the labelstate CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Normalize(args)) => run_normalize(args),
        None => {
            println!("labelstate {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Annotation state engine and result array tools.");
            println!();
            println!("Run 'labelstate --help' for usage information.");
            Ok(())
        }
    }
}

fn load_resolver(config: Option<&Path>) -> Result<Box<dyn ControlResolver>, LabelError> {
    match config {
        Some(path) => {
            let config = LabelConfig::load(path)?;
            for (name, count) in config.duplicate_names() {
                tracing::warn!(name, count, "name declared more than once in label config");
            }
            Ok(Box::new(config))
        }
        None => Ok(Box::new(AcceptAll)),
    }
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), LabelError> {
    let entries = serialize::read_result_file(&args.input)?;
    let resolver = load_resolver(args.config.as_deref())?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_results(&entries, resolver.as_ref(), &opts);

    match args.output {
        ReportFormat::Json => {
            let json = serde_json::json!({
                "error_count": report.error_count(),
                "warning_count": report.warning_count(),
                "issues": &report.issues,
            });
            let text = serde_json::to_string_pretty(&json).map_err(|source| {
                LabelError::ResultJsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{}", text);
        }
        ReportFormat::Text => print!("{}", report),
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(LabelError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the normalize subcommand.
fn run_normalize(args: NormalizeArgs) -> Result<(), LabelError> {
    let entries = serialize::read_result_file(&args.input)?;
    let resolver = load_resolver(args.config.as_deref())?;
    let options = match args.options.as_deref() {
        Some(path) => config::EngineOptions::load(path)?,
        None => config::EngineOptions::default(),
    };

    let import = serialize::from_results(&entries, resolver.as_ref());
    for mismatch in &import.mismatches {
        eprintln!("dropped: {}", mismatch);
    }
    let dropped = import.mismatches.len();

    let annotation = Annotation::from_import(AnnotationId::new(1), import, &options);
    let out = annotation.serialize();
    serialize::write_result_file(&args.out, &out)?;

    eprintln!(
        "Normalized {} region(s), {} relation(s) from {} result(s); {} dropped.",
        annotation.regions().len(),
        annotation.relations().len(),
        entries.len(),
        dropped
    );
    Ok(())
}
