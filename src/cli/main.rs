//! OME-XML metadata validation CLI
//!
//! Command-line interface for checking and repairing the channel metadata of
//! OME-XML files.

use super::config::CliConfigBuilder;
use crate::config::ValidationConfig;
use crate::model::MetadataModel;
use crate::tracing_config::{events, init_cli_tracing, TracingFormat};
use crate::validation::{ConsistencyValidator, ModelValidationReport, ValidationOutcome};
use crate::version::model_version;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// File extensions treated as OME-XML documents
const OME_EXTENSIONS: [&str; 2] = ["xml", "ome"];

/// OME-XML channel metadata validator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "ome-validate")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input OME-XML files or directories
    #[arg(value_name = "INPUT", required = true)]
    pub input: Vec<PathBuf>,

    /// Repair inconsistent images instead of only reporting them
    #[arg(short, long)]
    pub correct: bool,

    /// Stop at the first image that cannot be repaired (requires --correct)
    #[arg(long)]
    pub fail_fast: bool,

    /// TOML file with validation settings; flags override it
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Process directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Pattern for files inside directories (e.g., "*.ome.xml")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Print a JSON report to stdout
    #[arg(long)]
    pub json: bool,

    /// Write each (corrected) model as JSON into this directory
    #[arg(long, value_name = "DIR")]
    pub dump_model: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => TracingFormat::Console,
            CliLogFormat::Compact => TracingFormat::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => TracingFormat::Json,
        }
    }
}

/// Result of validating one file
#[derive(Debug, Serialize)]
struct FileReport {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ModelValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Set when fail-fast stopped the run at this file
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    aborted: bool,
}

impl FileReport {
    fn is_valid(&self) -> bool {
        self.error.is_none() && self.report.as_ref().is_some_and(ModelValidationReport::is_valid)
    }
}

/// Report for a whole run
#[derive(Debug, Serialize)]
struct RunReport {
    generated_at: DateTime<Utc>,
    model_version: &'static str,
    correct: bool,
    files: Vec<FileReport>,
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();

    init_cli_tracing(cli.verbose, cli.log_format.into())
        .context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    let files = collect_inputs(&cli)?;
    if files.is_empty() {
        warn!("No OME-XML files found in the provided inputs");
        return Ok(());
    }
    info!(file_count = files.len(), correct = config.correct, "Validating OME-XML files");

    if let Some(dir) = &cli.dump_model {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let start_time = Instant::now();
    let validator = ConsistencyValidator::new(config.clone());
    let mut reports = Vec::with_capacity(files.len());
    let mut aborted_at = None;
    for path in &files {
        let report = process_file(path, &validator, cli.dump_model.as_deref())?;
        print_summary(&report, cli.json);
        let aborted = report.aborted;
        reports.push(report);
        if aborted {
            warn!(file = %path.display(), "Stopping at the first uncorrectable image");
            aborted_at = Some(path);
            break;
        }
    }

    let invalid = reports.iter().filter(|r| !r.is_valid()).count();
    let reports_len = reports.len();
    info!(
        files = reports_len,
        invalid,
        elapsed_s = start_time.elapsed().as_secs_f64(),
        "Validation finished"
    );

    if cli.json {
        let run = RunReport {
            generated_at: Utc::now(),
            model_version: model_version(),
            correct: config.correct,
            files: reports,
        };
        let text = serde_json::to_string_pretty(&run).context("Failed to serialize report")?;
        println!("{text}");
    }

    if let Some(path) = aborted_at {
        anyhow::bail!(
            "Stopped at an uncorrectable image in {} after {} of {} file(s)",
            path.display(),
            reports_len,
            files.len()
        );
    }
    if invalid > 0 {
        anyhow::bail!("{} of {} file(s) contain invalid metadata", invalid, files.len());
    }
    Ok(())
}

/// Load, validate and optionally dump one file. Load errors are recorded in
/// the report. Under fail-fast an uncorrectable image is recorded as the
/// file's error and the report is marked as aborted; every image still gets
/// an outcome and nothing is dumped.
fn process_file(
    path: &Path,
    validator: &ConsistencyValidator,
    dump_dir: Option<&Path>,
) -> Result<FileReport> {
    let mut model = match MetadataModel::from_path(path) {
        Ok(model) => model,
        Err(e) => {
            events::error_with_context(&e, &path.display().to_string());
            return Ok(FileReport {
                path: path.to_path_buf(),
                schema_version: None,
                report: None,
                error: Some(e.to_string()),
                aborted: false,
            });
        },
    };

    let fail_fast = validator.config().fail_fast;
    let collecting = ConsistencyValidator::new(ValidationConfig {
        fail_fast: false,
        ..validator.config().clone()
    });
    let report = collecting
        .validate_model(&mut model)
        .with_context(|| format!("Validation failed in {}", path.display()))?;

    if fail_fast {
        if let Err(e) = report.clone().into_result() {
            events::error_with_context(&e, &path.display().to_string());
            return Ok(FileReport {
                path: path.to_path_buf(),
                schema_version: model.schema_version,
                report: Some(report),
                error: Some(e.to_string()),
                aborted: true,
            });
        }
    }

    if let Some(dir) = dump_dir {
        let output = dump_path(dir, path);
        let json = serde_json::to_string_pretty(&model).context("Failed to serialize model")?;
        std::fs::write(&output, json)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        debug!(output = %output.display(), "Wrote model");
    }

    Ok(FileReport {
        path: path.to_path_buf(),
        schema_version: model.schema_version,
        report: Some(report),
        error: None,
        aborted: false,
    })
}

/// Human readable per-file summary on stderr; skipped for JSON output
fn print_summary(report: &FileReport, json: bool) {
    if json {
        return;
    }
    let path = report.path.display();
    if let Some(error) = &report.error {
        eprintln!("{path}: error: {error}");
    }
    let Some(model_report) = &report.report else {
        return;
    };
    for image in &model_report.images {
        let status = match &image.outcome {
            ValidationOutcome::Valid => "valid".to_string(),
            ValidationOutcome::Invalid(issues) => format!(
                "invalid: {}",
                issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
            ),
            ValidationOutcome::Corrected(corrections) => format!(
                "corrected: {}",
                corrections.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
            ),
            ValidationOutcome::Uncorrectable(reason) => format!("uncorrectable: {reason}"),
        };
        eprintln!("{path}: image {}: {status}", image.image);
    }
}

/// Collect OME-XML files from file and directory inputs, sorted
fn collect_inputs(cli: &Cli) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in &cli.input {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(find_ome_files(path, cli.recursive, cli.pattern.as_deref())?);
        } else {
            anyhow::bail!(
                "Input path does not exist or is not accessible: {}",
                path.display()
            );
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Find OME-XML files in a directory
fn find_ome_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).max_depth(max_depth) {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        let path = entry.path();
        if entry.file_type().is_file() && is_ome_file(path) && matches_pattern(path, pattern) {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Check if file is an OME-XML document based on extension
fn is_ome_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| OME_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Check if file matches the given pattern
fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    match pattern {
        Some(pat) => path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|filename| {
                glob::Pattern::new(pat)
                    .map(|p| p.matches(filename))
                    .unwrap_or(false)
            }),
        None => true,
    }
}

/// Output path for a dumped model: `<dir>/<file name>.json`
fn dump_path(dir: &Path, input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map_or_else(|| "model".into(), |n| n.to_string_lossy().into_owned());
    dir.join(format!("{name}.json"))
}
