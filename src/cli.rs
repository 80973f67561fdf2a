use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;

use crate::config;
use crate::models::InputDocument;
use crate::scoring::{AnalysisReport, DefaultRiskEngine, RiskEngine, ScoringError, ScoringReferenceData};

/// Score lab biomarker panels and detect multi-marker patterns.
#[derive(Parser, Debug)]
#[command(name = "labrisk", version, about, long_about = None)]
pub struct Cli {
    /// JSON input: a `{"patients": [...]}` batch or a single patient object.
    #[arg(required_unless_present = "export_reference")]
    pub input: Option<PathBuf>,

    /// Directory with category_weights.json, risk_breakpoints.json and pattern_catalog.json
    #[arg(long, env = "LABRISK_REFERENCE_DIR")]
    pub reference_dir: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Single-line JSON output
    #[arg(long)]
    pub compact: bool,

    /// Write the reference tables in effect to DIR as editable JSON, then exit
    #[arg(long, value_name = "DIR")]
    pub export_reference: Option<PathBuf>,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid input JSON: {0}")]
    Input(#[source] serde_json::Error),

    #[error("Cannot serialize report: {0}")]
    Output(#[source] serde_json::Error),

    #[error("No input file given")]
    MissingInput,

    #[error(transparent)]
    Reference(#[from] ScoringError),
}

/// Execute one CLI invocation end to end.
pub fn run(cli: &Cli) -> Result<AnalysisReport, CliError> {
    let input = cli.input.as_deref().ok_or(CliError::MissingInput)?;
    let reference = load_reference(cli.reference_dir.as_deref())?;
    let engine = DefaultRiskEngine::new(reference);

    let raw = std::fs::read_to_string(input).map_err(|source| CliError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let patients = parse_input(&raw)?;
    tracing::info!(input = %input.display(), patients = patients.len(), "Input loaded");

    let report = engine.analyze_batch(&patients);
    let rendered = render(&report, cli.compact)?;

    match &cli.output {
        Some(path) => std::fs::write(path, rendered).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{rendered}").map_err(|source| CliError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            })?;
        }
    }

    Ok(report)
}

/// Write the tables `run` would score against into `dir`, creating it.
pub fn export_reference(cli: &Cli, dir: &Path) -> Result<(), CliError> {
    let reference = load_reference(cli.reference_dir.as_deref())?;
    std::fs::create_dir_all(dir).map_err(|source| CliError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    reference.write_to(dir)?;
    tracing::info!(dir = %dir.display(), "Reference tables exported");
    Ok(())
}

/// An explicit directory must load cleanly. Otherwise the user-level
/// directory is tried, falling back to the built-in tables.
pub fn load_reference(explicit: Option<&Path>) -> Result<ScoringReferenceData, CliError> {
    if let Some(dir) = explicit {
        return Ok(ScoringReferenceData::load(dir)?);
    }
    Ok(match config::existing_reference_dir() {
        Some(dir) => ScoringReferenceData::load_or_builtin(&dir),
        None => {
            tracing::info!("No reference directory, using built-in tables");
            ScoringReferenceData::builtin()
        }
    })
}

pub fn parse_input(raw: &str) -> Result<Vec<crate::models::PatientInput>, CliError> {
    InputDocument::from_json(raw)
        .map(InputDocument::into_patients)
        .map_err(CliError::Input)
}

pub fn render(report: &AnalysisReport, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(report)
    } else {
        serde_json::to_string_pretty(report)
    };
    rendered.map_err(CliError::Output)
}
