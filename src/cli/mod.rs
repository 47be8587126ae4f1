//! Command-line parsing for the interior predictor.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! inference pipeline. Each subcommand corresponds to one request shape.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_SAMPLE_NUM, DEFAULT_TIMES};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "exo",
    version,
    about = "Predictive distributions of planetary interior structure"
)]
pub struct Cli {
    /// Verbosity of diagnostics written to stderr.
    #[arg(long, global = true, default_value_t = tracing::Level::WARN)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict from point values: `{"Mass": [..], "Radius": [..], ...}`.
    Predict(RequestArgs),
    /// Predict from values with standard deviations, propagating them by Monte Carlo.
    ///
    /// Request shape: `{"Mass": {"value": [..], "std": [..]}, ...}`.
    Gaussian(GaussianArgs),
    /// Predict for every row of a CSV or JSON matrix file.
    File(FileArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Directory holding `x_scaler.json`, `y_scaler.json`, `model.json` (and optionally `schema.json`).
    ///
    /// Falls back to `EXO_ARTIFACTS_DIR`.
    #[arg(long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,

    /// Stochastic forward passes per feature row, unless the request sets `Times`.
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMES)]
    pub times: usize,

    /// Seed for reproducible sampling (default: OS entropy).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the JSON response here instead of stdout.
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print per-record mean/std/percentiles to stderr.
    #[arg(long)]
    pub summary: bool,
}

/// Options for JSON point-value requests.
#[derive(Debug, Args, Clone)]
pub struct RequestArgs {
    /// Request JSON file (`-` reads stdin).
    #[arg(short = 'r', long, value_name = "JSON")]
    pub request: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options for JSON value/std requests.
#[derive(Debug, Args, Clone)]
pub struct GaussianArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Monte Carlo draws per record, unless the request sets `sample_num`.
    #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLE_NUM)]
    pub sample_num: usize,
}

/// Options for file-mode requests.
#[derive(Debug, Args, Clone)]
pub struct FileArgs {
    /// Input matrix (`.csv` with a header row, or `.json` 2-D array).
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}
