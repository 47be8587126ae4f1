//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs the stderr log subscriber
//! - loads the fitted artifacts
//! - decodes the request into an `InputBatch`
//! - runs the inference pipeline
//! - writes the JSON response (and an optional summary)

use std::io::Read;
use std::path::Path;

use clap::Parser;
use serde_json::Value;
use tracing::info;

use crate::cli::{Command, CommonArgs, FileArgs, GaussianArgs, RequestArgs};
use crate::domain::{DEFAULT_SAMPLE_NUM, InferenceConfig, InputBatch};
use crate::error::AppError;
use crate::io::{
    Artifacts, PredictionResponse, load_matrix, parse_gaussian_request, parse_plain_request,
    resolve_artifacts_dir, write_response,
};

pub mod pipeline;

/// Entry point for the `exo` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_tracing(cli.log_level);

    match cli.command {
        Command::Predict(args) => handle_predict(args),
        Command::Gaussian(args) => handle_gaussian(args),
        Command::File(args) => handle_file(args),
    }
}

fn init_tracing(level: tracing::Level) {
    // A host may already have installed a subscriber.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_predict(args: RequestArgs) -> Result<(), AppError> {
    let artifacts = load_artifacts(&args.common)?;
    let json = read_request(&args.request)?;
    let decoded = parse_plain_request(&json, &artifacts.schema)?;

    let config = inference_config(&args.common, decoded.times, None, DEFAULT_SAMPLE_NUM);
    predict_and_write(&artifacts, &decoded.batch, &config, &args.common)
}

fn handle_gaussian(args: GaussianArgs) -> Result<(), AppError> {
    let common = &args.request.common;
    let artifacts = load_artifacts(common)?;
    let json = read_request(&args.request.request)?;
    let decoded = parse_gaussian_request(&json, &artifacts.schema)?;

    let config = inference_config(common, decoded.times, decoded.sample_num, args.sample_num);
    predict_and_write(&artifacts, &decoded.batch, &config, common)
}

fn handle_file(args: FileArgs) -> Result<(), AppError> {
    let artifacts = load_artifacts(&args.common)?;
    let matrix = load_matrix(&args.input, &artifacts.schema)?;
    info!(path = %args.input.display(), rows = matrix.nrows(), "input file decoded");

    let batch = InputBatch::File(matrix);
    let config = inference_config(&args.common, None, None, DEFAULT_SAMPLE_NUM);
    predict_and_write(&artifacts, &batch, &config, &args.common)
}

fn predict_and_write(
    artifacts: &Artifacts,
    batch: &InputBatch,
    config: &InferenceConfig,
    common: &CommonArgs,
) -> Result<(), AppError> {
    let run = pipeline::run_inference(artifacts.components(), batch, config)?;

    if common.summary {
        eprint!("{}", crate::report::format_summary(&run.predictions, &artifacts.schema));
    }

    let response = PredictionResponse::new(batch, &run.predictions);
    write_response(common.output.as_deref(), &response)
}

fn load_artifacts(common: &CommonArgs) -> Result<Artifacts, AppError> {
    let dir = resolve_artifacts_dir(common.artifacts.as_deref())?;
    Artifacts::load(&dir)
}

/// Merge per-request overrides with CLI defaults.
///
/// Precedence: request field, then CLI flag (which carries the built-in default).
pub fn inference_config(
    common: &CommonArgs,
    request_times: Option<usize>,
    request_sample_num: Option<usize>,
    cli_sample_num: usize,
) -> InferenceConfig {
    InferenceConfig {
        times: request_times.unwrap_or(common.times),
        sample_num: request_sample_num.unwrap_or(cli_sample_num),
        seed: common.seed,
    }
}

/// Read a request JSON document from a file, or stdin for `-`.
fn read_request(path: &Path) -> Result<Value, AppError> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| AppError::new(2, format!("Failed to read request from stdin: {e}")))?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| AppError::new(2, format!("Failed to read request '{}': {e}", path.display())))?
    };
    serde_json::from_str(&text).map_err(|e| AppError::new(2, format!("Invalid request JSON: {e}")))
}
