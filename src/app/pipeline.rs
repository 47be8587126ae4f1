//! Shared inference pipeline used by every front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! assemble features -> scale -> sample the model -> unscale -> reconcile units -> partition
//!
//! Front-ends only decode requests and serialize the returned `ResultMapping`.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info};

use crate::domain::{InferenceConfig, InputBatch, ParamSchema, ResultMapping};
use crate::error::PipelineError;
use crate::features::assemble_features;
use crate::models::DistributionalModel;
use crate::report::{partition_records, reconcile_units};
use crate::scaling::Scaler;

/// Read-only collaborators for one inference call.
///
/// These are loaded once per process and only borrowed here, so any number of
/// requests may share them.
#[derive(Clone, Copy)]
pub struct Components<'a> {
    pub schema: &'a ParamSchema,
    pub x_scaler: &'a dyn Scaler,
    pub y_scaler: &'a dyn Scaler,
    pub model: &'a dyn DistributionalModel,
}

/// All computed outputs of a single inference call.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub predictions: ResultMapping,
    /// Number of original records.
    pub records: usize,
    /// Rows fed to the model (records, or records * sample_num).
    pub feature_rows: usize,
    /// Draws reported per record and output parameter.
    pub group_size: usize,
}

/// Run the pipeline with a request-local RNG.
///
/// The RNG is seeded from `config.seed` when present, else from OS entropy.
pub fn run_inference(
    components: Components<'_>,
    batch: &InputBatch,
    config: &InferenceConfig,
) -> Result<RunOutput, PipelineError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    run_inference_with_rng(components, batch, config, &mut rng)
}

/// Run the pipeline with a caller-owned RNG.
///
/// The same generator feeds the Monte Carlo input sampling and the model's
/// replicate draws.
pub fn run_inference_with_rng<R: RngCore>(
    components: Components<'_>,
    batch: &InputBatch,
    config: &InferenceConfig,
    rng: &mut R,
) -> Result<RunOutput, PipelineError> {
    config.validate(batch)?;
    let schema = components.schema;
    let records = batch.len();

    // 1) Feature matrix in schema column order.
    let features = assemble_features(batch, schema, config.sample_num, rng)?;
    let feature_rows = features.nrows();
    debug!(rows = feature_rows, cols = features.ncols(), gaussian = batch.is_gaussian(), "features assembled");

    // 2) Raw -> model space.
    let x = components.x_scaler.forward(&features)?;

    // 3) Replicate draws.
    let prediction = components
        .model
        .predict_distribution(&x, config.times, rng)
        .map_err(into_inference_error)?;
    let raw = prediction.distribution;
    debug!(rows = raw.nrows(), cols = raw.ncols(), times = config.times, "distribution sampled");

    if raw.ncols() != schema.output_len() {
        return Err(PipelineError::Inference(format!(
            "model returned {} output columns, expected {}",
            raw.ncols(),
            schema.output_len()
        )));
    }
    // Row counts that cannot be split per record are reported by the partitioner.
    let expected_rows = feature_rows * config.times;
    if raw.nrows() % records == 0 && raw.nrows() != expected_rows {
        return Err(PipelineError::Inference(format!(
            "model returned {} rows, expected {feature_rows} feature rows x {} replicates = {expected_rows}",
            raw.nrows(),
            config.times
        )));
    }

    // 4) Model space -> physical units.
    let mut distribution = components.y_scaler.inverse(&raw)?;
    reconcile_units(&mut distribution, schema);

    // 5) One group of draws per original record.
    let predictions = partition_records(&distribution, records, schema)?;
    let group_size = distribution.nrows() / records;

    info!(records, feature_rows, group_size, "inference complete");

    Ok(RunOutput {
        predictions,
        records,
        feature_rows,
        group_size,
    })
}

fn into_inference_error(err: PipelineError) -> PipelineError {
    match err {
        PipelineError::Inference(_) => err,
        other => PipelineError::Inference(other.to_string()),
    }
}
