//! Regroup the flat stream of output draws into one collection per record.
//!
//! Rows arrive as `N` contiguous, equal-sized groups in record order (see
//! `features::sampling` and `models::model` for the ordering contracts), so
//! record `i` owns rows `[i * g, (i + 1) * g)` with `g = rows / N`.

use nalgebra::DMatrix;

use crate::domain::{ParamSchema, RecordDistribution, ResultMapping};
use crate::error::PipelineError;

/// Split `distribution` into `n_records` groups keyed by record index.
///
/// Fails with `PipelineError::Partition` when the rows cannot be divided
/// evenly; nothing is truncated or padded.
pub fn partition_records(
    distribution: &DMatrix<f64>,
    n_records: usize,
    schema: &ParamSchema,
) -> Result<ResultMapping, PipelineError> {
    let rows = distribution.nrows();
    if n_records == 0 || rows % n_records != 0 {
        return Err(PipelineError::Partition {
            rows,
            records: n_records,
        });
    }
    if distribution.ncols() != schema.output_len() {
        return Err(PipelineError::Inference(format!(
            "distribution has {} columns but {} output parameters are recognized",
            distribution.ncols(),
            schema.output_len()
        )));
    }

    let group = rows / n_records;
    let mut out = ResultMapping::new();
    for i in 0..n_records {
        let block = distribution.rows(i * group, group);
        let record: RecordDistribution = schema
            .outputs
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), block.column(idx).iter().copied().collect()))
            .collect();
        out.insert(i, record);
    }

    Ok(out)
}
