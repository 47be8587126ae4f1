//! Shared domain types.
//!
//! Everything here is created fresh per request and dropped once the
//! `ResultMapping` is handed back; the only long-lived value is the
//! `ParamSchema`, which is immutable after construction.

use std::collections::{BTreeMap, HashSet};

use nalgebra::DMatrix;
use serde::Deserialize;

use crate::error::PipelineError;

/// Default number of stochastic forward passes per feature row.
pub const DEFAULT_TIMES: usize = 10;

/// Default number of Monte Carlo draws per record in uncertainty mode.
pub const DEFAULT_SAMPLE_NUM: usize = 10;

/// Factor applied to milli-unit output columns before they are reported.
pub const MILLI_FACTOR: f64 = 1000.0;

/// Ordered input/output parameter names the model and scalers were fitted with.
///
/// Column `j` of every feature matrix is `inputs[j]`; column `j` of every
/// predictive distribution is `outputs[j]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParamSchema {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    /// Output columns natively produced in units 1000x the reported ones.
    #[serde(default)]
    pub milli_outputs: Vec<String>,
}

impl ParamSchema {
    pub fn new<I, O, S>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            milli_outputs: Vec::new(),
        }
    }

    pub fn with_milli_outputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.milli_outputs = names.into_iter().map(Into::into).collect();
        self
    }

    /// The planetary interior schema: mass, radius and two abundance ratios in,
    /// layer fractions plus core-mantle boundary pressure/temperature out.
    pub fn planetary() -> Self {
        Self::new(
            ["Mass", "Radius", "Fe/Mg", "Si/Mg"],
            ["WRF", "MRF", "CRF", "WMF", "CMF", "PRS_CMB", "TEP_CMB"],
        )
        .with_milli_outputs(["PRS_CMB", "TEP_CMB"])
    }

    pub fn input_len(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_len(&self) -> usize {
        self.outputs.len()
    }

    /// Indices of the output columns divided by `MILLI_FACTOR`.
    pub fn milli_columns(&self) -> Vec<usize> {
        self.outputs
            .iter()
            .enumerate()
            .filter(|(_, name)| self.milli_outputs.contains(name))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Reject empty, duplicated or dangling parameter names.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.inputs.is_empty() || self.outputs.is_empty() {
            return Err(PipelineError::InvalidArgument(
                "schema needs at least one input and one output parameter".to_string(),
            ));
        }
        for (side, names) in [("input", &self.inputs), ("output", &self.outputs)] {
            let mut seen = HashSet::new();
            if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
                return Err(PipelineError::InvalidArgument(format!(
                    "duplicate {side} parameter `{dup}` in schema"
                )));
            }
        }
        if let Some(name) = self.milli_outputs.iter().find(|n| !self.outputs.contains(n)) {
            return Err(PipelineError::InvalidArgument(format!(
                "milli-unit column `{name}` is not an output parameter"
            )));
        }
        Ok(())
    }
}

impl Default for ParamSchema {
    fn default() -> Self {
        Self::planetary()
    }
}

/// A measured value with an optional standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub std: Option<f64>,
}

impl Measurement {
    pub fn exact(value: f64) -> Self {
        Self { value, std: None }
    }

    pub fn with_std(value: f64, std: f64) -> Self {
        Self {
            value,
            std: Some(std),
        }
    }
}

/// One record in plain mode: parameter name -> value.
pub type PlainRecord = BTreeMap<String, f64>;

/// One record in uncertainty mode: parameter name -> (value, std).
pub type UncertainRecord = BTreeMap<String, Measurement>;

/// A request batch, classified once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum InputBatch {
    /// Per-record point values.
    Plain(Vec<PlainRecord>),
    /// A decoded matrix whose columns already follow the schema input order.
    File(DMatrix<f64>),
    /// Per-record `(value, std)` pairs expanded by Monte Carlo sampling.
    Uncertainty(Vec<UncertainRecord>),
}

impl InputBatch {
    /// Number of original records (the partition count).
    pub fn len(&self) -> usize {
        match self {
            InputBatch::Plain(records) => records.len(),
            InputBatch::File(matrix) => matrix.nrows(),
            InputBatch::Uncertainty(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_gaussian(&self) -> bool {
        matches!(self, InputBatch::Uncertainty(_))
    }

    /// Human-readable label of the request shape, echoed in responses.
    pub fn input_format(&self) -> &'static str {
        match self {
            InputBatch::Plain(_) | InputBatch::Uncertainty(_) => "Form Data",
            InputBatch::File(_) => "File & Form Data",
        }
    }
}

/// Per-request knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Stochastic forward passes per feature row.
    pub times: usize,
    /// Monte Carlo draws per record (uncertainty mode only).
    pub sample_num: usize,
    /// Seed for the request-local RNG; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            times: DEFAULT_TIMES,
            sample_num: DEFAULT_SAMPLE_NUM,
            seed: None,
        }
    }
}

impl InferenceConfig {
    /// Feature rows produced per original record.
    pub fn rows_per_record(&self, batch: &InputBatch) -> usize {
        if batch.is_gaussian() { self.sample_num } else { 1 }
    }

    /// Output rows per original record after inference.
    pub fn group_size(&self, batch: &InputBatch) -> usize {
        self.rows_per_record(batch) * self.times
    }

    pub fn validate(&self, batch: &InputBatch) -> Result<(), PipelineError> {
        if self.times == 0 {
            return Err(PipelineError::InvalidArgument("Times must be > 0".to_string()));
        }
        if batch.is_gaussian() && self.sample_num == 0 {
            return Err(PipelineError::InvalidArgument("sample_num must be > 0".to_string()));
        }
        if batch.is_empty() {
            return Err(PipelineError::InvalidArgument("input batch has no records".to_string()));
        }
        self.total_rows(batch)?;
        Ok(())
    }

    /// Output rows for the whole batch, or `InvalidArgument` if that overflows `usize`.
    pub fn total_rows(&self, batch: &InputBatch) -> Result<usize, PipelineError> {
        batch
            .len()
            .checked_mul(self.rows_per_record(batch))
            .and_then(|rows| rows.checked_mul(self.times))
            .ok_or_else(|| {
                PipelineError::InvalidArgument(format!(
                    "{} records x {} draws x {} replicates exceeds the addressable row count",
                    batch.len(),
                    self.rows_per_record(batch),
                    self.times
                ))
            })
    }
}

/// Output parameter name -> ordered sampled values, for one record.
pub type RecordDistribution = BTreeMap<String, Vec<f64>>;

/// Record index (0-based, input order) -> that record's sampled outputs.
pub type ResultMapping = BTreeMap<usize, RecordDistribution>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planetary_schema_marks_boundary_columns() {
        let schema = ParamSchema::planetary();
        assert!(schema.validate().is_ok());
        assert_eq!(schema.input_len(), 4);
        assert_eq!(schema.milli_columns(), vec![5, 6]);
    }

    #[test]
    fn validate_rejects_duplicates_and_dangling_milli_columns() {
        let dup = ParamSchema::new(["a", "a"], ["y"]);
        assert!(matches!(dup.validate(), Err(PipelineError::InvalidArgument(_))));

        let dangling = ParamSchema::new(["a"], ["y"]).with_milli_outputs(["z"]);
        assert!(matches!(dangling.validate(), Err(PipelineError::InvalidArgument(_))));
    }

    #[test]
    fn group_size_depends_on_mode() {
        let config = InferenceConfig {
            times: 3,
            sample_num: 4,
            seed: None,
        };
        let plain = InputBatch::Plain(vec![PlainRecord::new()]);
        let gaussian = InputBatch::Uncertainty(vec![UncertainRecord::new()]);
        assert_eq!(config.group_size(&plain), 3);
        assert_eq!(config.group_size(&gaussian), 12);
    }

    #[test]
    fn validate_rejects_zero_counts_and_empty_batches() {
        let batch = InputBatch::File(DMatrix::zeros(1, 4));
        let zero_times = InferenceConfig {
            times: 0,
            ..InferenceConfig::default()
        };
        assert!(zero_times.validate(&batch).is_err());

        let empty = InputBatch::Plain(Vec::new());
        assert!(InferenceConfig::default().validate(&empty).is_err());

        // sample_num only matters for uncertainty batches.
        let zero_samples = InferenceConfig {
            sample_num: 0,
            ..InferenceConfig::default()
        };
        assert!(zero_samples.validate(&batch).is_ok());
    }

    #[test]
    fn validate_rejects_row_counts_that_overflow() {
        let plain = InputBatch::Plain(vec![PlainRecord::new(), PlainRecord::new()]);
        let huge_times = InferenceConfig {
            times: usize::MAX / 2 + 1,
            ..InferenceConfig::default()
        };
        assert!(matches!(
            huge_times.validate(&plain),
            Err(PipelineError::InvalidArgument(_))
        ));

        let gaussian = InputBatch::Uncertainty(vec![UncertainRecord::new()]);
        let huge_samples = InferenceConfig {
            times: 4,
            sample_num: usize::MAX / 2,
            seed: None,
        };
        assert!(huge_samples.validate(&gaussian).is_err());

        assert_eq!(InferenceConfig::default().total_rows(&plain).unwrap(), 20);
    }
}
