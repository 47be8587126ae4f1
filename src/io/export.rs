//! Write prediction responses as JSON.
//!
//! The envelope mirrors what clients of the prediction service already parse:
//! `{"Input format": .., "Output": {"Prediction_distribution": {..}}, "Gaussian": ..}`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{InputBatch, ResultMapping};
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct PredictionResponse<'a> {
    #[serde(rename = "Input format")]
    pub input_format: &'static str,
    #[serde(rename = "Output")]
    pub output: ResponseOutput<'a>,
    #[serde(rename = "Gaussian")]
    pub gaussian: bool,
}

#[derive(Debug, Serialize)]
pub struct ResponseOutput<'a> {
    #[serde(rename = "Prediction_distribution")]
    pub prediction_distribution: &'a ResultMapping,
}

impl<'a> PredictionResponse<'a> {
    pub fn new(batch: &InputBatch, predictions: &'a ResultMapping) -> Self {
        Self {
            input_format: batch.input_format(),
            output: ResponseOutput {
                prediction_distribution: predictions,
            },
            gaussian: batch.is_gaussian(),
        }
    }
}

/// Write the response to `path`, or to stdout when `path` is `None`.
pub fn write_response(path: Option<&Path>, response: &PredictionResponse<'_>) -> Result<(), AppError> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| AppError::new(2, format!("Failed to create output '{}': {e}", path.display())))?;
            serde_json::to_writer_pretty(file, response)
                .map_err(|e| AppError::new(2, format!("Failed to write response JSON: {e}")))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer(&mut lock, response)
                .map_err(|e| AppError::new(2, format!("Failed to write response JSON: {e}")))?;
            writeln!(lock).map_err(|e| AppError::new(2, format!("Failed to write response JSON: {e}")))?;
        }
    }
    Ok(())
}
