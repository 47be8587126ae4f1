//! Per-column standardization: `z = (x - mean) / scale`.
//!
//! Fitted offline; only the `mean` and `scale` vectors are stored. A zero
//! scale (constant column during fitting) is treated as 1 so the transform
//! stays invertible.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::scaling::Scaler;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, PipelineError> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.mean.len() != self.scale.len() {
            return Err(PipelineError::Scaling(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err(PipelineError::Scaling("scaler parameters must be finite".to_string()));
        }
        Ok(())
    }

    fn effective_scale(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.scale.len(),
            self.scale.iter().map(|&s| if s == 0.0 { 1.0 } else { s }),
        )
    }

    fn check_shape(&self, x: &DMatrix<f64>) -> Result<(), PipelineError> {
        if x.ncols() != self.n_features() {
            return Err(PipelineError::Scaling(format!(
                "expected {} columns, got {}",
                self.n_features(),
                x.ncols()
            )));
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn forward(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, PipelineError> {
        self.check_shape(x)?;
        let scale = self.effective_scale();
        let mut out = x.clone();
        for (j, mut col) in out.column_iter_mut().enumerate() {
            col.apply(|v| *v = (*v - self.mean[j]) / scale[j]);
        }
        Ok(out)
    }

    fn inverse(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, PipelineError> {
        self.check_shape(x)?;
        let scale = self.effective_scale();
        let mut out = x.clone();
        for (j, mut col) in out.column_iter_mut().enumerate() {
            col.apply(|v| *v = *v * scale[j] + self.mean[j]);
        }
        Ok(out)
    }
}
