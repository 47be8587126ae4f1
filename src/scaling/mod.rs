//! Fitted feature/target transforms.
//!
//! The pipeline calls `forward` once on the full feature matrix before
//! inference and `inverse` once on the full predictive distribution after it.
//! Implementations must be pure: same input, same output, no interior state.

use nalgebra::DMatrix;

use crate::error::PipelineError;

pub mod standard;

pub use standard::*;

/// A previously fitted, shape-preserving transform.
pub trait Scaler: Send + Sync {
    /// Raw units -> model space.
    fn forward(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, PipelineError>;

    /// Model space -> raw units.
    fn inverse(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, PipelineError>;
}

/// Pass-through transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityScaler;

impl Scaler for IdentityScaler {
    fn forward(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, PipelineError> {
        Ok(x.clone())
    }

    fn inverse(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, PipelineError> {
        Ok(x.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_round_trip() {
        let x = DMatrix::from_row_slice(2, 3, &[1.0, -2.5, 3.0, 1e-9, 4e6, 0.0]);
        let s = IdentityScaler;
        let back = s.inverse(&s.forward(&x).unwrap()).unwrap();
        assert!((back - &x).abs().max() < 1e-12);
    }
}
