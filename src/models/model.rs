//! Inference contract consumed by the pipeline.
//!
//! For a scaled feature matrix with `R` rows and a replicate count `T`, a
//! model returns a distribution with `R * T` rows. Row block
//! `[r * T, (r + 1) * T)` holds the draws for feature row `r`; blocks are
//! contiguous and in feature-row order.

use nalgebra::DMatrix;
use rand::RngCore;

use crate::error::PipelineError;

/// Output of one inference call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Auxiliary per-feature-row condition vectors. Not consumed downstream.
    pub conditions: DMatrix<f64>,
    /// `(R * T) x outputs` draws in model space.
    pub distribution: DMatrix<f64>,
}

/// A loaded, read-only probabilistic regression model.
///
/// Randomness comes from the caller so that concurrent requests never share a
/// generator.
pub trait DistributionalModel: Send + Sync {
    fn predict_distribution(
        &self,
        x: &DMatrix<f64>,
        times: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Prediction, PipelineError>;
}
