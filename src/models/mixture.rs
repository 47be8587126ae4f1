//! Linear mixture-density model.
//!
//! Each component `k` has a linear gate logit `g_k(x) = a_k . x + c_k`, a
//! linear mean `mu_k(x) = W_k x + b_k` and a diagonal standard deviation
//! `sigma_k`. One replicate draw for feature row `x`:
//!
//! 1. `k ~ Categorical(softmax(g(x)))`
//! 2. `y = mu_k(x) + sigma_k * z`, `z ~ N(0, I)`
//!
//! The condition vector reported for row `x` is the mixing distribution
//! `softmax(g(x))`.

use nalgebra::DMatrix;
use rand::RngCore;
use rand::distributions::WeightedIndex;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::models::{DistributionalModel, Prediction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureComponent {
    pub gate_weights: Vec<f64>,
    pub gate_bias: f64,
    /// `output_dim` rows of `input_dim` coefficients.
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub std: Vec<f64>,
}

impl MixtureComponent {
    fn gate_logit(&self, x: &[f64]) -> f64 {
        dot(&self.gate_weights, x) + self.gate_bias
    }

    fn mean(&self, x: &[f64], out: &mut [f64]) {
        for (j, (w, b)) in self.weights.iter().zip(&self.bias).enumerate() {
            out[j] = dot(w, x) + b;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureDensityModel {
    pub input_dim: usize,
    pub output_dim: usize,
    pub components: Vec<MixtureComponent>,
}

impl MixtureDensityModel {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.components.is_empty() {
            return Err(invalid("model has no mixture components"));
        }
        for (k, c) in self.components.iter().enumerate() {
            if c.gate_weights.len() != self.input_dim {
                return Err(invalid(format!(
                    "component {k}: gate has {} weights, expected {}",
                    c.gate_weights.len(),
                    self.input_dim
                )));
            }
            if c.weights.len() != self.output_dim
                || c.bias.len() != self.output_dim
                || c.std.len() != self.output_dim
            {
                return Err(invalid(format!(
                    "component {k}: mean/std must have {} outputs",
                    self.output_dim
                )));
            }
            if let Some(j) = c.weights.iter().position(|row| row.len() != self.input_dim) {
                return Err(invalid(format!(
                    "component {k}: weight row {j} must have {} coefficients",
                    self.input_dim
                )));
            }
            if c.std.iter().any(|s| !(s.is_finite() && *s >= 0.0)) {
                return Err(invalid(format!("component {k}: std must be finite and >= 0")));
            }
        }
        Ok(())
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// Mixing probabilities for one feature row.
    fn mixing(&self, x: &[f64]) -> Vec<f64> {
        let logits: Vec<f64> = self.components.iter().map(|c| c.gate_logit(x)).collect();
        softmax(&logits)
    }
}

impl DistributionalModel for MixtureDensityModel {
    fn predict_distribution(
        &self,
        x: &DMatrix<f64>,
        times: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Prediction, PipelineError> {
        if x.ncols() != self.input_dim {
            return Err(PipelineError::Inference(format!(
                "model expects {} input columns, got {}",
                self.input_dim,
                x.ncols()
            )));
        }

        let rows = x.nrows();
        let mut conditions = DMatrix::zeros(rows, self.n_components());
        let mut distribution = DMatrix::zeros(rows * times, self.output_dim);
        let mut mean = vec![0.0; self.output_dim];

        for r in 0..rows {
            let features: Vec<f64> = x.row(r).iter().copied().collect();
            let probs = self.mixing(&features);
            for (k, p) in probs.iter().enumerate() {
                conditions[(r, k)] = *p;
            }

            let picker = WeightedIndex::new(&probs)
                .map_err(|e| PipelineError::Inference(format!("row {r}: bad mixing weights: {e}")))?;

            for t in 0..times {
                let component = &self.components[picker.sample(rng)];
                component.mean(&features, &mut mean);
                let out_row = r * times + t;
                for (j, (mu, sigma)) in mean.iter().zip(&component.std).enumerate() {
                    let z: f64 = StandardNormal.sample(rng);
                    distribution[(out_row, j)] = mu + sigma * z;
                }
            }
        }

        Ok(Prediction {
            conditions,
            distribution,
        })
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn invalid(message: impl Into<String>) -> PipelineError {
    PipelineError::InvalidArgument(message.into())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn component(gate_bias: f64, offset: f64, std: f64) -> MixtureComponent {
        MixtureComponent {
            gate_weights: vec![0.0, 0.0],
            gate_bias,
            weights: vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![1.0, 1.0]],
            bias: vec![offset; 3],
            std: vec![std; 3],
        }
    }

    fn model() -> MixtureDensityModel {
        MixtureDensityModel {
            input_dim: 2,
            output_dim: 3,
            components: vec![component(0.0, 0.0, 0.1), component(1.0, 5.0, 0.1)],
        }
    }

    #[test]
    fn output_shape_is_rows_times_replicates() {
        let x = DMatrix::from_row_slice(4, 2, &[0.0, 1.0, 1.0, 0.0, 2.0, 2.0, -1.0, 0.5]);
        let mut rng = StdRng::seed_from_u64(11);
        let pred = model().predict_distribution(&x, 7, &mut rng).unwrap();

        assert_eq!(pred.distribution.shape(), (28, 3));
        assert_eq!(pred.conditions.shape(), (4, 2));
        for r in 0..4 {
            let total: f64 = pred.conditions.row(r).sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn deterministic_single_component_matches_linear_mean() {
        let m = MixtureDensityModel {
            input_dim: 2,
            output_dim: 3,
            components: vec![component(0.0, 1.0, 0.0)],
        };
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let mut rng = StdRng::seed_from_u64(0);
        let pred = m.predict_distribution(&x, 2, &mut rng).unwrap();

        // Row 0 -> [1 + 1, 4 + 1, 3 + 1], row 1 -> [3 + 1, 8 + 1, 7 + 1].
        for t in 0..2 {
            assert_eq!(pred.distribution.row(t).iter().copied().collect::<Vec<_>>(), vec![2.0, 5.0, 4.0]);
            assert_eq!(pred.distribution.row(2 + t).iter().copied().collect::<Vec<_>>(), vec![4.0, 9.0, 8.0]);
        }
    }

    #[test]
    fn draws_stay_within_their_feature_row_block() {
        // Feature rows far apart; each block must cluster around its own row.
        let m = MixtureDensityModel {
            input_dim: 2,
            output_dim: 3,
            components: vec![component(0.0, 0.0, 0.01)],
        };
        let x = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 100.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(5);
        let pred = m.predict_distribution(&x, 5, &mut rng).unwrap();

        for t in 0..5 {
            assert!(pred.distribution[(t, 0)].abs() < 1.0);
            assert!((pred.distribution[(5 + t, 0)] - 100.0).abs() < 1.0);
        }
    }

    #[test]
    fn wrong_input_width_is_an_inference_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = model()
            .predict_distribution(&DMatrix::zeros(1, 3), 2, &mut rng)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
    }

    #[test]
    fn validate_catches_ragged_weights() {
        let mut m = model();
        m.components[1].weights[2].push(0.0);
        assert!(m.validate().is_err());
        assert!(model().validate().is_ok());
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert!((p[1] - 0.5).abs() < 1e-12);
    }
}
