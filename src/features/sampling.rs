//! Monte Carlo expansion of measurement uncertainty.
//!
//! Each uncertainty-mode record becomes `sample_num` synthetic feature rows,
//! with every recognized parameter drawn independently from
//! `Normal(value, std)`.
//!
//! Row layout: the `sample_num` rows of record `i` are contiguous and precede
//! every row of record `i + 1`. The result partitioner relies on this.

use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::domain::{ParamSchema, UncertainRecord};
use crate::error::PipelineError;

/// Expand `records` into a `(records * sample_num) x inputs` feature matrix.
///
/// Every record is checked for a value and a standard deviation on each
/// parameter before the first draw.
pub fn gaussian_sampling<R: Rng + ?Sized>(
    records: &[UncertainRecord],
    schema: &ParamSchema,
    sample_num: usize,
    rng: &mut R,
) -> Result<DMatrix<f64>, PipelineError> {
    if sample_num == 0 {
        return Err(PipelineError::InvalidArgument("sample_num must be > 0".to_string()));
    }

    let mut dists = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        dists.push(record_distributions(i, record, schema)?);
    }

    let mut out = DMatrix::zeros(records.len() * sample_num, schema.input_len());
    for (i, per_param) in dists.iter().enumerate() {
        let first_row = i * sample_num;
        for (col, normal) in per_param.iter().enumerate() {
            for k in 0..sample_num {
                out[(first_row + k, col)] = normal.sample(rng);
            }
        }
    }

    Ok(out)
}

fn record_distributions(
    index: usize,
    record: &UncertainRecord,
    schema: &ParamSchema,
) -> Result<Vec<Normal<f64>>, PipelineError> {
    schema
        .inputs
        .iter()
        .map(|name| {
            let m = record.get(name).ok_or_else(|| PipelineError::MissingParameter {
                record: index,
                parameter: name.clone(),
            })?;
            let std = m.std.ok_or_else(|| PipelineError::MissingUncertainty {
                record: index,
                parameter: name.clone(),
            })?;
            if !(m.value.is_finite() && std.is_finite() && std >= 0.0) {
                return Err(PipelineError::InvalidArgument(format!(
                    "record {index}: `{name}` needs a finite value and a finite, non-negative std (got {} +/- {std})",
                    m.value
                )));
            }
            Normal::new(m.value, std).map_err(|e| {
                PipelineError::InvalidArgument(format!("record {index}: `{name}`: {e}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::domain::Measurement;

    fn schema() -> ParamSchema {
        ParamSchema::new(["Mass", "Radius"], ["y"])
    }

    fn record(mass: (f64, f64), radius: (f64, f64)) -> UncertainRecord {
        let mut r = UncertainRecord::new();
        r.insert("Mass".to_string(), Measurement::with_std(mass.0, mass.1));
        r.insert("Radius".to_string(), Measurement::with_std(radius.0, radius.1));
        r
    }

    #[test]
    fn rows_are_grouped_per_record_in_order() {
        // Zero std makes every draw equal to the stated value.
        let records = vec![record((1.0, 0.0), (10.0, 0.0)), record((2.0, 0.0), (20.0, 0.0))];
        let mut rng = StdRng::seed_from_u64(7);
        let x = gaussian_sampling(&records, &schema(), 3, &mut rng).unwrap();

        assert_eq!(x.shape(), (6, 2));
        for row in 0..3 {
            assert_eq!(x[(row, 0)], 1.0);
            assert_eq!(x[(row, 1)], 10.0);
        }
        for row in 3..6 {
            assert_eq!(x[(row, 0)], 2.0);
            assert_eq!(x[(row, 1)], 20.0);
        }
    }

    #[test]
    fn empirical_moments_converge_to_stated_values() {
        let n = 20_000;
        let (mean, std) = (5.0, 2.0);
        let records = vec![record((mean, std), (1.0, 0.1))];
        let mut rng = StdRng::seed_from_u64(42);
        let x = gaussian_sampling(&records, &schema(), n, &mut rng).unwrap();

        let col: Vec<f64> = x.column(0).iter().copied().collect();
        let m = col.iter().sum::<f64>() / n as f64;
        let var = col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n as f64 - 1.0);
        let s = var.sqrt();

        let se_mean = std / (n as f64).sqrt();
        let se_std = std / (2.0 * n as f64).sqrt();
        assert!((m - mean).abs() < 4.0 * se_mean, "mean {m} too far from {mean}");
        assert!((s - std).abs() < 4.0 * se_std, "std {s} too far from {std}");
    }

    #[test]
    fn same_seed_reproduces_draws() {
        let records = vec![record((1.0, 0.5), (2.0, 0.5))];
        let a = gaussian_sampling(&records, &schema(), 8, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = gaussian_sampling(&records, &schema(), 8, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_std_is_reported_with_record_and_parameter() {
        let mut bad = record((1.0, 0.1), (2.0, 0.1));
        bad.insert("Radius".to_string(), Measurement::exact(2.0));
        let records = vec![record((1.0, 0.1), (2.0, 0.1)), bad];

        let err = gaussian_sampling(&records, &schema(), 4, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingUncertainty {
                record: 1,
                parameter: "Radius".to_string()
            }
        );
    }

    #[test]
    fn negative_std_is_rejected() {
        let records = vec![record((1.0, -0.1), (2.0, 0.1))];
        let err = gaussian_sampling(&records, &schema(), 4, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArgument(_)));
    }
}
