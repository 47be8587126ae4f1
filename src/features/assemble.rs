//! Feature matrix assembly.
//!
//! The feature matrix always has one column per schema input, in schema order.
//! Plain batches produce one row per record, file batches pass through
//! verbatim, and uncertainty batches are expanded by `gaussian_sampling`.

use nalgebra::DMatrix;
use rand::Rng;

use crate::domain::{InputBatch, ParamSchema, PlainRecord};
use crate::error::PipelineError;
use crate::features::sampling::gaussian_sampling;

/// Build the feature matrix for any batch shape.
///
/// `sample_num` and `rng` are only used for uncertainty batches.
pub fn assemble_features<R: Rng + ?Sized>(
    batch: &InputBatch,
    schema: &ParamSchema,
    sample_num: usize,
    rng: &mut R,
) -> Result<DMatrix<f64>, PipelineError> {
    match batch {
        InputBatch::Plain(records) => plain_matrix(records, schema),
        // Column order is the caller's responsibility in file mode.
        InputBatch::File(matrix) => Ok(matrix.clone()),
        InputBatch::Uncertainty(records) => gaussian_sampling(records, schema, sample_num, rng),
    }
}

/// Stack per-record values into a `records x inputs` matrix.
pub fn plain_matrix(records: &[PlainRecord], schema: &ParamSchema) -> Result<DMatrix<f64>, PipelineError> {
    let cols = schema.input_len();
    let mut data = Vec::with_capacity(records.len() * cols);

    for (i, record) in records.iter().enumerate() {
        for name in &schema.inputs {
            let value = record.get(name).ok_or_else(|| PipelineError::MissingParameter {
                record: i,
                parameter: name.clone(),
            })?;
            data.push(*value);
        }
    }

    Ok(DMatrix::from_row_slice(records.len(), cols, &data))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn plain(values: &[(&str, f64)]) -> PlainRecord {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn plain_records_follow_schema_column_order() {
        let schema = ParamSchema::new(["Mass", "Radius", "Fe/Mg"], ["y"]);
        // Insertion order differs from schema order on purpose.
        let records = vec![
            plain(&[("Fe/Mg", 0.8), ("Mass", 1.0), ("Radius", 1.1)]),
            plain(&[("Radius", 1.5), ("Fe/Mg", 0.9), ("Mass", 3.0)]),
        ];

        let x = plain_matrix(&records, &schema).unwrap();
        assert_eq!(x.shape(), (2, 3));
        assert_eq!(x.row(0).iter().copied().collect::<Vec<_>>(), vec![1.0, 1.1, 0.8]);
        assert_eq!(x.row(1).iter().copied().collect::<Vec<_>>(), vec![3.0, 1.5, 0.9]);
    }

    #[test]
    fn missing_plain_parameter_fails() {
        let schema = ParamSchema::new(["Mass", "Radius"], ["y"]);
        let records = vec![plain(&[("Mass", 1.0)])];

        let err = plain_matrix(&records, &schema).unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingParameter {
                record: 0,
                parameter: "Radius".to_string()
            }
        );
    }

    #[test]
    fn file_matrix_passes_through_unchanged() {
        let schema = ParamSchema::new(["a", "b"], ["y"]);
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let mut rng = StdRng::seed_from_u64(0);

        let x = assemble_features(&InputBatch::File(m.clone()), &schema, 10, &mut rng).unwrap();
        assert_eq!(x, m);
    }
}
