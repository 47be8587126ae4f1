//! Output unit reconciliation.
//!
//! The model predicts the schema's milli-unit columns in units 1000x larger
//! than the ones reported, so those columns are divided by `MILLI_FACTOR`.
//! Every other column is left untouched.

use nalgebra::DMatrix;

use crate::domain::{MILLI_FACTOR, ParamSchema};

/// Rescale the milli-unit columns of an inverse-scaled distribution in place.
pub fn reconcile_units(distribution: &mut DMatrix<f64>, schema: &ParamSchema) {
    for idx in schema.milli_columns() {
        debug_assert!(
            idx < distribution.ncols(),
            "milli-unit column {idx} outside a {}-column distribution",
            distribution.ncols()
        );
        distribution.column_mut(idx).apply(|v| *v /= MILLI_FACTOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_designated_columns_are_divided() {
        let schema = ParamSchema::planetary();
        let mut d = DMatrix::from_fn(3, 7, |r, c| (r * 10 + c) as f64 * 1000.0 + 1.0);
        let before = d.clone();

        reconcile_units(&mut d, &schema);

        for r in 0..3 {
            for c in 0..7 {
                if c == 5 || c == 6 {
                    assert_eq!(d[(r, c)], before[(r, c)] / 1000.0);
                } else {
                    assert_eq!(d[(r, c)], before[(r, c)]);
                }
            }
        }
    }

    #[test]
    fn schema_without_milli_columns_is_a_no_op() {
        let schema = ParamSchema::new(["x"], ["a", "b"]);
        let mut d = DMatrix::from_row_slice(1, 2, &[1500.0, 2500.0]);
        reconcile_units(&mut d, &schema);
        assert_eq!(d, DMatrix::from_row_slice(1, 2, &[1500.0, 2500.0]));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "milli-unit column")]
    fn milli_column_outside_the_distribution_is_a_bug() {
        let mut d = DMatrix::zeros(2, 3);
        reconcile_units(&mut d, &ParamSchema::planetary());
    }
}
