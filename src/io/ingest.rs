//! File-mode ingest: decode a tabular file into a raw feature matrix.
//!
//! Supported formats:
//! - `.csv`: one header row (names are not interpreted), then one record per row
//! - `.json`: a 2-D array of numbers, one inner array per record
//!
//! Columns must already follow the schema's input order; only the column
//! count is checked here.

use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use nalgebra::DMatrix;

use crate::domain::ParamSchema;
use crate::error::AppError;

/// Load a feature matrix from `path`, dispatching on the file extension.
pub fn load_matrix(path: &Path, schema: &ParamSchema) -> Result<DMatrix<f64>, AppError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open input file '{}': {e}", path.display())))?;

    let rows = match ext.as_str() {
        "csv" => read_csv_rows(file)?,
        "json" => serde_json::from_reader::<_, Vec<Vec<f64>>>(file)
            .map_err(|e| AppError::new(2, format!("Invalid JSON matrix '{}': {e}", path.display())))?,
        _ => {
            return Err(AppError::new(
                2,
                format!("Unsupported file type '{}' (expected .csv or .json)", path.display()),
            ));
        }
    };

    rows_to_matrix(&rows, schema)
}

fn read_csv_rows<R: std::io::Read>(reader: R) -> Result<Vec<Vec<f64>>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based line numbers, plus the header row.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("CSV parse error on line {line}: {e}")))?;
        rows.push(parse_record(&record, line)?);
    }
    Ok(rows)
}

fn parse_record(record: &StringRecord, line: usize) -> Result<Vec<f64>, AppError> {
    record
        .iter()
        .enumerate()
        .map(|(col, field)| {
            field.parse::<f64>().map_err(|_| {
                AppError::new(
                    2,
                    format!("Line {line}, column {}: '{field}' is not a number", col + 1),
                )
            })
        })
        .collect()
}

/// Stack decoded rows into a matrix, checking the width against the schema.
pub fn rows_to_matrix(rows: &[Vec<f64>], schema: &ParamSchema) -> Result<DMatrix<f64>, AppError> {
    if rows.is_empty() {
        return Err(AppError::new(2, "Input file contains no records."));
    }
    let width = schema.input_len();
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(AppError::new(
            2,
            format!(
                "Record {idx} has {} columns; expected {width} ({})",
                row.len(),
                schema.inputs.join(", ")
            ),
        ));
    }

    let data: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(DMatrix::from_row_slice(rows.len(), width, &data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ParamSchema {
        ParamSchema::new(["Mass", "Radius", "Fe/Mg"], ["y"])
    }

    #[test]
    fn csv_rows_parse_in_order() {
        let text = "Mass,Radius,Fe/Mg\n1.0, 1.1 ,0.8\n2.5,1.4,0.9\n";
        let rows = read_csv_rows(text.as_bytes()).unwrap();
        let m = rows_to_matrix(&rows, &schema()).unwrap();

        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m[(0, 1)], 1.1);
        assert_eq!(m[(1, 0)], 2.5);
    }

    #[test]
    fn csv_non_numeric_field_reports_line() {
        let text = "a,b,c\n1,2,3\n1,x,3\n";
        let err = read_csv_rows(text.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("Line 3"), "{}", err.message());
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let err = rows_to_matrix(&[vec![1.0, 2.0]], &schema()).unwrap_err();
        assert!(err.message().contains("expected 3"));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(rows_to_matrix(&[], &schema()).is_err());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.parquet");
        std::fs::write(&path, b"not really parquet").unwrap();

        let err = load_matrix(&path, &schema()).unwrap_err();
        assert!(err.message().contains("Unsupported file type"));
    }
}
