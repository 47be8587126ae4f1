//! JSON request decoding.
//!
//! Two request shapes are accepted, one per CLI subcommand:
//!
//! - plain: `{"Mass": [..], "Radius": [..], ..., "Times": 10}`
//! - gaussian: `{"Mass": {"value": [..], "std": [..]}, ..., "Times": 10, "sample_num": 10}`
//!
//! A bare number is accepted wherever an array is, meaning a single record.
//! Every parameter array must have the same length (the record count).
//! Unknown keys are ignored.

use serde_json::{Map, Value};

use crate::domain::{InputBatch, Measurement, ParamSchema, PlainRecord, UncertainRecord};
use crate::error::PipelineError;

/// A decoded request: the classified batch plus any per-request overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRequest {
    pub batch: InputBatch,
    pub times: Option<usize>,
    pub sample_num: Option<usize>,
}

/// Decode a plain (point value) request.
pub fn parse_plain_request(json: &Value, schema: &ParamSchema) -> Result<DecodedRequest, PipelineError> {
    let obj = as_object(json)?;
    let times = read_count(obj, "Times")?;

    let mut columns = Vec::with_capacity(schema.input_len());
    for name in &schema.inputs {
        let raw = obj.get(name).ok_or_else(|| missing_parameter(0, name))?;
        if raw.is_object() {
            return Err(PipelineError::InvalidArgument(format!(
                "`{name}` carries a value/std object; use a gaussian request for uncertain inputs"
            )));
        }
        let values = read_series(raw, name)?;
        let values = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| missing_parameter(i, name)))
            .collect::<Result<Vec<f64>, _>>()?;
        columns.push(values);
    }

    let n = common_len(schema, columns.iter().map(Vec::len))?;
    let records = (0..n)
        .map(|i| {
            schema
                .inputs
                .iter()
                .zip(&columns)
                .map(|(name, col)| (name.clone(), col[i]))
                .collect::<PlainRecord>()
        })
        .collect();

    Ok(DecodedRequest {
        batch: InputBatch::Plain(records),
        times,
        sample_num: None,
    })
}

/// Decode a gaussian (value + standard deviation) request.
pub fn parse_gaussian_request(json: &Value, schema: &ParamSchema) -> Result<DecodedRequest, PipelineError> {
    let obj = as_object(json)?;
    let times = read_count(obj, "Times")?;
    let sample_num = read_count(obj, "sample_num")?;

    let mut columns = Vec::with_capacity(schema.input_len());
    for name in &schema.inputs {
        let entry = obj.get(name).ok_or_else(|| missing_parameter(0, name))?;
        let entry = entry.as_object().ok_or_else(|| {
            PipelineError::InvalidArgument(format!("`{name}` must be an object with `value` and `std`"))
        })?;

        let values = entry
            .get("value")
            .ok_or_else(|| missing_parameter(0, name))
            .and_then(|v| read_series(v, name))?;
        let stds = entry
            .get("std")
            .ok_or_else(|| missing_uncertainty(0, name))
            .and_then(|v| read_series(v, name))?;

        if values.len() != stds.len() {
            return Err(PipelineError::InvalidArgument(format!(
                "`{name}` has {} values but {} std entries",
                values.len(),
                stds.len()
            )));
        }

        let column = values
            .into_iter()
            .zip(stds)
            .enumerate()
            .map(|(i, (value, std))| {
                let value = value.ok_or_else(|| missing_parameter(i, name))?;
                let std = std.ok_or_else(|| missing_uncertainty(i, name))?;
                Ok(Measurement::with_std(value, std))
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;
        columns.push(column);
    }

    let n = common_len(schema, columns.iter().map(Vec::len))?;
    let records = (0..n)
        .map(|i| {
            schema
                .inputs
                .iter()
                .zip(&columns)
                .map(|(name, col)| (name.clone(), col[i]))
                .collect::<UncertainRecord>()
        })
        .collect();

    Ok(DecodedRequest {
        batch: InputBatch::Uncertainty(records),
        times,
        sample_num,
    })
}

fn as_object(json: &Value) -> Result<&Map<String, Value>, PipelineError> {
    json.as_object()
        .ok_or_else(|| PipelineError::InvalidArgument("request body must be a JSON object".to_string()))
}

/// Read an optional positive integer field.
fn read_count(obj: &Map<String, Value>, key: &str) -> Result<Option<usize>, PipelineError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_u64().and_then(|n| usize::try_from(n).ok()) {
            Some(n) if n > 0 => Ok(Some(n)),
            _ => Err(PipelineError::InvalidArgument(format!(
                "`{key}` must be a positive integer, got {v}"
            ))),
        },
    }
}

/// Read a number or an array of numbers; `null` entries come back as `None`.
fn read_series(raw: &Value, name: &str) -> Result<Vec<Option<f64>>, PipelineError> {
    let not_numeric = || PipelineError::InvalidArgument(format!("`{name}` must be a number or an array of numbers"));
    match raw {
        Value::Number(n) => Ok(vec![Some(n.as_f64().ok_or_else(not_numeric)?)]),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => Ok(None),
                Value::Number(n) => n.as_f64().map(Some).ok_or_else(not_numeric),
                _ => Err(not_numeric()),
            })
            .collect(),
        _ => Err(not_numeric()),
    }
}

fn common_len(schema: &ParamSchema, lens: impl Iterator<Item = usize>) -> Result<usize, PipelineError> {
    let lens: Vec<usize> = lens.collect();
    let first = lens.first().copied().unwrap_or(0);
    if let Some(pos) = lens.iter().position(|&l| l != first) {
        return Err(PipelineError::InvalidArgument(format!(
            "`{}` has {} records but `{}` has {first}",
            schema.inputs[pos], lens[pos], schema.inputs[0]
        )));
    }
    Ok(first)
}

fn missing_parameter(record: usize, name: &str) -> PipelineError {
    PipelineError::MissingParameter {
        record,
        parameter: name.to_string(),
    }
}

fn missing_uncertainty(record: usize, name: &str) -> PipelineError {
    PipelineError::MissingUncertainty {
        record,
        parameter: name.to_string(),
    }
}
