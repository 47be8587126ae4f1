//! Per-record summary statistics and formatted terminal output.
//!
//! Formatting stays here so the pipeline only ever produces plain data.

use crate::domain::{ParamSchema, ResultMapping};

/// Moments and central quantiles of one sampled output parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionSummary {
    pub n: usize,
    pub mean: f64,
    pub std: f64,
    pub p16: f64,
    pub p50: f64,
    pub p84: f64,
}

/// Summarize a sequence of draws. Returns `None` for an empty sequence.
pub fn summarize(values: &[f64]) -> Option<DistributionSummary> {
    if values.is_empty() {
        return None;
    }
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0)).sqrt()
    } else {
        0.0
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Some(DistributionSummary {
        n,
        mean,
        std,
        p16: quantile_sorted(&sorted, 0.16),
        p50: quantile_sorted(&sorted, 0.50),
        p84: quantile_sorted(&sorted, 0.84),
    })
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let u = pos - lo as f64;
    sorted[lo] + u * (sorted[hi] - sorted[lo])
}

/// Format one table per record, rows in schema output order.
pub fn format_summary(result: &ResultMapping, schema: &ParamSchema) -> String {
    let mut out = String::new();

    for (record, params) in result {
        out.push_str(&format!("Record {record}:\n"));
        out.push_str(&format!(
            "  {:<10} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
            "param", "n", "mean", "std", "p16", "p50", "p84"
        ));
        for name in &schema.outputs {
            let Some(s) = params.get(name).and_then(|v| summarize(v)) else {
                continue;
            };
            out.push_str(&format!(
                "  {:<10} {:>6} {:>12.5} {:>12.5} {:>12.5} {:>12.5} {:>12.5}\n",
                name, s.n, s.mean, s.std, s.p16, s.p50, s.p84
            ));
        }
        out.push('\n');
    }

    out
}
