//! Descriptive statistics over KPI windows.

use serde::Serialize;

use super::types::{Kpi, KpiSample};

/// Summary statistics for one KPI series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    /// Number of samples.
    pub count: usize,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Most recent value.
    pub latest: f64,
}

/// Compute statistics for one KPI over samples ordered oldest first.
///
/// Returns `None` for an empty slice.
pub fn series_stats(samples: &[KpiSample], kpi: Kpi) -> Option<SeriesStats> {
    let latest = samples.last()?.values().get(kpi);
    let values = samples.iter().map(|s| s.values().get(kpi));

    let count = samples.len();
    let (min, max, sum) = values.clone().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), v| (min.min(v), max.max(v), sum + v),
    );
    let mean = sum / count as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

    Some(SeriesStats {
        count,
        min,
        max,
        mean,
        std_dev: variance.sqrt(),
        latest,
    })
}
