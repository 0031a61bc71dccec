//! KPI summary and export reports.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::plant::{series_stats, unix_millis_now, Kpi, KpiSample, LogLevel, SeriesStats};
use crate::state::AppState;

/// Route group for reports.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/summary", get(summary))
        .route("/reports/export.csv", get(export_csv))
}

/// Window selection for reports.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Number of most recent samples to include (all when absent).
    pub window: Option<usize>,
}

impl ReportQuery {
    fn window(&self) -> Result<Option<usize>, ApiError> {
        match self.window {
            Some(0) => Err(ApiError::InvalidRequest(
                "window must be greater than 0".to_string(),
            )),
            other => Ok(other),
        }
    }
}

/// Statistics per KPI.
#[derive(Debug, Serialize)]
pub struct KpiStats {
    /// SPC statistics.
    pub spc: Option<SeriesStats>,
    /// TSR statistics.
    pub tsr: Option<SeriesStats>,
    /// Clinker quality statistics.
    pub clinker_quality: Option<SeriesStats>,
    /// CO2 statistics.
    pub co2: Option<SeriesStats>,
}

/// Log entry counts by level.
#[derive(Debug, Serialize)]
pub struct LogCounts {
    /// Informational entries.
    pub info: usize,
    /// Warnings.
    pub warning: usize,
    /// Alerts.
    pub alert: usize,
}

/// Summary report.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    /// When the report was generated (Unix ms).
    pub generated_at_ms: i64,
    /// Samples covered.
    pub samples: usize,
    /// First sample timestamp covered (Unix ms).
    pub from_ms: Option<i64>,
    /// Last sample timestamp covered (Unix ms).
    pub to_ms: Option<i64>,
    /// Per-KPI statistics.
    pub kpis: KpiStats,
    /// Log counts over the retained log window.
    pub logs: LogCounts,
}

/// `GET /reports/summary` - KPI statistics over a window.
///
/// # Errors
/// Returns [`ApiError::InvalidRequest`] for `window=0`.
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<SummaryReport>, ApiError> {
    let window = query.window()?;
    let history = state.history.read().await;
    let samples = history.window(window);

    Ok(Json(SummaryReport {
        generated_at_ms: unix_millis_now(),
        samples: samples.len(),
        from_ms: samples.first().map(|s| s.timestamp_ms),
        to_ms: samples.last().map(|s| s.timestamp_ms),
        kpis: KpiStats {
            spc: series_stats(&samples, Kpi::Spc),
            tsr: series_stats(&samples, Kpi::Tsr),
            clinker_quality: series_stats(&samples, Kpi::ClinkerQuality),
            co2: series_stats(&samples, Kpi::Co2),
        },
        logs: LogCounts {
            info: history.log_count(LogLevel::Info),
            warning: history.log_count(LogLevel::Warning),
            alert: history.log_count(LogLevel::Alert),
        },
    }))
}

/// Render samples as CSV with a header row.
pub fn render_csv(samples: &[KpiSample]) -> Result<Vec<u8>, ApiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if samples.is_empty() {
        writer.write_record(["timestamp_ms", "spc", "tsr", "clinker_quality", "co2"])?;
    }
    for sample in samples {
        writer.serialize(sample)?;
    }
    writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("failed to flush csv: {e}")))
}

/// `GET /reports/export.csv` - KPI samples as a CSV attachment.
///
/// # Errors
/// Returns [`ApiError::InvalidRequest`] for `window=0`, or [`ApiError::Csv`]
/// if rendering fails.
pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = query.window()?;
    let samples = state.history.read().await.window(window);
    let body = render_csv(&samples)?;

    let disposition = format!(
        "attachment; filename=\"kpi-report-{}.csv\"",
        OffsetDateTime::now_utc().unix_timestamp()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
