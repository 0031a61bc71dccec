//! Bounded in-memory window of recent KPI samples and log entries.

use std::collections::VecDeque;

use serde::Serialize;

use super::simulator::KpiSimulator;
use super::types::{ChartPoint, Kpi, KpiSample, LogEntry, LogLevel};

/// Spacing between back-filled samples at startup.
pub const SEED_SPACING_MS: i64 = 20_000;

/// Recent plant history.
///
/// Samples are kept oldest-first and logs newest-first, each capped at its
/// configured capacity.
#[derive(Debug, Clone)]
pub struct PlantHistory {
    samples: VecDeque<KpiSample>,
    logs: VecDeque<LogEntry>,
    sample_capacity: usize,
    log_capacity: usize,
}

/// Dashboard-shaped history snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct HistorySnapshot {
    /// Log entries, newest first.
    pub logs: Vec<LogEntry>,
    /// SPC series, oldest first.
    pub spc: Vec<ChartPoint>,
    /// TSR series, oldest first.
    pub tsr: Vec<ChartPoint>,
    /// Clinker quality series, oldest first.
    pub clinker_quality: Vec<ChartPoint>,
    /// CO2 series, oldest first.
    pub co2: Vec<ChartPoint>,
}

impl PlantHistory {
    /// Create an empty history with the given capacities (minimum 1 each).
    pub fn new(sample_capacity: usize, log_capacity: usize) -> Self {
        let sample_capacity = sample_capacity.max(1);
        let log_capacity = log_capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(sample_capacity),
            logs: VecDeque::with_capacity(log_capacity),
            sample_capacity,
            log_capacity,
        }
    }

    /// Back-fill `points` samples ending at `now_ms`, spaced [`SEED_SPACING_MS`] apart,
    /// and log a startup entry.
    pub fn seed(&mut self, simulator: &mut KpiSimulator, now_ms: i64, points: usize) {
        for i in (1..=points as i64).rev() {
            self.push_sample(simulator.sample_at(now_ms - i * SEED_SPACING_MS));
        }
        self.push_log(LogEntry::now(LogLevel::Info, "System initialized successfully"));
    }

    /// Append a sample, dropping the oldest one when full.
    ///
    /// Samples older than the newest stored sample are clamped forward so the
    /// series stays ordered.
    pub fn push_sample(&mut self, mut sample: KpiSample) {
        if let Some(last) = self.samples.back() {
            if sample.timestamp_ms < last.timestamp_ms {
                sample.timestamp_ms = last.timestamp_ms;
            }
        }
        if self.samples.len() == self.sample_capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Prepend a log entry, dropping the oldest one when full.
    pub fn push_log(&mut self, entry: LogEntry) {
        self.logs.push_front(entry);
        self.logs.truncate(self.log_capacity);
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&KpiSample> {
        self.samples.back()
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The last `window` samples (all when `None`), oldest first.
    pub fn window(&self, window: Option<usize>) -> Vec<KpiSample> {
        let skip = window.map_or(0, |w| self.samples.len().saturating_sub(w));
        self.samples.iter().skip(skip).copied().collect()
    }

    /// Log entries, newest first.
    pub fn logs(&self) -> impl Iterator<Item = &LogEntry> {
        self.logs.iter()
    }

    /// Number of logs at each level.
    pub fn log_count(&self, level: LogLevel) -> usize {
        self.logs.iter().filter(|l| l.level == level).count()
    }

    /// One KPI as a chart series, oldest first.
    pub fn series(&self, kpi: Kpi) -> Vec<ChartPoint> {
        self.samples.iter().map(|s| s.point(kpi)).collect()
    }

    /// Snapshot in the shape the dashboard loads on startup.
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            logs: self.logs.iter().cloned().collect(),
            spc: self.series(Kpi::Spc),
            tsr: self.series(Kpi::Tsr),
            clinker_quality: self.series(Kpi::ClinkerQuality),
            co2: self.series(Kpi::Co2),
        }
    }
}
