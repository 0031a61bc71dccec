//! Synthetic KPI generator standing in for the plant historian.
//!
//! Values follow the bands the dashboard was designed around:
//! SPC oscillates around 55 kWh/t with a slow sine drift, TSR around 60 %,
//! clinker quality between 85 and 95 %, CO2 index between 10 and 15.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::{KpiSample, KpiValues, LogEntry, LogLevel};
use time::OffsetDateTime;

/// SPC thresholds used to raise log entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    /// Above this SPC a warning is raised.
    pub spc_warning: f64,
    /// Above this SPC an alert is raised.
    pub spc_alert: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            spc_warning: 70.0,
            spc_alert: 85.0,
        }
    }
}

impl AlertThresholds {
    /// Classify an SPC reading. `None` means nothing worth logging.
    pub fn classify_spc(&self, spc: f64) -> Option<LogLevel> {
        if spc > self.spc_alert {
            Some(LogLevel::Alert)
        } else if spc > self.spc_warning {
            Some(LogLevel::Warning)
        } else {
            None
        }
    }

    /// Build the log entry for an SPC reading, if it crosses a threshold.
    pub fn spc_log_entry(&self, spc: f64, at: OffsetDateTime) -> Option<LogEntry> {
        let level = self.classify_spc(spc)?;
        let message = match level {
            LogLevel::Alert => format!("Critical SPC: {spc:.1} kWh/t!"),
            _ => format!("High SPC: {spc:.1} kWh/t."),
        };
        Some(LogEntry::at(at, level, message))
    }
}

/// Random KPI generator.
#[derive(Debug)]
pub struct KpiSimulator {
    rng: StdRng,
}

impl KpiSimulator {
    /// Create a simulator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a deterministic simulator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a simulator from an optional seed.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::new(),
        }
    }

    /// Generate KPI values for the given instant.
    pub fn values_at(&mut self, timestamp_ms: i64) -> KpiValues {
        let phase = timestamp_ms as f64 * 0.001;
        KpiValues {
            spc: self.rng.gen::<f64>() * 30.0 + 40.0 + phase.sin() * 15.0,
            tsr: self.rng.gen::<f64>() * 20.0 + 50.0 + phase.cos() * 10.0,
            clinker_quality: self.rng.gen::<f64>() * 10.0 + 85.0,
            co2: self.rng.gen::<f64>() * 5.0 + 10.0,
        }
    }

    /// Generate a timestamped sample.
    pub fn sample_at(&mut self, timestamp_ms: i64) -> KpiSample {
        KpiSample::new(timestamp_ms, self.values_at(timestamp_ms))
    }
}

impl Default for KpiSimulator {
    fn default() -> Self {
        Self::new()
    }
}
