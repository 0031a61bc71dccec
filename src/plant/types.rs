//! Plant KPI and log types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Key performance indicators tracked for the kiln line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Kpi {
    /// Specific power consumption (kWh/t).
    #[strum(serialize = "spc")]
    Spc,
    /// Thermal substitution rate (%).
    #[strum(serialize = "tsr")]
    Tsr,
    /// Clinker quality index (%).
    #[strum(serialize = "clinker_quality")]
    ClinkerQuality,
    /// CO2 emission index.
    #[strum(serialize = "co2")]
    Co2,
}

impl Kpi {
    /// Human-readable name.
    pub fn title(&self) -> &'static str {
        match self {
            Kpi::Spc => "Specific Power Consumption",
            Kpi::Tsr => "Thermal Substitution Rate",
            Kpi::ClinkerQuality => "Clinker Quality Index",
            Kpi::Co2 => "CO₂ Emissions",
        }
    }

    /// Display unit.
    pub fn unit(&self) -> &'static str {
        match self {
            Kpi::Spc => "kWh/t",
            Kpi::Tsr | Kpi::ClinkerQuality => "%",
            Kpi::Co2 => "t/t clinker",
        }
    }
}

/// KPI values without a timestamp, as pushed to live subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiValues {
    /// Specific power consumption (kWh/t).
    pub spc: f64,
    /// Thermal substitution rate (%).
    pub tsr: f64,
    /// Clinker quality index (%).
    pub clinker_quality: f64,
    /// CO2 emission index.
    pub co2: f64,
}

impl KpiValues {
    /// Value of a single KPI.
    pub fn get(&self, kpi: Kpi) -> f64 {
        match kpi {
            Kpi::Spc => self.spc,
            Kpi::Tsr => self.tsr,
            Kpi::ClinkerQuality => self.clinker_quality,
            Kpi::Co2 => self.co2,
        }
    }
}

/// One timestamped reading of every KPI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiSample {
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: i64,
    /// Specific power consumption (kWh/t).
    pub spc: f64,
    /// Thermal substitution rate (%).
    pub tsr: f64,
    /// Clinker quality index (%).
    pub clinker_quality: f64,
    /// CO2 emission index.
    pub co2: f64,
}

impl KpiSample {
    /// Attach a timestamp to a set of values.
    pub fn new(timestamp_ms: i64, values: KpiValues) -> Self {
        Self {
            timestamp_ms,
            spc: values.spc,
            tsr: values.tsr,
            clinker_quality: values.clinker_quality,
            co2: values.co2,
        }
    }

    /// Values without the timestamp.
    pub fn values(&self) -> KpiValues {
        KpiValues {
            spc: self.spc,
            tsr: self.tsr,
            clinker_quality: self.clinker_quality,
            co2: self.co2,
        }
    }

    /// Chart point for a single KPI.
    pub fn point(&self, kpi: Kpi) -> ChartPoint {
        ChartPoint {
            x: self.timestamp_ms,
            y: self.values().get(kpi),
        }
    }
}

/// Single chart data point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Unix timestamp in milliseconds.
    pub x: i64,
    /// Value.
    pub y: f64,
}

/// Severity of a plant log entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
pub enum LogLevel {
    /// Informational.
    #[default]
    Info,
    /// Value outside the comfortable band.
    Warning,
    /// Value in the critical band.
    Alert,
}

/// Plant log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 timestamp, doubling as the entry identifier.
    pub id: String,
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
}

impl LogEntry {
    /// Create an entry stamped with the given time.
    pub fn at(time: OffsetDateTime, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id: format_id(time),
            level,
            message: message.into(),
        }
    }

    /// Create an entry stamped with the current time.
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        Self::at(OffsetDateTime::now_utc(), level, message)
    }
}

fn format_id(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| time.unix_timestamp().to_string())
}

/// Overall plant operating status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
pub enum PlantStatus {
    /// Feed is producing samples.
    Running,
    /// No sample has been produced yet.
    #[default]
    Stopped,
}

impl PlantStatus {
    /// Status for a feed that has or has not produced its first sample.
    pub fn from_ready(ready: bool) -> Self {
        if ready {
            PlantStatus::Running
        } else {
            PlantStatus::Stopped
        }
    }
}

/// Payload pushed to live subscribers on every feed tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveUpdate {
    /// Latest KPI values.
    pub kpi_data: KpiValues,
    /// Log entry raised by this sample, if any.
    pub log_entry: Option<LogEntry>,
}

/// Convert an `OffsetDateTime` to Unix milliseconds.
pub fn unix_millis(time: OffsetDateTime) -> i64 {
    (time.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Current time in Unix milliseconds.
pub fn unix_millis_now() -> i64 {
    unix_millis(OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use time::macros::datetime;

    fn sample() -> KpiSample {
        KpiSample {
            timestamp_ms: 1_700_000_000_000,
            spc: 62.5,
            tsr: 55.0,
            clinker_quality: 90.1,
            co2: 12.3,
        }
    }

    #[test]
    fn kpi_names_round_trip_through_strum() {
        assert_eq!(Kpi::ClinkerQuality.to_string(), "clinker_quality");
        assert_eq!(Kpi::from_str("co2").ok(), Some(Kpi::Co2));
    }

    #[test]
    fn sample_point_selects_kpi() {
        let s = sample();
        assert_eq!(s.point(Kpi::Tsr), ChartPoint { x: 1_700_000_000_000, y: 55.0 });
        assert_eq!(s.point(Kpi::Co2).y, 12.3);
    }

    #[test]
    fn log_level_serializes_with_dashboard_names() {
        let json = serde_json::to_string(&LogLevel::Warning).unwrap();
        assert_eq!(json, "\"Warning\"");
    }

    #[test]
    fn log_entry_id_is_rfc3339() {
        let entry = LogEntry::at(datetime!(2024-05-01 12:00:00 UTC), LogLevel::Info, "ok");
        assert_eq!(entry.id, "2024-05-01T12:00:00Z");
    }

    #[test]
    fn live_update_matches_dashboard_shape() {
        let update = LiveUpdate {
            kpi_data: sample().values(),
            log_entry: None,
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["kpi_data"]["clinker_quality"], 90.1);
        assert!(value["log_entry"].is_null());
    }

    #[test]
    fn plant_status_follows_feed_readiness() {
        assert_eq!(PlantStatus::from_ready(false), PlantStatus::Stopped);
        assert_eq!(PlantStatus::from_ready(true), PlantStatus::Running);
        assert_eq!(PlantStatus::default(), PlantStatus::Stopped);
    }

    #[test]
    fn unix_millis_truncates_nanos() {
        assert_eq!(unix_millis(datetime!(1970-01-01 00:00:01.5 UTC)), 1500);
    }
}
