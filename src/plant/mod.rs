//! Plant data: KPI types, simulation, history window and the live feed.

pub mod feed;
pub mod history;
pub mod simulator;
pub mod stats;
pub mod types;

pub use feed::{run_feed, simulated_updates, PlantFeed};
pub use history::{HistorySnapshot, PlantHistory};
pub use simulator::{AlertThresholds, KpiSimulator};
pub use stats::{series_stats, SeriesStats};
pub use types::{
    unix_millis, unix_millis_now, ChartPoint, Kpi, KpiSample, KpiValues, LiveUpdate, LogEntry,
    LogLevel, PlantStatus,
};
