//! Background task producing one KPI sample per tick.

use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::history::PlantHistory;
use super::simulator::{AlertThresholds, KpiSimulator};
use super::types::{unix_millis, KpiSample, LiveUpdate, LogLevel};
use crate::config::Config;
use crate::error::BackendError;
use crate::metrics;
use crate::state::{AppState, PlantSettings};

/// Produces live updates from the simulator and records them in history.
#[derive(Debug)]
pub struct PlantFeed {
    simulator: KpiSimulator,
    thresholds: AlertThresholds,
}

impl PlantFeed {
    /// Create a feed.
    pub fn new(simulator: KpiSimulator, thresholds: AlertThresholds) -> Self {
        Self {
            simulator,
            thresholds,
        }
    }

    /// Generate one sample at `now`, record it (and any log entry) in `history`,
    /// and return the update for subscribers.
    pub fn tick(&mut self, history: &mut PlantHistory, now: OffsetDateTime) -> LiveUpdate {
        let sample: KpiSample = self.simulator.sample_at(unix_millis(now));
        let log_entry = self.thresholds.spc_log_entry(sample.spc, now);

        history.push_sample(sample);
        if let Some(entry) = &log_entry {
            history.push_log(entry.clone());
        }

        LiveUpdate {
            kpi_data: sample.values(),
            log_entry,
        }
    }

    /// Back-fill history so the dashboard has something to draw on first load.
    pub fn seed(&mut self, history: &mut PlantHistory, points: usize) {
        history.seed(
            &mut self.simulator,
            unix_millis(OffsetDateTime::now_utc()),
            points,
        );
    }
}

/// Offline feed run: `samples` updates spaced one feed interval apart from `start`.
///
/// The iterator ends early if a timestamp would leave the representable range.
///
/// # Errors
/// Returns [`BackendError::InvalidConfig`] if the configuration does not validate.
pub fn simulated_updates(
    config: &Config,
    start: OffsetDateTime,
    samples: u32,
) -> Result<impl Iterator<Item = LiveUpdate>, BackendError> {
    config.validate().map_err(BackendError::InvalidConfig)?;

    let settings = PlantSettings::from(config);
    let mut feed = PlantFeed::new(
        KpiSimulator::from_seed(config.simulator_seed),
        settings.thresholds,
    );
    let mut history = PlantHistory::new(settings.history_capacity, settings.log_capacity);
    let step = time::Duration::milliseconds(
        i64::try_from(config.feed_interval_ms).unwrap_or(i64::MAX),
    );

    Ok((0..samples).map_while(move |i| {
        let offset = step.checked_mul(i32::try_from(i).ok()?)?;
        let at = start.checked_add(offset)?;
        Some(feed.tick(&mut history, at))
    }))
}

/// Run the feed forever, ticking every `interval`.
///
/// Marks the state ready after the first sample.
pub async fn run_feed(state: AppState, mut feed: PlantFeed, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval_ms = interval.as_millis() as u64, "Plant feed started");

    loop {
        ticker.tick().await;

        let update = {
            let mut history = state.history.write().await;
            feed.tick(&mut history, OffsetDateTime::now_utc())
        };

        metrics::inc_samples_generated();
        if let Some(entry) = &update.log_entry {
            metrics::inc_plant_alerts(entry.level);
            match entry.level {
                LogLevel::Alert => warn!(message = %entry.message, "Plant alert"),
                _ => debug!(message = %entry.message, "Plant log entry"),
            }
        }

        if !state.is_ready() {
            state.set_ready(true);
        }

        // Err only means nobody is listening right now.
        let delivered = state.live.send(update).unwrap_or(0);
        debug!(subscribers = delivered, "Live update published");
    }
}
