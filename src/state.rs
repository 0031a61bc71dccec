//! Shared application state handed to every route group.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::{broadcast, RwLock};

use crate::assistant::ChatSessions;
use crate::config::Config;
use crate::plant::{AlertThresholds, LiveUpdate, PlantHistory};

/// Capacity of the live update fan-out channel.
pub const LIVE_CHANNEL_CAPACITY: usize = 64;

/// Tunables derived from [`Config`] that handlers need at request time.
#[derive(Debug, Clone)]
pub struct PlantSettings {
    /// Feed tick period.
    pub feed_interval: Duration,
    /// SPC thresholds for log entries.
    pub thresholds: AlertThresholds,
    /// Samples kept in history.
    pub history_capacity: usize,
    /// Log entries kept in history.
    pub log_capacity: usize,
    /// Turns kept per chat session.
    pub chat_history_limit: usize,
    /// Chat sessions kept before eviction.
    pub chat_max_sessions: usize,
}

impl From<&Config> for PlantSettings {
    fn from(config: &Config) -> Self {
        Self {
            feed_interval: Duration::from_millis(config.feed_interval_ms),
            thresholds: AlertThresholds {
                spc_warning: config.spc_warning_threshold,
                spc_alert: config.spc_alert_threshold,
            },
            history_capacity: config.history_capacity,
            log_capacity: config.log_capacity,
            chat_history_limit: config.chat_history_limit,
            chat_max_sessions: config.chat_max_sessions,
        }
    }
}

impl Default for PlantSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Recent KPI samples and logs.
    pub history: Arc<RwLock<PlantHistory>>,
    /// Live update fan-out.
    pub live: broadcast::Sender<LiveUpdate>,
    /// Chat conversations by session id.
    pub chat: Arc<ChatSessions>,
    /// Request-time tunables.
    pub settings: Arc<PlantSettings>,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
    ready: Arc<AtomicBool>,
    started_at: Instant,
}

impl AppState {
    /// Create new app state with empty history.
    pub fn new(settings: PlantSettings) -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            history: Arc::new(RwLock::new(PlantHistory::new(
                settings.history_capacity,
                settings.log_capacity,
            ))),
            live,
            chat: Arc::new(ChatSessions::new(
                settings.chat_history_limit,
                settings.chat_max_sessions,
            )),
            settings: Arc::new(settings),
            metrics: None,
            ready: Arc::new(AtomicBool::new(false)),
            started_at: Instant::now(),
        }
    }

    /// Create app state from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(PlantSettings::from(config))
    }

    /// Attach a Prometheus handle for the metrics endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Time since the state was created.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Number of connected live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.live.receiver_count()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PlantSettings::default())
    }
}
