//! Application configuration loaded from environment variables.

use serde::Deserialize;

/// Origin value that selects the wildcard CORS policy.
pub const WILDCARD_ORIGIN: &str = "*";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// Bind address for the HTTP server.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    // === CORS ===
    /// Allowed browser origins (comma-separated in the environment).
    /// A `*` entry selects the wildcard policy.
    #[serde(default = "default_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,

    /// Whether credentialed cross-origin requests are allowed.
    /// Only honoured with an explicit origin allow-list.
    #[serde(default = "default_true")]
    pub cors_allow_credentials: bool,

    // === Live Feed ===
    /// Milliseconds between simulated KPI samples.
    #[serde(default = "default_feed_interval")]
    pub feed_interval_ms: u64,

    /// Number of KPI samples kept in memory.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Number of log entries kept in memory.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Samples back-filled into history at startup.
    #[serde(default = "default_seed_points")]
    pub history_seed_points: usize,

    /// SPC value (kWh/t) above which a warning is logged.
    #[serde(default = "default_spc_warning")]
    pub spc_warning_threshold: f64,

    /// SPC value (kWh/t) above which an alert is logged.
    #[serde(default = "default_spc_alert")]
    pub spc_alert_threshold: f64,

    /// Fixed seed for the KPI simulator.
    #[serde(default)]
    pub simulator_seed: Option<u64>,

    // === Chatbot ===
    /// Conversation turns kept per chat session.
    #[serde(default = "default_chat_history_limit")]
    pub chat_history_limit: usize,

    /// Chat sessions kept before the least recently used one is evicted.
    #[serde(default = "default_chat_max_sessions")]
    pub chat_max_sessions: usize,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    // Intended allow-list once the deployed frontend URL is known:
    // vec!["http://localhost:5173".to_string()]
    vec![WILDCARD_ORIGIN.to_string()]
}

fn default_true() -> bool {
    true
}

fn default_feed_interval() -> u64 {
    2000
}

fn default_history_capacity() -> usize {
    300
}

fn default_log_capacity() -> usize {
    50
}

fn default_seed_points() -> usize {
    30
}

fn default_spc_warning() -> f64 {
    70.0
}

fn default_spc_alert() -> f64 {
    85.0
}

fn default_chat_history_limit() -> usize {
    20
}

fn default_chat_max_sessions() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: default_allowed_origins(),
            cors_allow_credentials: default_true(),
            feed_interval_ms: default_feed_interval(),
            history_capacity: default_history_capacity(),
            log_capacity: default_log_capacity(),
            history_seed_points: default_seed_points(),
            spc_warning_threshold: default_spc_warning(),
            spc_alert_threshold: default_spc_alert(),
            simulator_seed: None,
            chat_history_limit: default_chat_history_limit(),
            chat_max_sessions: default_chat_max_sessions(),
            rust_log: default_log_level(),
            log_json: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        if self.feed_interval_ms == 0 {
            return Err("FEED_INTERVAL_MS must be greater than 0".to_string());
        }

        if self.history_capacity == 0 {
            return Err("HISTORY_CAPACITY must be greater than 0".to_string());
        }

        if self.log_capacity == 0 {
            return Err("LOG_CAPACITY must be greater than 0".to_string());
        }

        if self.chat_history_limit == 0 {
            return Err("CHAT_HISTORY_LIMIT must be greater than 0".to_string());
        }

        if self.chat_max_sessions == 0 {
            return Err("CHAT_MAX_SESSIONS must be greater than 0".to_string());
        }

        if self.history_seed_points > self.history_capacity {
            return Err("HISTORY_SEED_POINTS must not exceed HISTORY_CAPACITY".to_string());
        }

        if !self.spc_warning_threshold.is_finite() || !self.spc_alert_threshold.is_finite() {
            return Err("SPC thresholds must be finite numbers".to_string());
        }

        if self.spc_warning_threshold >= self.spc_alert_threshold {
            return Err(
                "SPC_WARNING_THRESHOLD must be lower than SPC_ALERT_THRESHOLD".to_string(),
            );
        }

        if self.cors_allowed_origins.iter().any(|o| o.trim().is_empty()) {
            return Err("CORS_ALLOWED_ORIGINS must not contain empty entries".to_string());
        }

        Ok(())
    }

    /// Whether the wildcard CORS policy is selected.
    pub fn cors_is_wildcard(&self) -> bool {
        self.cors_allowed_origins.is_empty()
            || self
                .cors_allowed_origins
                .iter()
                .any(|o| o.trim() == WILDCARD_ORIGIN)
    }

    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
