//! Configuration management for the dashboard

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{DashboardError, Result};

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the bot backend (e.g. `http://127.0.0.1:5000`)
    pub api_url: String,

    /// Environment (production, staging, development)
    pub environment: String,

    /// Log level
    pub log_level: String,

    /// Poll cadence per feed
    pub status_interval_ms: u64,
    pub data_interval_ms: u64,
    pub logs_interval_ms: u64,
    pub chart_interval_ms: u64,

    /// Per-request timeout; an expired request counts as a network failure
    pub request_timeout_secs: u64,

    /// Upper bound for the failure backoff of any task
    pub max_backoff_ms: u64,

    /// Candle interval requested from `/coin_data`
    pub candle_interval: String,

    /// Whether picking a symbol also switches the chart to it
    pub select_updates_chart: bool,

    /// Whether the chart view starts visible
    pub chart_visible: bool,

    /// How long a command notification stays on screen
    pub notification_ttl_ms: u64,

    /// Where the binary writes the composed page
    pub output_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup; unset or unparsable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str, default: u64| -> u64 {
            lookup(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
        };
        let flag = |key: &str, default: bool| -> bool {
            lookup(key).map_or(default, |v| v.trim().eq_ignore_ascii_case("true"))
        };

        Self {
            api_url: lookup("DASHBOARD_API_URL")
                .unwrap_or_else(|| "http://127.0.0.1:5000".to_string()),

            environment: lookup("DASHBOARD_ENVIRONMENT").unwrap_or_else(|| "production".to_string()),

            log_level: lookup("DASHBOARD_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            // Backend refreshes its tables every second
            status_interval_ms: parsed("DASHBOARD_STATUS_INTERVAL_MS", 1_000),
            data_interval_ms: parsed("DASHBOARD_DATA_INTERVAL_MS", 1_000),
            logs_interval_ms: parsed("DASHBOARD_LOGS_INTERVAL_MS", 1_000),
            chart_interval_ms: parsed("DASHBOARD_CHART_INTERVAL_MS", 1_000),

            request_timeout_secs: parsed("DASHBOARD_REQUEST_TIMEOUT_SECS", 10),

            max_backoff_ms: parsed("DASHBOARD_MAX_BACKOFF_MS", 30_000),

            candle_interval: lookup("DASHBOARD_CANDLE_INTERVAL").unwrap_or_else(|| "1m".to_string()),

            select_updates_chart: flag("DASHBOARD_SELECT_UPDATES_CHART", true),

            chart_visible: flag("DASHBOARD_CHART_VISIBLE", true),

            notification_ttl_ms: parsed("DASHBOARD_NOTIFICATION_TTL_MS", 3_000),

            output_path: lookup("DASHBOARD_OUTPUT")
                .map_or_else(|| PathBuf::from("dashboard.html"), PathBuf::from),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(DashboardError::Config(format!(
                "api_url must be an http(s) URL, got {:?}",
                self.api_url
            )));
        }
        let intervals = [
            ("status_interval_ms", self.status_interval_ms),
            ("data_interval_ms", self.data_interval_ms),
            ("logs_interval_ms", self.logs_interval_ms),
            ("chart_interval_ms", self.chart_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(DashboardError::Config(format!("{name} must be positive")));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(DashboardError::Config("request_timeout_secs must be positive".into()));
        }
        let longest = intervals.iter().map(|(_, v)| *v).max().unwrap_or(0);
        if self.max_backoff_ms < longest {
            return Err(DashboardError::Config(
                "max_backoff_ms must not be shorter than the longest poll interval".into(),
            ));
        }
        if self.candle_interval.trim().is_empty() {
            return Err(DashboardError::Config("candle_interval must not be empty".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    /// API URL without a trailing slash, ready for path concatenation
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
