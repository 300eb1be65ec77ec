//! Bot Dashboard - polling monitor for a crypto trading bot backend
//!
//! Pulls bot status, balance, positions, logs and candles from the bot's HTTP API
//! on independent timers and keeps one consistent page in sync with them.
//!
//! # Architecture
//! - `client`: one typed call per backend endpoint
//! - `view_model`: pure payload to display transforms
//! - `render` + `dashboard`: idempotent mount writes and page composition
//! - `scheduler`: per-feed poll timers with skip-based backpressure and backoff
//! - `chart`: candle widget lifecycle with stale-result protection
//! - `controller`: app state, wiring outcomes into views
//! - `runtime`: single-threaded event loop driving it all
//!
//! # Features
//! - Bot start/stop/restart with transient notifications
//! - Trading config view and update
//! - Market status per position
//! - Legacy plaintext `/logs` bodies accepted

// Clippy configuration for dashboard code patterns
#![allow(clippy::cast_precision_loss)] // Float casts OK for display
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)] // Page templates and renderers
#![allow(clippy::doc_markdown)] // Doc style flexibility
#![allow(clippy::float_cmp)] // Zero-leverage and zero-margin guards compare exactly
#![allow(clippy::format_push_string)] // Markup builders

pub mod chart;
pub mod client;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod legacy_logs;
pub mod render;
pub mod runtime;
pub mod scheduler;
pub mod types;
pub mod view_model;

#[cfg(test)]
mod test_support;

pub use chart::{ChartAdapter, ChartBackend, ChartWidget, SvgChartBackend};
pub use client::BotClient;
pub use config::Config;
pub use controller::{AppState, Dashboard, Outcome, Request, UiEvent};
pub use dashboard::dashboard_html;
pub use error::{DashboardError, ErrorKind, Result};
pub use render::{Document, HtmlDocument};
pub use scheduler::{PollScheduler, TaskKind};
pub use types::*;
