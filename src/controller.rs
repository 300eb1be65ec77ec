//! Dashboard controller - owns all UI state and wires results into the page
//!
//! The controller never performs I/O. It emits [`Request`]s, the runtime turns
//! them into client calls, and the results come back as [`Outcome`]s. Every outcome
//! goes through the same path: view model, then renderer.

use std::str::FromStr;

use chrono::Local;
use serde_json::Value;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::chart::{CandleTicket, ChartAdapter, ChartBackend};
use crate::config::Config;
use crate::error::{DashboardError, ErrorKind, Result};
use crate::render::{self, HtmlDocument, mount};
use crate::scheduler::{PollScheduler, TaskKind};
use crate::types::{
    BalanceSnapshot, BotCommand, BotConfig, BotStatus, CommandOutcome, ConfigPatch, DataResponse,
    LogEntry, PositionMap, StatusResponse,
};
use crate::view_model::{
    NotificationKind, PositionRow, SeriesState, to_balance_view, to_candle_series,
    to_config_view, to_log_rows, to_position_rows, to_status_badge, to_symbol_label,
};

/// Work for the runtime: one client call each
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Status,
    Data,
    Logs,
    /// `periodic` is set when the chart poll task issued it
    Candles { ticket: CandleTicket, periodic: bool },
    Config,
    Command(BotCommand),
    SetConfig(ConfigPatch),
}

/// Result of a [`Request`]
#[derive(Debug)]
pub enum Outcome {
    Status(Result<StatusResponse>),
    Data(Result<DataResponse>),
    Logs(Result<Vec<LogEntry>>),
    Candles {
        ticket: CandleTicket,
        periodic: bool,
        result: Result<Vec<Value>>,
    },
    Config(Result<BotConfig>),
    Command {
        command: BotCommand,
        result: Result<CommandOutcome>,
    },
    ConfigUpdated(Result<CommandOutcome>),
}

/// User interaction
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Command(BotCommand),
    Select(String),
    ChartVisible(bool),
    UpdateConfig(ConfigPatch),
    Refresh,
}

impl FromStr for UiEvent {
    type Err = DashboardError;

    /// Console syntax: `start`, `select XRPUSDT`, `chart hide`, `config trade_rate=0.2`, `refresh`
    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or_default().to_ascii_lowercase();
        let invalid = || DashboardError::InvalidInput(line.trim().to_string());

        let event = match head.as_str() {
            "start" => UiEvent::Command(BotCommand::Start),
            "stop" => UiEvent::Command(BotCommand::Stop),
            "restart" => UiEvent::Command(BotCommand::Restart),
            "refresh" => UiEvent::Refresh,
            "select" => UiEvent::Select(words.next().ok_or_else(invalid)?.to_ascii_uppercase()),
            "chart" => match words.next() {
                Some("show") => UiEvent::ChartVisible(true),
                Some("hide") => UiEvent::ChartVisible(false),
                _ => return Err(invalid()),
            },
            "config" => {
                let mut patch = ConfigPatch::default();
                for pair in words.by_ref() {
                    let (key, value) = pair.split_once('=').ok_or_else(invalid)?;
                    match key {
                        "coin_list" => {
                            patch.coin_list = Some(
                                value
                                    .split(',')
                                    .map(|s| s.trim().to_ascii_uppercase())
                                    .filter(|s| !s.is_empty())
                                    .collect(),
                            );
                        }
                        "trade_rate" => patch.trade_rate = Some(value.parse().map_err(|_| invalid())?),
                        "target_leverage" => {
                            patch.target_leverage = Some(value.parse().map_err(|_| invalid())?);
                        }
                        _ => return Err(invalid()),
                    }
                }
                UiEvent::UpdateConfig(patch)
            }
            _ => return Err(invalid()),
        };

        if words.next().is_some() {
            return Err(invalid());
        }
        Ok(event)
    }
}

/// Transient message shown after a command
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub expires_at: Instant,
}

/// Everything the page shows, owned by the controller
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub bot_status: BotStatus,
    pub balance: Option<BalanceSnapshot>,
    pub positions: PositionMap,
    pub logs: Vec<LogEntry>,
    pub selected_symbol: Option<String>,
    pub series_state: Option<SeriesState>,
    pub bot_config: Option<BotConfig>,
    pub notification: Option<Notification>,
}

pub struct Dashboard<B: ChartBackend> {
    scheduler: PollScheduler,
    chart: ChartAdapter<B>,
    document: HtmlDocument,
    state: AppState,
    select_updates_chart: bool,
    notification_ttl: Duration,
}

impl<B: ChartBackend> Dashboard<B> {
    pub fn new(config: &Config, backend: B) -> Self {
        Self {
            scheduler: PollScheduler::from_config(config),
            chart: ChartAdapter::new(backend),
            document: HtmlDocument::new(),
            state: AppState::default(),
            select_updates_chart: config.select_updates_chart,
            notification_ttl: config.notification_ttl(),
        }
    }

    pub fn document(&self) -> &HtmlDocument {
        &self.document
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn chart(&self) -> &ChartAdapter<B> {
        &self.chart
    }

    /// Mount the chart, start every poll task and load the trading config
    pub fn start(&mut self, now: Instant) -> Vec<Request> {
        if let Err(e) = self.chart.mount(mount::CHART_CONTAINER) {
            warn!("Chart mount failed: {e}");
        }
        self.redraw_chart();
        self.render_selection();
        self.scheduler.start(now);

        let mut requests = vec![Request::Config];
        requests.extend(self.poll_due(now));
        info!(requests = requests.len(), "Dashboard started");
        requests
    }

    /// Requests for every task whose timer is due
    pub fn poll_due(&mut self, now: Instant) -> Vec<Request> {
        let due = self.scheduler.fire_due(now);
        due.into_iter()
            .filter_map(|kind| self.request_for(kind, now))
            .collect()
    }

    /// Map a fired task to its request; a chart tick with no symbol completes at once
    fn request_for(&mut self, kind: TaskKind, now: Instant) -> Option<Request> {
        match kind {
            TaskKind::Status => Some(Request::Status),
            TaskKind::Data => Some(Request::Data),
            TaskKind::Logs => Some(Request::Logs),
            TaskKind::Chart => match self.chart.refresh_ticket() {
                Some(ticket) => Some(Request::Candles { ticket, periodic: true }),
                None => {
                    self.scheduler.complete(TaskKind::Chart, true, now);
                    None
                }
            },
        }
    }

    /// Apply one result; returns follow-up requests
    pub fn apply(&mut self, outcome: Outcome, now: Instant) -> Vec<Request> {
        match outcome {
            Outcome::Status(result) => {
                self.scheduler.complete(TaskKind::Status, result.is_ok(), now);
                self.apply_status(result);
                Vec::new()
            }
            Outcome::Data(result) => {
                self.scheduler.complete(TaskKind::Data, result.is_ok(), now);
                self.apply_data(result).into_iter().collect()
            }
            Outcome::Logs(result) => {
                self.scheduler.complete(TaskKind::Logs, result.is_ok(), now);
                self.apply_logs(result);
                Vec::new()
            }
            Outcome::Candles { ticket, periodic, result } => {
                if periodic {
                    self.scheduler.complete(TaskKind::Chart, result.is_ok(), now);
                }
                self.apply_candles(&ticket, result);
                Vec::new()
            }
            Outcome::Config(result) => {
                match result {
                    Ok(config) => {
                        rendered(render::render_config(&mut self.document, &to_config_view(&config)));
                        self.state.bot_config = Some(config);
                    }
                    Err(e) => warn!(kind = ?e.kind(), "Config fetch failed: {e}"),
                }
                Vec::new()
            }
            Outcome::Command { command, result } => self.apply_command(command, result, now),
            Outcome::ConfigUpdated(result) => match result {
                Ok(outcome) if outcome.success => {
                    self.notify(outcome.message, NotificationKind::Success, now);
                    vec![Request::Config]
                }
                Ok(outcome) => {
                    self.notify(outcome.message, NotificationKind::Error, now);
                    Vec::new()
                }
                Err(e) => {
                    self.notify(format!("Failed to update config: {e}"), NotificationKind::Error, now);
                    Vec::new()
                }
            },
        }
    }

    fn apply_status(&mut self, result: Result<StatusResponse>) {
        let status = match result {
            Ok(resp) => {
                if let Some(error) = resp.error.as_deref() {
                    debug!("Bot status reports: {error}");
                }
                self.touch_refresh_time();
                resp.status
            }
            Err(e) => {
                warn!(kind = ?e.kind(), "Status fetch failed: {e}");
                BotStatus::Unknown
            }
        };
        self.state.bot_status = status;
        rendered(render::render_status(&mut self.document, &to_status_badge(status)));
    }

    fn apply_data(&mut self, result: Result<DataResponse>) -> Option<Request> {
        let data = match result {
            Ok(data) => data,
            Err(e) => {
                warn!(kind = ?e.kind(), "Balance/position fetch failed, keeping last view: {e}");
                return None;
            }
        };

        rendered(render::render_balance(&mut self.document, &to_balance_view(&data.balance_data)));
        self.state.balance = Some(data.balance_data);

        self.state.positions = data.position_data;
        let rows = to_position_rows(&self.state.positions);
        let request = self.reconcile_selection(&rows);
        rendered(render::render_positions(
            &mut self.document,
            &rows,
            self.state.selected_symbol.as_deref(),
        ));
        self.touch_refresh_time();
        request
    }

    fn apply_logs(&mut self, result: Result<Vec<LogEntry>>) {
        match result {
            Ok(entries) => {
                rendered(render::render_logs(&mut self.document, &to_log_rows(&entries)));
                self.state.logs = entries;
                self.touch_refresh_time();
            }
            Err(e) => warn!(kind = ?e.kind(), "Log fetch failed, keeping last view: {e}"),
        }
    }

    fn apply_candles(&mut self, ticket: &CandleTicket, result: Result<Vec<Value>>) {
        match result {
            Ok(raw) => {
                let series = to_candle_series(&raw);
                if raw.len() != series.len() {
                    debug!(symbol = %ticket.symbol, dropped = raw.len() - series.len(), "Dropped invalid candles");
                }
                if !self.chart.apply(ticket, &series) {
                    return;
                }
                self.state.series_state = Some(if series.is_empty() { SeriesState::Empty } else { SeriesState::Ready });
                self.redraw_chart();
            }
            Err(e) => {
                if !self.chart.is_current(ticket) {
                    return;
                }
                warn!(symbol = %ticket.symbol, kind = ?e.kind(), "Candle fetch failed: {e}");
                self.state.series_state = Some(if e.kind() == ErrorKind::Backend {
                    SeriesState::Empty
                } else {
                    SeriesState::Failed
                });
            }
        }
        self.render_selection();
    }

    fn apply_command(
        &mut self,
        command: BotCommand,
        result: Result<CommandOutcome>,
        now: Instant,
    ) -> Vec<Request> {
        match result {
            Ok(outcome) if outcome.success => {
                info!(%command, "Command accepted: {}", outcome.message);
                self.notify(outcome.message, NotificationKind::Success, now);
                // Status may be mid-flight already; if so that response covers it
                if self.scheduler.fire(TaskKind::Status, now) {
                    vec![Request::Status]
                } else {
                    Vec::new()
                }
            }
            Ok(outcome) => {
                warn!(%command, "Command rejected: {}", outcome.message);
                self.notify(outcome.message, NotificationKind::Error, now);
                Vec::new()
            }
            Err(e) => {
                warn!(%command, kind = ?e.kind(), "Command failed: {e}");
                self.notify(format!("Failed to {command} bot: {e}"), NotificationKind::Error, now);
                Vec::new()
            }
        }
    }

    /// Keep the selection while it is held or configured, else move to the top row
    fn reconcile_selection(&mut self, rows: &[PositionRow]) -> Option<Request> {
        if let Some(current) = self.state.selected_symbol.as_deref() {
            let held = self.state.positions.contains_key(current);
            let configured = self
                .state
                .bot_config
                .as_ref()
                .is_some_and(|c| c.coin_list.iter().any(|coin| coin == current));
            if held || configured {
                return None;
            }
        }

        let next = rows.first().map(|row| row.symbol.clone());
        if next == self.state.selected_symbol {
            return None;
        }
        debug!(from = ?self.state.selected_symbol, to = ?next, "Selected symbol changed");
        self.state.selected_symbol = next.clone();

        let request = match next {
            Some(symbol) => self.retarget_chart(&symbol),
            None => {
                self.chart.clear_symbol();
                self.state.series_state = None;
                self.redraw_chart();
                None
            }
        };
        self.render_selection();
        request
    }

    /// Handle a user action; returns the requests it triggers
    pub fn handle_event(&mut self, event: UiEvent, now: Instant) -> Vec<Request> {
        match event {
            UiEvent::Command(command) => {
                info!(%command, "Sending command");
                vec![Request::Command(command)]
            }
            UiEvent::Select(symbol) => self.select(symbol),
            UiEvent::ChartVisible(visible) => {
                self.scheduler.set_chart_visible(visible, now);
                Vec::new()
            }
            UiEvent::UpdateConfig(patch) => {
                if patch.is_empty() {
                    self.notify("Nothing to update".to_string(), NotificationKind::Info, now);
                    return Vec::new();
                }
                match self.state.bot_config.as_ref() {
                    Some(current) => vec![Request::SetConfig(patch.merged_onto(current))],
                    None => {
                        self.notify("Config not loaded yet".to_string(), NotificationKind::Error, now);
                        Vec::new()
                    }
                }
            }
            UiEvent::Refresh => {
                let fired: Vec<TaskKind> = TaskKind::ALL
                    .into_iter()
                    .filter(|kind| self.scheduler.fire(*kind, now))
                    .collect();
                fired
                    .into_iter()
                    .filter_map(|kind| self.request_for(kind, now))
                    .collect()
            }
        }
    }

    fn select(&mut self, symbol: String) -> Vec<Request> {
        if self.state.selected_symbol.as_deref() == Some(symbol.as_str()) {
            return Vec::new();
        }
        self.state.selected_symbol = Some(symbol.clone());
        let rows = to_position_rows(&self.state.positions);
        rendered(render::render_positions(&mut self.document, &rows, Some(symbol.as_str())));

        let request = if self.select_updates_chart { self.retarget_chart(&symbol) } else { None };
        self.render_selection();
        request.into_iter().collect()
    }

    /// Point the chart at `symbol`; a hidden chart fetches once it is shown again
    fn retarget_chart(&mut self, symbol: &str) -> Option<Request> {
        let ticket = self.chart.set_symbol(symbol);
        self.state.series_state = Some(SeriesState::Loading);
        self.scheduler
            .chart_visible()
            .then_some(Request::Candles { ticket, periodic: false })
    }

    fn notify(&mut self, message: String, kind: NotificationKind, now: Instant) {
        rendered(render::render_notification(&mut self.document, Some((message.as_str(), kind))));
        self.state.notification = Some(Notification {
            message,
            kind,
            expires_at: now + self.notification_ttl,
        });
    }

    /// Clear the notification once its time is up
    pub fn expire_notification(&mut self, now: Instant) {
        if self.state.notification.as_ref().is_some_and(|n| n.expires_at <= now) {
            self.state.notification = None;
            rendered(render::render_notification(&mut self.document, None));
        }
    }

    /// Earliest instant the runtime must wake for
    pub fn next_deadline(&self) -> Option<Instant> {
        let notification = self.state.notification.as_ref().map(|n| n.expires_at);
        match (self.scheduler.next_deadline(), notification) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Clear every timer and tear down the chart
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.chart.destroy();
        info!("Dashboard stopped");
    }

    /// The label follows the chart's symbol, so it never names a series the chart isn't drawing
    fn render_selection(&mut self) {
        let state = self.state.series_state.unwrap_or(SeriesState::Loading);
        let label = to_symbol_label(self.chart.symbol(), state);
        rendered(render::render_selected_symbol(&mut self.document, &label));
    }

    fn redraw_chart(&mut self) {
        if let Some(markup) = self.chart.markup() {
            rendered(render::render_chart(&mut self.document, markup));
        }
    }

    fn touch_refresh_time(&mut self) {
        rendered(render::render_refresh_time(&mut self.document, Local::now().time()));
    }
}

/// Renderer failures are logged and skipped
fn rendered(result: Result<()>) {
    if let Err(e) = result {
        warn!("Render skipped: {e}");
    }
}
