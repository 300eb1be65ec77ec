//! View models - pure payload to render-ready transforms
//!
//! Nothing here fails: absent or garbled numbers display as zero, unknown enums
//! get a neutral style, malformed candles are dropped.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::types::{
    BalanceSnapshot, BotConfig, BotStatus, Candle, LenientNumber, LogCategory, LogEntry,
    PositionMap,
};

/// Sign-based color class, matching the page's `.positive` / `.negative` / `.neutral`
pub fn pnl_class(value: f64) -> &'static str {
    if value > 0.0 {
        "positive"
    } else if value < 0.0 {
        "negative"
    } else {
        "neutral"
    }
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub text: &'static str,
    pub class: &'static str,
}

pub fn to_status_badge(status: BotStatus) -> StatusBadge {
    match status {
        BotStatus::Running => StatusBadge { text: "Active", class: "status-active" },
        BotStatus::Stopped | BotStatus::Unknown => StatusBadge {
            text: "Inactive",
            class: "status-inactive",
        },
    }
}

// ============================================================================
// Balance
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceView {
    pub total: String,
    pub free: String,
    pub used: String,
    pub pnl: String,
    pub pnl_class: &'static str,
}

/// Format the whole snapshot at once; the wallet figure is the displayed total
pub fn to_balance_view(snapshot: &BalanceSnapshot) -> BalanceView {
    let pnl = snapshot.pnl.or_zero();
    BalanceView {
        total: format!("{:.2}", snapshot.wallet.or_zero()),
        free: format!("{:.2}", snapshot.free.or_zero()),
        used: format!("{:.2}", snapshot.used.or_zero()),
        pnl: format!("{pnl:.2}"),
        pnl_class: pnl_class(pnl),
    }
}

// ============================================================================
// Positions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Long => "Long",
            Side::Short => "Short",
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Side::Long => "positive",
            Side::Short => "negative",
        }
    }
}

/// Trend classification the bot attaches to each symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    StrongTrendUp,
    Rising,
    SidewaysOrWeakTrend,
    Falling,
    StrongTrendDown,
    Unknown,
}

impl MarketStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("Strong_Trend_Up") => MarketStatus::StrongTrendUp,
            Some("Rising") => MarketStatus::Rising,
            Some("Sideways_Or_Weak_Trend") => MarketStatus::SidewaysOrWeakTrend,
            Some("Falling") => MarketStatus::Falling,
            Some("Strong_Trend_Down") => MarketStatus::StrongTrendDown,
            _ => MarketStatus::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MarketStatus::StrongTrendUp => "Strong Trend Up",
            MarketStatus::Rising => "Rising",
            MarketStatus::SidewaysOrWeakTrend => "Sideways / Weak Trend",
            MarketStatus::Falling => "Falling",
            MarketStatus::StrongTrendDown => "Strong Trend Down",
            MarketStatus::Unknown => "Unknown",
        }
    }

    pub fn color_class(self) -> &'static str {
        match self {
            MarketStatus::StrongTrendUp => "green-600",
            MarketStatus::Rising => "green-400",
            MarketStatus::SidewaysOrWeakTrend => "yellow-500",
            MarketStatus::Falling => "red-400",
            MarketStatus::StrongTrendDown => "red-600",
            MarketStatus::Unknown => "gray",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionRow {
    pub symbol: String,
    pub side: Side,
    /// Signed amount, kept for ordering and tests
    pub amount: f64,
    pub margin_value: f64,
    pub size: String,
    pub entry_price: String,
    pub margin: String,
    pub pnl: String,
    pub pnl_percent: String,
    pub pnl_class: &'static str,
    pub market_status: MarketStatus,
}

/// Initial margin: |amount * entry| / leverage, zero when leverage is zero
pub fn position_margin(amount: f64, entry_price: f64, leverage: f64) -> f64 {
    if leverage == 0.0 {
        return 0.0;
    }
    (amount * entry_price / leverage).abs()
}

/// Return on margin as a 2-decimal percentage; "0.00" when there is no margin
pub fn pnl_percent(unrealized: f64, margin: f64) -> String {
    if margin == 0.0 {
        return "0.00".to_string();
    }
    format!("{:.2}", unrealized / margin * 100.0)
}

/// Derive display rows from the latest snapshot, largest exposure first
///
/// The sort is stable, so equal sizes keep the backend's map order.
pub fn to_position_rows(positions: &PositionMap) -> Vec<PositionRow> {
    let mut rows: Vec<PositionRow> = positions
        .iter()
        .map(|(symbol, position)| {
            let amount = position.position_amount.or_zero();
            let entry = position.avg_price.or_zero();
            // absent or garbled leverage reads as 1x; an explicit 0 still means no margin
            let leverage = position.leverage.get().unwrap_or(1.0);
            let unrealized = position.unrealized_profit.or_zero();
            let margin = position_margin(amount, entry, leverage);
            let side = if amount > 0.0 { Side::Long } else { Side::Short };

            PositionRow {
                symbol: symbol.clone(),
                side,
                amount,
                margin_value: margin,
                size: format!("{amount:.3}"),
                entry_price: format!("{entry:.4}"),
                margin: format!("{margin:.2}"),
                pnl: format!("{unrealized:.2}"),
                pnl_percent: pnl_percent(unrealized, margin),
                pnl_class: if unrealized >= 0.0 { "positive" } else { "negative" },
                market_status: MarketStatus::parse(position.market_status.as_deref()),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.amount.abs().total_cmp(&a.amount.abs()));
    rows
}

// ============================================================================
// Logs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    Error,
    Warning,
    Trade,
    Balance,
    System,
    Plain,
}

impl LogStyle {
    pub fn css_class(self) -> &'static str {
        match self {
            LogStyle::Error => "log-error",
            LogStyle::Warning => "log-warning",
            LogStyle::Trade => "log-trade",
            LogStyle::Balance => "log-balance",
            LogStyle::System => "log-system",
            LogStyle::Plain => "log-plain",
        }
    }
}

/// Severity wins over category: >= 40 error, exactly 30 warning
pub fn log_style(category: LogCategory, level: u32) -> LogStyle {
    if level >= 40 {
        return LogStyle::Error;
    }
    if level == 30 {
        return LogStyle::Warning;
    }
    match category {
        LogCategory::Trade => LogStyle::Trade,
        LogCategory::Balance => LogStyle::Balance,
        LogCategory::System => LogStyle::System,
        LogCategory::Other => LogStyle::Plain,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub timestamp: String,
    pub message: String,
    pub style: LogStyle,
}

pub fn to_log_rows(entries: &[LogEntry]) -> Vec<LogRow> {
    entries
        .iter()
        .map(|entry| LogRow {
            timestamp: display_timestamp(&entry.timestamp),
            message: entry.message.clone(),
            style: log_style(entry.category, entry.level),
        })
        .collect()
}

/// Normalize backend timestamps to `YYYY-MM-DD HH:MM:SS`; unknown formats pass through
fn display_timestamp(raw: &str) -> String {
    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, FORMAT) {
        return dt.format(FORMAT).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_local().format(FORMAT).to_string();
    }
    raw.to_string()
}

// ============================================================================
// Candles
// ============================================================================

/// Validate a raw candle array into a strictly time-increasing series
///
/// Entries missing a field or with high below low are dropped. Of the rest, the
/// longest strictly increasing run of times is kept (earliest entries win ties), so
/// a single stray timestamp costs only that entry.
pub fn to_candle_series(raw: &[Value]) -> Vec<Candle> {
    let parsed: Vec<Candle> = raw.iter().filter_map(parse_candle).collect();

    // run[i]: length of the longest increasing run starting at parsed[i]
    let mut run = vec![1usize; parsed.len()];
    for i in (0..parsed.len()).rev() {
        let best = (i + 1..parsed.len())
            .filter(|&j| parsed[j].time > parsed[i].time)
            .map(|j| run[j] + 1)
            .max()
            .unwrap_or(1);
        run[i] = best;
    }

    let mut want = run.iter().copied().max().unwrap_or(0);
    let mut series: Vec<Candle> = Vec::with_capacity(want);
    for (candle, len) in parsed.into_iter().zip(run) {
        if want > 0 && len == want && series.last().is_none_or(|last| candle.time > last.time) {
            series.push(candle);
            want -= 1;
        }
    }
    series
}

fn parse_candle(value: &Value) -> Option<Candle> {
    let field = |name: &str| value.get(name).map(LenientNumber::from_json).and_then(LenientNumber::get);

    let time = field("time")?;
    if time.fract() != 0.0 || time < 0.0 {
        return None;
    }
    let candle = Candle {
        time: time as i64,
        open: field("open")?,
        high: field("high")?,
        low: field("low")?,
        close: field("close")?,
        volume: field("volume"),
    };
    (candle.high >= candle.low).then_some(candle)
}

// ============================================================================
// Chart label, config, notifications
// ============================================================================

/// Where the selected symbol's series currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesState {
    Loading,
    Ready,
    Empty,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLabel {
    pub text: String,
    pub class: &'static str,
}

pub fn to_symbol_label(symbol: Option<&str>, state: SeriesState) -> SymbolLabel {
    let Some(symbol) = symbol else {
        return SymbolLabel { text: "No coin selected".to_string(), class: "neutral" };
    };
    match state {
        SeriesState::Loading => SymbolLabel { text: format!("Selected: {symbol} (loading)"), class: "neutral" },
        SeriesState::Ready => SymbolLabel { text: format!("Selected: {symbol}"), class: "selected" },
        SeriesState::Empty => SymbolLabel { text: format!("Selected: {symbol} (no data)"), class: "negative" },
        SeriesState::Failed => SymbolLabel { text: format!("Selected: {symbol} (error)"), class: "negative" },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigView {
    pub coins: String,
    pub trade_rate: String,
    pub leverage: String,
}

pub fn to_config_view(config: &BotConfig) -> ConfigView {
    ConfigView {
        coins: if config.coin_list.is_empty() {
            "--".to_string()
        } else {
            config.coin_list.join(", ")
        },
        trade_rate: format!("{:.2}%", config.trade_rate * 100.0),
        leverage: format!("{}x", config.target_leverage),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl NotificationKind {
    pub fn css_class(self) -> &'static str {
        match self {
            NotificationKind::Success => "notify-success",
            NotificationKind::Error => "notify-error",
            NotificationKind::Info => "notify-info",
        }
    }
}
