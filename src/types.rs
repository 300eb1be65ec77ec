//! Wire types for the bot backend
//!
//! The backend serializes numbers inconsistently (floats, numeric strings, nulls),
//! so every numeric field goes through [`LenientNumber`].

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Number that never fails to decode; garbage becomes "absent"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LenientNumber(Option<f64>);

impl LenientNumber {
    pub fn new(value: f64) -> Self {
        Self::from(value)
    }

    /// Parsed value, if the field held a finite number
    pub fn get(self) -> Option<f64> {
        self.0
    }

    /// Parsed value, or 0.0 for absent/garbled fields
    pub fn or_zero(self) -> f64 {
        self.0.unwrap_or(0.0)
    }

    pub fn from_json(value: &serde_json::Value) -> Self {
        let parsed = match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Self(parsed.filter(|v| v.is_finite()))
    }
}

impl From<f64> for LenientNumber {
    fn from(value: f64) -> Self {
        Self(Some(value).filter(|v| v.is_finite()))
    }
}

impl<'de> Deserialize<'de> for LenientNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

/// Bot process state as reported by `/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Running,
    Stopped,
    #[default]
    #[serde(other)]
    Unknown,
}

/// `/status` response
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: BotStatus,
    #[serde(default)]
    pub error: Option<String>,
}

/// Account balance, always replaced as a whole
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BalanceSnapshot {
    #[serde(default)]
    pub wallet: LenientNumber,
    #[serde(default)]
    pub total: LenientNumber,
    #[serde(default)]
    pub free: LenientNumber,
    #[serde(default)]
    pub used: LenientNumber,
    #[serde(default)]
    pub pnl: LenientNumber,
}

/// One open position; the map key in [`DataResponse`] is the symbol
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub position_amount: LenientNumber,
    #[serde(default)]
    pub avg_price: LenientNumber,
    #[serde(default)]
    pub leverage: LenientNumber,
    #[serde(default)]
    pub unrealized_profit: LenientNumber,
    #[serde(default)]
    pub breakeven_price: LenientNumber,
    #[serde(default)]
    pub market_status: Option<String>,
}

/// Positions keyed by symbol, in backend order
pub type PositionMap = IndexMap<String, Position>;

/// `/data` payload after the envelope check
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataResponse {
    #[serde(default)]
    pub balance_data: BalanceSnapshot,
    #[serde(default)]
    pub position_data: PositionMap,
}

/// Log source category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Trade,
    Balance,
    System,
    #[default]
    #[serde(other)]
    Other,
}

/// One backend log line (levels follow Python's logging ordinals: 20 info, 30 warning, 40 error)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub category: LogCategory,
    #[serde(default, deserialize_with = "lenient_level")]
    pub level: u32,
    #[serde(default)]
    pub message: String,
}

fn lenient_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(LenientNumber::deserialize(deserializer)?
        .get()
        .map_or(0, |v| v.max(0.0) as u32))
}

/// `/logs` payload after the envelope check
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

/// Validated OHLC candle; `time` is unix seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

/// `/coin_data` payload after the envelope check; entries are validated later
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandlesResponse {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

/// Trading parameters exposed by `/get_config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub coin_list: Vec<String>,
    pub trade_rate: f64,
    pub target_leverage: u32,
}

/// `/get_config` payload after the envelope check
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigResponse {
    pub config: BotConfig,
}

/// Partial update for [`BotConfig`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub coin_list: Option<Vec<String>>,
    pub trade_rate: Option<f64>,
    pub target_leverage: Option<u32>,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        self.coin_list.is_none() && self.trade_rate.is_none() && self.target_leverage.is_none()
    }

    /// Fill unset fields from `current` so the backend receives every form field
    pub fn merged_onto(&self, current: &BotConfig) -> ConfigPatch {
        ConfigPatch {
            coin_list: Some(self.coin_list.clone().unwrap_or_else(|| current.coin_list.clone())),
            trade_rate: Some(self.trade_rate.unwrap_or(current.trade_rate)),
            target_leverage: Some(self.target_leverage.unwrap_or(current.target_leverage)),
        }
    }

    /// Form fields in the shape `/config` expects
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        let mut form = Vec::new();
        if let Some(coins) = &self.coin_list {
            form.push(("coin_list", coins.join(",")));
        }
        if let Some(rate) = self.trade_rate {
            form.push(("trade_rate", rate.to_string()));
        }
        if let Some(leverage) = self.target_leverage {
            form.push(("target_leverage", leverage.to_string()));
        }
        form
    }
}

/// Bot lifecycle commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Stop,
    Restart,
}

impl BotCommand {
    pub fn path(self) -> &'static str {
        match self {
            BotCommand::Start => "/start",
            BotCommand::Stop => "/stop",
            BotCommand::Restart => "/restart",
        }
    }
}

impl std::fmt::Display for BotCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotCommand::Start => write!(f, "start"),
            BotCommand::Stop => write!(f, "stop"),
            BotCommand::Restart => write!(f, "restart"),
        }
    }
}

/// Result of a command or config update as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
}

/// `{status, message}` body shared by commands and `/config`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommandResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl From<CommandResponse> for CommandOutcome {
    fn from(resp: CommandResponse) -> Self {
        Self {
            success: resp.status == "success",
            message: resp.message,
        }
    }
}
