//! Bot backend API client
//!
//! One method per endpoint:
//! - Bot status and lifecycle commands
//! - Balance + positions snapshot
//! - Logs (structured JSON, legacy plaintext accepted)
//! - Candles per symbol
//! - Trading config read/update
//!
//! Exactly one request per call: no retries, no caching. Retry policy lives in the scheduler.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::legacy_logs;
use crate::types::{
    BotCommand, BotConfig, CandlesResponse, CommandOutcome, CommandResponse, ConfigPatch,
    ConfigResponse, DataResponse, LogEntry, LogsResponse, StatusResponse,
};

const DEFAULT_CANDLE_INTERVAL: &str = "1m";

/// Bot backend client; cheap to clone, clones share the connection pool
#[derive(Debug, Clone)]
pub struct BotClient {
    http: reqwest::Client,
    base_url: Url,
    candle_interval: String,
}

impl BotClient {
    /// Create client with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| DashboardError::Config(format!("Invalid api_url {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(DashboardError::Config(format!("api_url {base_url} cannot be a base URL")));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            candle_interval: DEFAULT_CANDLE_INTERVAL.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.base_url(), config.request_timeout())?
            .with_candle_interval(&config.candle_interval))
    }

    pub fn with_candle_interval(mut self, interval: &str) -> Self {
        self.candle_interval = interval.to_string();
        self
    }

    /// Candle interval the poll loop asks for
    pub fn candle_interval(&self) -> &str {
        &self.candle_interval
    }

    /// Get bot process status
    pub async fn get_status(&self) -> Result<StatusResponse> {
        let body = self.get_text(&["status"], &[]).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Get balance and open positions in one snapshot
    pub async fn get_balance_and_positions(&self) -> Result<DataResponse> {
        let body = self.get_text(&["data"], &[]).await?;
        unwrap_envelope(&body)
    }

    /// Get the latest log window
    ///
    /// JSON bodies must follow the structured contract; anything else is read as
    /// tagged plaintext.
    pub async fn get_logs(&self) -> Result<Vec<LogEntry>> {
        let body = self.get_text(&["logs"], &[]).await?;
        let trimmed = body.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            let logs: LogsResponse = unwrap_envelope(&body)?;
            return Ok(logs.logs);
        }
        debug!("/logs returned plaintext, using legacy adapter");
        Ok(legacy_logs::parse_tagged_lines(&body))
    }

    /// Get the raw candle array for a symbol; validation happens in the view model
    pub async fn get_candles(&self, symbol: &str, interval: &str) -> Result<Vec<Value>> {
        let body = self
            .get_text(&["coin_data", symbol], &[("interval", interval)])
            .await?;
        let candles: CandlesResponse = unwrap_envelope(&body)?;
        Ok(candles.data)
    }

    /// Send a lifecycle command; a rejected command is an `Ok` with `success == false`
    pub async fn send_command(&self, command: BotCommand) -> Result<CommandOutcome> {
        let url = self.url(&[command.path().trim_start_matches('/')])?;
        let response = self.http.post(url).send().await?;
        let body = Self::handle_response(response).await?;
        let resp: CommandResponse = serde_json::from_str(&body)?;
        Ok(resp.into())
    }

    /// Get current trading config
    pub async fn get_config(&self) -> Result<BotConfig> {
        let body = self.get_text(&["get_config"], &[]).await?;
        let resp: ConfigResponse = unwrap_envelope(&body)?;
        Ok(resp.config)
    }

    /// Post a config update as form fields; only fields set in the patch are sent
    pub async fn set_config(&self, patch: &ConfigPatch) -> Result<CommandOutcome> {
        let url = self.url(&["config"])?;
        let response = self.http.post(url).form(&patch.to_form()).send().await?;
        let body = Self::handle_response(response).await?;
        let resp: CommandResponse = serde_json::from_str(&body)?;
        Ok(resp.into())
    }

    /// Build an endpoint URL; segments are percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| DashboardError::Config(format!("api_url {} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Perform GET request and return the body text
    async fn get_text(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<String> {
        let url = self.url(segments)?;
        let mut request = self.http.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Handle API response, checking for HTTP errors
    async fn handle_response(response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(DashboardError::HttpStatus {
                status: status.as_u16(),
                body: error_text,
            });
        }

        response.text().await.map_err(DashboardError::from)
    }
}

/// Check the `{"status": "success", ...}` envelope and decode the payload
fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let value: Value = serde_json::from_str(body)?;
    let status = value.get("status").and_then(Value::as_str).unwrap_or_default();
    if status != "success" {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("backend reported failure");
        return Err(DashboardError::Backend(message.to_string()));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{Route, StubServer, dead_address};
    use crate::types::BotStatus;

    fn client(base_url: &str) -> BotClient {
        BotClient::new(base_url, Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn test_url_building() {
        let client = client("http://bot.local:5000/api/");
        let url = client.url(&["coin_data", "BTC/USDT"]).unwrap();
        assert_eq!(url.as_str(), "http://bot.local:5000/api/coin_data/BTC%2FUSDT");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = BotClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, DashboardError::Config(_)));
    }

    #[tokio::test]
    async fn test_get_status() {
        let server = StubServer::start(vec![Route::json(
            "GET",
            "/status",
            r#"{"status":"running","pid":1234}"#,
        )])
        .await;

        let status = client(&server.base_url).get_status().await.unwrap();
        assert_eq!(status.status, BotStatus::Running);
        assert_eq!(server.count("GET", "/status"), 1);
    }

    #[tokio::test]
    async fn test_http_status_error() {
        let server = StubServer::start(vec![
            Route::text("GET", "/data", "Internal Server Error").with_status(500),
        ])
        .await;

        let err = client(&server.base_url)
            .get_balance_and_positions()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HttpStatus);
        assert!(matches!(err, DashboardError::HttpStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_decode_error() {
        let server = StubServer::start(vec![Route::json("GET", "/status", "{not json")]).await;

        let err = client(&server.base_url).get_status().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_backend_envelope_error() {
        let server = StubServer::start(vec![Route::json(
            "GET",
            "/coin_data/DOGEUSDT",
            r#"{"status":"error","message":"No data for DOGEUSDT with interval 1m"}"#,
        )])
        .await;

        let err = client(&server.base_url)
            .get_candles("DOGEUSDT", "1m")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(err.to_string().contains("No data for DOGEUSDT"));

        let requests = server.requests();
        assert_eq!(requests[0].target, "/coin_data/DOGEUSDT?interval=1m");
    }

    #[tokio::test]
    async fn test_network_error() {
        let base = dead_address().await;
        let err = client(&base).get_status().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let server = StubServer::start(vec![
            Route::json("GET", "/status", r#"{"status":"running"}"#)
                .with_delay(Duration::from_secs(3)),
        ])
        .await;

        let client = BotClient::new(&server.base_url, Duration::from_millis(200)).unwrap();
        let err = client.get_status().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_get_logs_structured_and_legacy() {
        let server = StubServer::start(vec![Route::json(
            "GET",
            "/logs",
            r#"{"status":"success","logs":[{"timestamp":"2024-05-01 10:00:00","category":"system","level":40,"message":"boom"}]}"#,
        )])
        .await;
        let logs = client(&server.base_url).get_logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, 40);

        let legacy = StubServer::start(vec![Route::text(
            "GET",
            "/logs",
            "2024-05-01 10:00:00 [TRADE] Short ADAUSDT\n2024-05-01 10:00:01 [WARNING] [SYSTEM] slow\n",
        )])
        .await;
        let logs = client(&legacy.base_url).get_logs().await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].level, 30);
    }

    #[tokio::test]
    async fn test_send_command_outcomes() {
        let server = StubServer::start(vec![
            Route::json("POST", "/start", r#"{"status":"success","message":"Trading bot started with PID: 99"}"#),
            Route::json("POST", "/restart", r#"{"status":"error","message":"Bot restart timed out"}"#),
        ])
        .await;
        let client = client(&server.base_url);

        let started = client.send_command(BotCommand::Start).await.unwrap();
        assert!(started.success);
        assert!(started.message.contains("PID: 99"));

        let restarted = client.send_command(BotCommand::Restart).await.unwrap();
        assert!(!restarted.success);
        assert_eq!(restarted.message, "Bot restart timed out");
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let server = StubServer::start(vec![
            Route::json(
                "GET",
                "/get_config",
                r#"{"status":"success","config":{"coin_list":["XRPUSDT","WIFUSDT"],"trade_rate":0.2,"target_leverage":5}}"#,
            ),
            Route::json("POST", "/config", r#"{"status":"success","message":"Configuration updated."}"#),
        ])
        .await;
        let client = client(&server.base_url);

        let config = client.get_config().await.unwrap();
        assert_eq!(config.coin_list, vec!["XRPUSDT", "WIFUSDT"]);
        assert_eq!(config.target_leverage, 5);

        let patch = ConfigPatch { trade_rate: Some(0.3), ..ConfigPatch::default() }.merged_onto(&config);
        let outcome = client.set_config(&patch).await.unwrap();
        assert!(outcome.success);

        let posted = server
            .requests()
            .into_iter()
            .find(|r| r.method == "POST")
            .expect("config post recorded");
        assert_eq!(posted.body, "coin_list=XRPUSDT%2CWIFUSDT&trade_rate=0.3&target_leverage=5");
    }
}
