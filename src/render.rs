//! Renderers - idempotent writes of view models into named mount points
//!
//! Each renderer rebuilds its mount's markup from scratch and replaces it whole.
//! Backend text is always escaped; only markup produced in this crate is trusted.

use chrono::NaiveTime;
use indexmap::IndexMap;

use crate::error::{DashboardError, Result};
use crate::view_model::{
    BalanceView, ConfigView, LogRow, NotificationKind, PositionRow, StatusBadge, SymbolLabel,
};

/// Mount point ids on the dashboard page
pub mod mount {
    pub const BOT_STATUS: &str = "bot_status";
    pub const BALANCE_PANEL: &str = "balance_panel";
    pub const POSITION_INFO: &str = "position_info";
    pub const TERMINAL_CONTENT: &str = "terminal_content";
    pub const SELECTED_SYMBOL: &str = "selected_symbol";
    pub const CHART_CONTAINER: &str = "chart_container";
    pub const CONFIG_PANEL: &str = "config_panel";
    pub const NOTIFICATION: &str = "notification";
    pub const REFRESH_TIME: &str = "refresh_time";

    pub const ALL: [&str; 9] = [
        BOT_STATUS,
        BALANCE_PANEL,
        POSITION_INFO,
        TERMINAL_CONTENT,
        SELECTED_SYMBOL,
        CHART_CONTAINER,
        CONFIG_PANEL,
        NOTIFICATION,
        REFRESH_TIME,
    ];
}

/// Minimal view surface: replace the content of a named region
pub trait Document {
    fn replace_html(&mut self, mount: &str, html: String) -> Result<()>;
}

/// In-memory page: mount id -> current inner HTML
///
/// `revision` advances only when some mount's content actually changes.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    mounts: IndexMap<String, String>,
    revision: u64,
}

impl HtmlDocument {
    /// Document with every dashboard mount, all showing a loading marker
    pub fn new() -> Self {
        let mut doc = Self::with_mounts(&mount::ALL);
        for id in [mount::BOT_STATUS, mount::REFRESH_TIME] {
            doc.mounts.insert(id.to_string(), "Loading...".to_string());
        }
        doc
    }

    pub fn with_mounts(ids: &[&str]) -> Self {
        Self {
            mounts: ids.iter().map(|id| ((*id).to_string(), String::new())).collect(),
            revision: 0,
        }
    }

    pub fn get(&self, mount: &str) -> Option<&str> {
        self.mounts.get(mount).map(String::as_str)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mounts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mounts.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for HtmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for HtmlDocument {
    fn replace_html(&mut self, mount: &str, html: String) -> Result<()> {
        let slot = self
            .mounts
            .get_mut(mount)
            .ok_or_else(|| DashboardError::MissingMount(mount.to_string()))?;
        if *slot != html {
            *slot = html;
            self.revision += 1;
        }
        Ok(())
    }
}

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_status(doc: &mut dyn Document, badge: &StatusBadge) -> Result<()> {
    doc.replace_html(
        mount::BOT_STATUS,
        format!(r#"<span class="status-badge {}">{}</span>"#, badge.class, badge.text),
    )
}

pub fn render_balance(doc: &mut dyn Document, view: &BalanceView) -> Result<()> {
    let html = format!(
        r#"<div class="card-value">${total}</div>
<div class="metrics">
    <div class="metric"><div class="metric-label">Free</div><div class="metric-value">${free}</div></div>
    <div class="metric"><div class="metric-label">Used</div><div class="metric-value">${used}</div></div>
    <div class="metric"><div class="metric-label">Unrealized PNL</div><div class="metric-value {pnl_class}">${pnl}</div></div>
</div>"#,
        total = view.total,
        free = view.free,
        used = view.used,
        pnl = view.pnl,
        pnl_class = view.pnl_class,
    );
    doc.replace_html(mount::BALANCE_PANEL, html)
}

const POSITION_COLUMNS: [&str; 8] = [
    "Symbol", "Side", "Size", "Entry", "Margin", "PNL", "PNL %", "Market",
];

/// Positions table; the selected symbol's row is highlighted
pub fn render_positions(
    doc: &mut dyn Document,
    rows: &[PositionRow],
    selected: Option<&str>,
) -> Result<()> {
    let mut html = String::from(r#"<table class="positions-table"><thead><tr>"#);
    for column in POSITION_COLUMNS {
        html.push_str(&format!("<th>{column}</th>"));
    }
    html.push_str("</tr></thead><tbody>");

    if rows.is_empty() {
        html.push_str(&format!(
            r#"<tr class="placeholder"><td colspan="{}" class="neutral">No open positions</td></tr>"#,
            POSITION_COLUMNS.len()
        ));
    }

    for row in rows {
        let symbol = escape_html(&row.symbol);
        let selected_class = if selected == Some(row.symbol.as_str()) { " selected" } else { "" };
        html.push_str(&format!(
            r#"<tr class="position-row{selected_class}" data-symbol="{symbol}"><td><strong>{symbol}</strong></td><td class="{side_class}">{side}</td><td>{size}</td><td>{entry}</td><td>{margin}</td><td class="{pnl_class}">{pnl}</td><td class="{pnl_class}">{pnl_percent}%</td><td><span class="market-status {market_class}">{market}</span></td></tr>"#,
            side_class = row.side.class(),
            side = row.side.label(),
            size = row.size,
            entry = row.entry_price,
            margin = row.margin,
            pnl_class = row.pnl_class,
            pnl = row.pnl,
            pnl_percent = row.pnl_percent,
            market_class = row.market_status.color_class(),
            market = row.market_status.label(),
        ));
    }

    html.push_str("</tbody></table>");
    doc.replace_html(mount::POSITION_INFO, html)
}

pub fn render_logs(doc: &mut dyn Document, rows: &[LogRow]) -> Result<()> {
    if rows.is_empty() {
        return doc.replace_html(
            mount::TERMINAL_CONTENT,
            r#"<div class="log-line log-plain placeholder">No logs yet</div>"#.to_string(),
        );
    }

    let html: String = rows
        .iter()
        .map(|row| {
            format!(
                r#"<div class="log-line {}"><span class="log-time">{}</span> {}</div>"#,
                row.style.css_class(),
                escape_html(&row.timestamp),
                escape_html(&row.message),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    doc.replace_html(mount::TERMINAL_CONTENT, html)
}

pub fn render_selected_symbol(doc: &mut dyn Document, label: &SymbolLabel) -> Result<()> {
    doc.replace_html(
        mount::SELECTED_SYMBOL,
        format!(r#"<span class="{}">{}</span>"#, label.class, escape_html(&label.text)),
    )
}

/// Chart markup comes from the chart widget, not from the backend
pub fn render_chart(doc: &mut dyn Document, markup: String) -> Result<()> {
    doc.replace_html(mount::CHART_CONTAINER, markup)
}

pub fn render_config(doc: &mut dyn Document, view: &ConfigView) -> Result<()> {
    let html = format!(
        r#"<div class="config-box">
    <div class="config-row"><span class="config-label">Coins</span><span>{coins}</span></div>
    <div class="config-row"><span class="config-label">Trade Rate</span><span>{rate}</span></div>
    <div class="config-row"><span class="config-label">Leverage</span><span>{leverage}</span></div>
</div>"#,
        coins = escape_html(&view.coins),
        rate = view.trade_rate,
        leverage = view.leverage,
    );
    doc.replace_html(mount::CONFIG_PANEL, html)
}

/// Show a transient message, or clear the slot with `None`
pub fn render_notification(
    doc: &mut dyn Document,
    notification: Option<(&str, NotificationKind)>,
) -> Result<()> {
    let html = match notification {
        Some((message, kind)) => format!(
            r#"<div class="notification {}">{}</div>"#,
            kind.css_class(),
            escape_html(message)
        ),
        None => String::new(),
    };
    doc.replace_html(mount::NOTIFICATION, html)
}

pub fn render_refresh_time(doc: &mut dyn Document, at: NaiveTime) -> Result<()> {
    doc.replace_html(
        mount::REFRESH_TIME,
        format!("Last update: {}", at.format("%H:%M:%S")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BalanceSnapshot, LogCategory, LogEntry, PositionMap};
    use crate::view_model::{to_balance_view, to_log_rows, to_position_rows};

    #[test]
    fn test_missing_mount() {
        let mut doc = HtmlDocument::with_mounts(&[mount::BOT_STATUS]);
        let err = doc.replace_html("nope", "x".to_string()).unwrap_err();
        assert!(matches!(err, DashboardError::MissingMount(ref m) if m == "nope"));
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut doc = HtmlDocument::new();
        let view = to_balance_view(&BalanceSnapshot::default());

        render_balance(&mut doc, &view).unwrap();
        let first = doc.get(mount::BALANCE_PANEL).unwrap().to_string();
        let revision = doc.revision();

        render_balance(&mut doc, &view).unwrap();
        assert_eq!(doc.get(mount::BALANCE_PANEL).unwrap(), first);
        assert_eq!(doc.revision(), revision);
    }

    #[test]
    fn test_empty_positions_placeholder() {
        let mut doc = HtmlDocument::new();
        render_positions(&mut doc, &to_position_rows(&PositionMap::new()), None).unwrap();
        let html = doc.get(mount::POSITION_INFO).unwrap();
        assert!(html.contains("No open positions"));
        assert!(html.contains(r#"colspan="8""#));
        assert!(!html.contains("position-row"));
    }

    #[test]
    fn test_positions_fully_replaced() {
        let mut doc = HtmlDocument::new();
        let mut map: PositionMap = serde_json::from_str(
            r#"{"XRPUSDT":{"position_amount":10},"ADAUSDT":{"position_amount":-3}}"#,
        )
        .unwrap();
        render_positions(&mut doc, &to_position_rows(&map), Some("ADAUSDT")).unwrap();
        let html = doc.get(mount::POSITION_INFO).unwrap();
        assert_eq!(html.matches("position-row").count(), 2);
        assert!(html.contains(r#"position-row selected" data-symbol="ADAUSDT""#));

        map.shift_remove("XRPUSDT");
        render_positions(&mut doc, &to_position_rows(&map), Some("ADAUSDT")).unwrap();
        let html = doc.get(mount::POSITION_INFO).unwrap();
        assert_eq!(html.matches("position-row").count(), 1);
        assert!(!html.contains("XRPUSDT"));
    }

    #[test]
    fn test_logs_escaped_and_placeholder() {
        let mut doc = HtmlDocument::new();
        render_logs(&mut doc, &[]).unwrap();
        assert!(doc.get(mount::TERMINAL_CONTENT).unwrap().contains("No logs yet"));

        let entries = vec![LogEntry {
            timestamp: "2024-05-01 10:00:00".to_string(),
            category: LogCategory::Trade,
            level: 20,
            message: "<script>alert(1)</script>".to_string(),
        }];
        render_logs(&mut doc, &to_log_rows(&entries)).unwrap();
        let html = doc.get(mount::TERMINAL_CONTENT).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("log-trade"));
        assert!(!html.contains("No logs yet"));
    }

    #[test]
    fn test_notification_set_and_clear() {
        let mut doc = HtmlDocument::new();
        render_notification(&mut doc, Some(("Bot started", NotificationKind::Success))).unwrap();
        assert!(doc.get(mount::NOTIFICATION).unwrap().contains("notify-success"));
        render_notification(&mut doc, None).unwrap();
        assert_eq!(doc.get(mount::NOTIFICATION).unwrap(), "");
    }
}
