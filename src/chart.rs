//! Chart adapter - owns the candle widget and the selected symbol's generation
//!
//! Candle requests carry a [`CandleTicket`]; results are applied only while the
//! ticket's generation is current, so a slow response for an old symbol can never
//! overwrite the chart of a newer one.

use tracing::debug;

use crate::error::Result;
use crate::types::Candle;

/// Drawing surface for one candle series
pub trait ChartWidget {
    /// Replace the whole series
    fn set_data(&mut self, candles: &[Candle]);
    /// Fit the visible range to the current series
    fn fit_content(&mut self);
    /// Release the widget; further calls are no-ops
    fn remove(&mut self);
    /// Current rendering, to be placed in the chart mount
    fn markup(&self) -> String;
}

/// Factory for widgets bound to a container
pub trait ChartBackend {
    type Widget: ChartWidget;

    fn create_chart(&mut self, container: &str) -> Result<Self::Widget>;
}

/// Identifies one candle request: which symbol, issued under which generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleTicket {
    pub symbol: String,
    pub generation: u64,
}

pub struct ChartAdapter<B: ChartBackend> {
    backend: B,
    widget: Option<B::Widget>,
    symbol: Option<String>,
    generation: u64,
    shown: Option<String>,
}

impl<B: ChartBackend> ChartAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            widget: None,
            symbol: None,
            generation: 0,
            shown: None,
        }
    }

    /// Create the widget in `container`, tearing down any previous one first
    pub fn mount(&mut self, container: &str) -> Result<()> {
        self.destroy();
        self.widget = Some(self.backend.create_chart(container)?);
        Ok(())
    }

    pub fn is_mounted(&self) -> bool {
        self.widget.is_some()
    }

    /// Switch symbol; any result issued before this call becomes stale
    pub fn set_symbol(&mut self, symbol: &str) -> CandleTicket {
        self.generation += 1;
        self.symbol = Some(symbol.to_string());
        CandleTicket {
            symbol: symbol.to_string(),
            generation: self.generation,
        }
    }

    /// Drop the symbol and blank the widget
    pub fn clear_symbol(&mut self) {
        self.generation += 1;
        self.symbol = None;
        self.shown = None;
        if let Some(widget) = self.widget.as_mut() {
            widget.set_data(&[]);
        }
    }

    /// Ticket for a periodic refresh of the current symbol
    pub fn refresh_ticket(&self) -> Option<CandleTicket> {
        self.symbol.as_ref().map(|symbol| CandleTicket {
            symbol: symbol.clone(),
            generation: self.generation,
        })
    }

    pub fn is_current(&self, ticket: &CandleTicket) -> bool {
        ticket.generation == self.generation
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// Symbol whose series the widget currently holds
    pub fn shown_symbol(&self) -> Option<&str> {
        self.shown.as_deref()
    }

    /// Replace the series if the ticket is still current; returns whether it was applied
    pub fn apply(&mut self, ticket: &CandleTicket, series: &[Candle]) -> bool {
        if !self.is_current(ticket) {
            debug!(
                symbol = %ticket.symbol,
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale candle result"
            );
            return false;
        }
        let Some(widget) = self.widget.as_mut() else {
            debug!(symbol = %ticket.symbol, "Chart not mounted, dropping candles");
            return false;
        };
        widget.set_data(series);
        widget.fit_content();
        self.shown = Some(ticket.symbol.clone());
        true
    }

    pub fn markup(&self) -> Option<String> {
        self.widget.as_ref().map(ChartWidget::markup)
    }

    /// Tear down the widget; safe to call repeatedly
    pub fn destroy(&mut self) {
        if let Some(mut widget) = self.widget.take() {
            widget.remove();
        }
        self.shown = None;
    }
}

// ============================================================================
// SVG candlestick widget
// ============================================================================

const SVG_WIDTH: f64 = 800.0;
const SVG_HEIGHT: f64 = 320.0;
const PADDING_RATIO: f64 = 0.05;

/// Built-in backend drawing candlesticks as inline SVG
#[derive(Debug, Default)]
pub struct SvgChartBackend;

impl ChartBackend for SvgChartBackend {
    type Widget = SvgChartWidget;

    fn create_chart(&mut self, container: &str) -> Result<SvgChartWidget> {
        Ok(SvgChartWidget {
            container: container.to_string(),
            candles: Vec::new(),
            range: None,
            removed: false,
        })
    }
}

#[derive(Debug)]
pub struct SvgChartWidget {
    container: String,
    candles: Vec<Candle>,
    range: Option<(f64, f64)>,
    removed: bool,
}

impl SvgChartWidget {
    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Visible price range (low, high) after the last fit
    pub fn range(&self) -> Option<(f64, f64)> {
        self.range
    }

    fn price_range(&self) -> Option<(f64, f64)> {
        let low = self.candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let high = self.candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        if !low.is_finite() || !high.is_finite() {
            return None;
        }
        let pad = ((high - low) * PADDING_RATIO).max(high.abs() * 1e-6).max(1e-9);
        Some((low - pad, high + pad))
    }
}

impl ChartWidget for SvgChartWidget {
    fn set_data(&mut self, candles: &[Candle]) {
        if self.removed {
            return;
        }
        self.candles = candles.to_vec();
    }

    fn fit_content(&mut self) {
        if self.removed {
            return;
        }
        self.range = self.price_range();
    }

    fn remove(&mut self) {
        self.removed = true;
        self.candles.clear();
        self.range = None;
    }

    fn markup(&self) -> String {
        let Some((low, high)) = self.range.or_else(|| self.price_range()) else {
            return r#"<div class="chart-empty">No chart data</div>"#.to_string();
        };
        if self.candles.is_empty() {
            return r#"<div class="chart-empty">No chart data</div>"#.to_string();
        }

        let y = |price: f64| SVG_HEIGHT - (price - low) / (high - low) * SVG_HEIGHT;
        let step = SVG_WIDTH / self.candles.len() as f64;
        let body_width = (step * 0.7).max(1.0);

        let mut svg = format!(
            r#"<svg viewBox="0 0 {SVG_WIDTH} {SVG_HEIGHT}" preserveAspectRatio="none" data-candles="{}">"#,
            self.candles.len()
        );
        for (i, candle) in self.candles.iter().enumerate() {
            let class = if candle.close >= candle.open { "candle-up" } else { "candle-down" };
            let center = step * (i as f64 + 0.5);
            let top = y(candle.open.max(candle.close));
            let bottom = y(candle.open.min(candle.close));
            svg.push_str(&format!(
                r#"<g class="{class}"><line x1="{center:.2}" x2="{center:.2}" y1="{:.2}" y2="{:.2}"/><rect x="{:.2}" y="{top:.2}" width="{body_width:.2}" height="{:.2}"/></g>"#,
                y(candle.high),
                y(candle.low),
                center - body_width / 2.0,
                (bottom - top).max(1.0),
            ));
        }
        svg.push_str("</svg>");
        svg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles(base: f64) -> Vec<Candle> {
        (0..3)
            .map(|i| Candle {
                time: 60 * i,
                open: base,
                high: base + 2.0,
                low: base - 1.0,
                close: base + 1.0,
                volume: None,
            })
            .collect()
    }

    fn mounted() -> ChartAdapter<SvgChartBackend> {
        let mut adapter = ChartAdapter::new(SvgChartBackend);
        adapter.mount("chart_container").unwrap();
        adapter
    }

    #[test]
    fn test_switch_a_then_b_shows_only_b() {
        let mut adapter = mounted();
        let ticket_a = adapter.set_symbol("AAA");
        let ticket_b = adapter.set_symbol("BBB");

        // B resolves first, then A's slow response arrives
        assert!(adapter.apply(&ticket_b, &candles(100.0)));
        assert!(!adapter.apply(&ticket_a, &candles(1.0)));

        assert_eq!(adapter.shown_symbol(), Some("BBB"));
        let (low, _) = adapter.widget.as_ref().unwrap().range().unwrap();
        assert!(low > 90.0);
    }

    #[test]
    fn test_refresh_ticket_tracks_generation() {
        let mut adapter = mounted();
        assert!(adapter.refresh_ticket().is_none());

        let ticket = adapter.set_symbol("XRPUSDT");
        assert_eq!(adapter.refresh_ticket(), Some(ticket.clone()));

        adapter.clear_symbol();
        assert!(adapter.refresh_ticket().is_none());
        assert!(!adapter.apply(&ticket, &candles(1.0)));
    }

    #[test]
    fn test_destroy_is_idempotent_and_remount_replaces() {
        let mut adapter = mounted();
        let ticket = adapter.set_symbol("ADAUSDT");
        assert!(adapter.apply(&ticket, &candles(0.5)));

        adapter.destroy();
        adapter.destroy();
        assert!(!adapter.is_mounted());
        assert!(adapter.markup().is_none());
        assert!(!adapter.apply(&ticket, &candles(0.5)));

        adapter.mount("chart_container").unwrap();
        adapter.mount("chart_container").unwrap();
        assert!(adapter.is_mounted());
        assert!(adapter.markup().unwrap().contains("No chart data"));
    }

    #[test]
    fn test_svg_markup() {
        let mut widget = SvgChartBackend.create_chart("chart_container").unwrap();
        assert!(widget.markup().contains("chart-empty"));

        let mut series = candles(10.0);
        series[1].close = 9.0;
        widget.set_data(&series);
        widget.fit_content();
        let svg = widget.markup();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<rect").count(), 3);
        assert_eq!(svg.matches("candle-down").count(), 1);
        assert_eq!(widget.container(), "chart_container");
    }
}
