//! Page stylesheet
//!
//! Dark theme on CSS variables. Every selector here is emitted by `render` or the page template.

pub const STYLES: &str = r"
* { box-sizing: border-box; margin: 0; padding: 0; }

:root {
    --bg: #0d1117;
    --card: #161b22;
    --border: #30363d;
    --text: #c9d1d9;
    --text-dim: #8b949e;
    --green: #3fb950;
    --green-strong: #238636;
    --red: #f85149;
    --red-strong: #da3633;
    --blue: #58a6ff;
    --yellow: #d29922;
    --purple: #a371f7;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    background: var(--bg);
    color: var(--text);
    padding: 20px;
    min-height: 100vh;
}

.container { max-width: 1200px; margin: 0 auto; }

/* Title bar */
header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 24px; padding-bottom: 16px; border-bottom: 1px solid var(--border); }
h1 { font-size: 24px; font-weight: 600; }
.header-controls { display: flex; align-items: center; gap: 12px; }
.refresh-time { font-size: 12px; color: var(--text-dim); }

/* Bot status */
.status-badge { padding: 6px 12px; border-radius: 20px; font-size: 12px; font-weight: 600; text-transform: uppercase; }

.status-active { background: rgba(63, 185, 80, 0.2); color: var(--green); }
.status-inactive { background: rgba(248, 81, 73, 0.2); color: var(--red); }

/* Notifications */
.notification {
    margin-bottom: 16px;
    padding: 10px 16px;
    border-radius: 8px;
    font-size: 13px;
}

.notify-success { background: rgba(63, 185, 80, 0.2); color: var(--green); }
.notify-error { background: rgba(248, 81, 73, 0.2); color: var(--red); }
.notify-info { background: rgba(88, 166, 255, 0.15); color: var(--blue); }

/* Layout */
.grid {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(300px, 1fr));
    gap: 16px;
}

.wide { grid-column: 1 / -1; }

/* Panels */
.card { background: var(--card); border: 1px solid var(--border); border-radius: 12px; padding: 20px; }
.card-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 16px; }
.card-title { font-size: 14px; color: var(--text-dim); text-transform: uppercase; letter-spacing: 0.5px; }

.card-value { font-size: 28px; font-weight: 700; }

/* Balance metrics */
.metrics { display: flex; flex-wrap: wrap; gap: 16px; margin-top: 12px; }
.metric { flex: 1; min-width: 100px; }
.metric-label { font-size: 11px; color: var(--text-dim); text-transform: uppercase; }
.metric-value { font-size: 18px; font-weight: 600; margin-top: 2px; }

/* PNL and selection colors */
.positive { color: var(--green); }
.negative { color: var(--red); }
.neutral { color: var(--text-dim); }
.selected { color: var(--blue); }

/* Trading config */
.config-box { background: rgba(88, 166, 255, 0.1); border-radius: 8px; padding: 12px; }
.config-row { display: flex; justify-content: space-between; padding: 4px 0; font-size: 13px; }
.config-label { color: var(--text-dim); }

/* Positions */
.positions-table { width: 100%; border-collapse: collapse; }

.positions-table th,
.positions-table td {
    text-align: left;
    padding: 10px 8px;
    border-bottom: 1px solid var(--border);
}

.positions-table th {
    color: var(--text-dim);
    font-weight: 500;
    font-size: 12px;
    text-transform: uppercase;
}

.positions-table tr:last-child td { border-bottom: none; }
.positions-table .placeholder td { text-align: center; }
.position-row.selected { background: rgba(88, 166, 255, 0.1); }

/* Market status pills */
.market-status { padding: 3px 8px; border-radius: 4px; font-size: 11px; }
.green-600 { background: rgba(35, 134, 54, 0.3); color: var(--green-strong); }
.green-400 { background: rgba(63, 185, 80, 0.2); color: var(--green); }
.yellow-500 { background: rgba(210, 153, 34, 0.2); color: var(--yellow); }
.red-400 { background: rgba(248, 81, 73, 0.2); color: var(--red); }
.red-600 { background: rgba(218, 54, 51, 0.3); color: var(--red-strong); }
.gray { background: rgba(139, 148, 158, 0.2); color: var(--text-dim); }

/* Chart */
.chart { min-height: 320px; }
.chart svg { width: 100%; height: 320px; }
.candle-up { fill: var(--green); stroke: var(--green); }
.candle-down { fill: var(--red); stroke: var(--red); }
.chart-empty { color: var(--text-dim); text-align: center; padding: 140px 0; }

/* Terminal */
.terminal {
    background: #010409;
    border-radius: 8px;
    padding: 12px;
    max-height: 360px;
    overflow-y: auto;
    font-family: 'SFMono-Regular', Consolas, monospace;
    font-size: 12px;
}

.log-line { padding: 2px 0; white-space: pre-wrap; }
.log-time { color: var(--text-dim); }
.log-error { color: var(--red); }
.log-warning { color: var(--yellow); }
.log-trade { color: var(--green); }
.log-balance { color: var(--blue); }
.log-system { color: var(--purple); }
.log-plain { color: var(--text); }

/* Responsive */
@media (max-width: 600px) {
    .grid { grid-template-columns: 1fr; }
    header { flex-direction: column; gap: 12px; }
}
";
