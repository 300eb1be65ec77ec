//! Dashboard HTML template
//!
//! Contains the main page structure including:
//! - Header with bot status and last refresh time
//! - Balance and trading config cards
//! - Positions table with market status
//! - Candle chart for the selected coin
//! - Log terminal
//!
//! Each `<!--mount:ID-->` marker is replaced with that mount's current content.

pub const TEMPLATE: &str = r#"
    <div class="container">
        <header>
            <div>
                <h1>📟 Trading Bot Dashboard</h1>
                <span class="refresh-time" id="refresh_time"><!--mount:refresh_time--></span>
            </div>
            <div class="header-controls">
                <span id="bot_status"><!--mount:bot_status--></span>
            </div>
        </header>

        <div id="notification"><!--mount:notification--></div>

        <div class="grid">
            <!-- Balance Card -->
            <div class="card">
                <div class="card-header">
                    <span class="card-title">💰 Wallet Balance</span>
                </div>
                <div id="balance_panel"><!--mount:balance_panel--></div>
            </div>

            <!-- Config Card -->
            <div class="card">
                <div class="card-header">
                    <span class="card-title">⚙️ Trading Config</span>
                </div>
                <div id="config_panel"><!--mount:config_panel--></div>
            </div>

            <!-- Open Positions -->
            <div class="card wide">
                <div class="card-header">
                    <span class="card-title">📈 Open Positions</span>
                </div>
                <div id="position_info"><!--mount:position_info--></div>
            </div>

            <!-- Chart -->
            <div class="card wide">
                <div class="card-header">
                    <span class="card-title">🕯️ Chart</span>
                    <span id="selected_symbol"><!--mount:selected_symbol--></span>
                </div>
                <div class="chart" id="chart_container"><!--mount:chart_container--></div>
            </div>

            <!-- Logs -->
            <div class="card wide">
                <div class="card-header">
                    <span class="card-title">🖥️ Bot Logs</span>
                </div>
                <div class="terminal" id="terminal_content"><!--mount:terminal_content--></div>
            </div>
        </div>
    </div>
"#;
