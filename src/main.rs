//! bot-dashboard entry point
//!
//! Polls the bot backend, writes the composed page to `--out` whenever it changes,
//! and reads console commands from stdin (`start`, `stop`, `select XRPUSDT`, ...).

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bot_dashboard::{BotClient, Config, Dashboard, SvgChartBackend, UiEvent, dashboard_html, runtime};

#[derive(Debug, Parser)]
#[command(name = "bot-dashboard", version, about = "Polling dashboard for a trading bot backend")]
struct Args {
    /// Bot backend base URL (overrides DASHBOARD_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Output HTML file (overrides DASHBOARD_OUTPUT)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    /// Start with the chart hidden (no candle polling)
    #[arg(long)]
    hide_chart: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }
    if let Some(out) = args.out {
        config.output_path = out;
    }
    if args.debug {
        config.log_level = "debug".to_string();
    }
    if args.hide_chart {
        config.chart_visible = false;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    config.validate().context("invalid configuration")?;
    info!(
        api_url = %config.api_url,
        environment = %config.environment,
        output = %config.output_path.display(),
        "Starting bot dashboard"
    );

    let client = BotClient::from_config(&config).context("failed to build HTTP client")?;
    let mut dashboard = Dashboard::new(&config, SvgChartBackend);

    let (tx, rx) = mpsc::channel(32);
    spawn_console(tx);

    let output = config.output_path.clone();
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-C handler failed: {e}");
            std::future::pending::<()>().await;
        }
    };

    runtime::run(&mut dashboard, client, rx, shutdown, |doc| {
        std::fs::write(&output, dashboard_html(doc))?;
        Ok(())
    })
    .await;

    info!("Dashboard stopped");
    Ok(())
}

/// Forward stdin lines as UI events until EOF
///
/// Runs on its own thread: a blocked stdin read must not hold up runtime shutdown.
fn spawn_console(tx: mpsc::Sender<UiEvent>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("stdin read failed: {e}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<UiEvent>() {
                Ok(event) => {
                    if tx.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{e}"),
            }
        }
        info!("Console closed, still polling until Ctrl-C");
    });
}
