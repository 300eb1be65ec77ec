//! Runtime driver - the single-threaded event loop
//!
//! One `select!` loop waits on whichever comes first: a completed request, a UI
//! event, the next timer deadline or shutdown. All in-flight requests live in one
//! `FuturesUnordered`, so the controller is only ever touched from this loop.

use std::future::Future;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::chart::ChartBackend;
use crate::client::BotClient;
use crate::controller::{Dashboard, Outcome, Request, UiEvent};
use crate::error::Result;
use crate::render::HtmlDocument;

/// Run one request against the backend
pub async fn perform(client: BotClient, request: Request) -> Outcome {
    match request {
        Request::Status => Outcome::Status(client.get_status().await),
        Request::Data => Outcome::Data(client.get_balance_and_positions().await),
        Request::Logs => Outcome::Logs(client.get_logs().await),
        Request::Candles { ticket, periodic } => {
            let result = client.get_candles(&ticket.symbol, client.candle_interval()).await;
            Outcome::Candles { ticket, periodic, result }
        }
        Request::Config => Outcome::Config(client.get_config().await),
        Request::Command(command) => Outcome::Command {
            command,
            result: client.send_command(command).await,
        },
        Request::SetConfig(patch) => Outcome::ConfigUpdated(client.set_config(&patch).await),
    }
}

/// Drive the dashboard until `shutdown` resolves
///
/// `on_change` is called with the document whenever its revision moves. Closing the
/// event channel only stops event handling; polling continues until shutdown.
pub async fn run<B, S, F>(
    dashboard: &mut Dashboard<B>,
    client: BotClient,
    mut events: mpsc::Receiver<UiEvent>,
    shutdown: S,
    mut on_change: F,
) where
    B: ChartBackend,
    S: Future<Output = ()>,
    F: FnMut(&HtmlDocument) -> Result<()>,
{
    let mut in_flight = FuturesUnordered::new();
    let mut published = None;
    let mut events_open = true;

    for request in dashboard.start(Instant::now()) {
        debug!(?request, "Dispatching");
        in_flight.push(perform(client.clone(), request));
    }

    tokio::pin!(shutdown);

    loop {
        let revision = dashboard.document().revision();
        if published != Some(revision) {
            if let Err(e) = on_change(dashboard.document()) {
                warn!("Publishing dashboard failed: {e}");
            }
            published = Some(revision);
        }

        let deadline = dashboard.next_deadline();
        let timer = async {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        let follow_up = tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            Some(outcome) = in_flight.next(), if !in_flight.is_empty() => {
                dashboard.apply(outcome, Instant::now())
            }
            event = events.recv(), if events_open => match event {
                Some(event) => {
                    debug!(?event, "UI event");
                    dashboard.handle_event(event, Instant::now())
                }
                None => {
                    debug!("UI event channel closed");
                    events_open = false;
                    Vec::new()
                }
            },
            () = timer => {
                dashboard.expire_notification(Instant::now());
                Vec::new()
            }
        };

        let now = Instant::now();
        for request in follow_up.into_iter().chain(dashboard.poll_due(now)) {
            debug!(?request, "Dispatching");
            in_flight.push(perform(client.clone(), request));
        }
    }

    if !in_flight.is_empty() {
        debug!(pending = in_flight.len(), "Dropping in-flight requests");
    }
    drop(in_flight);
    dashboard.stop();
    if let Err(e) = on_change(dashboard.document()) {
        warn!("Publishing dashboard failed: {e}");
    }
}
