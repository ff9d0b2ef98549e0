mod http;

pub use http::HttpTelemetrySink;

use crate::fleet::Fleet;
use fleetmail_protocol::events::TelemetryEvent;
use std::{sync::Arc, time::Duration};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fire-and-forget sink for send and heartbeat events.
///
/// Implementations must return immediately; delivery failures stay inside the sink.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: TelemetryEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn emit(&self, event: TelemetryEvent) {
        debug!(event = event.name(), "telemetry.dropped");
    }
}

pub async fn run_heartbeat(fleet: Arc<Fleet>, interval: Duration, shutdown: CancellationToken) {
    let mut tick = time::interval(interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tick.tick() => {
                let heartbeat = fleet.heartbeat().await;
                debug!(
                    accounts = heartbeat.accounts,
                    mail_running = heartbeat.mail_running,
                    chat_running = heartbeat.chat_running,
                    "telemetry.heartbeat"
                );
                fleet
                    .context()
                    .telemetry
                    .emit(TelemetryEvent::Heartbeat(heartbeat));
            }
        }
    }
}
