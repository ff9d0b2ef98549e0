use clap::Parser;
use fleetmail_engine::{
    config::{EngineArgs, FleetFile},
    context::EngineContext,
    control_plane::{ControlPlaneApi, HttpControlPlaneClient, StandingTrialAnswer},
    fleet::Fleet,
    platform::HttpPlatformClient,
    poller,
    scheduler::StopReason,
    telemetry::{self, HttpTelemetrySink, NoopTelemetry, TelemetrySink},
};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = EngineArgs::parse();
    init_tracing(&args.log_filter);

    let fleet_file = FleetFile::load(&args.fleet_file)?;
    let limits = args.limits();

    let control_plane: Arc<dyn ControlPlaneApi> =
        Arc::new(HttpControlPlaneClient::new(&args.control_url)?);
    let telemetry_sink: Arc<dyn TelemetrySink> = match &args.telemetry_url {
        Some(url) => Arc::new(HttpTelemetrySink::new(url)?),
        None => Arc::new(NoopTelemetry),
    };
    let ctx = Arc::new(EngineContext::new(
        limits.clone(),
        Arc::new(HttpPlatformClient::new(&args.platform_url)?),
        Arc::clone(&control_plane),
        telemetry_sink,
        Arc::new(StandingTrialAnswer::new(args.accept_trials)),
    ));
    let fleet = Arc::new(Fleet::new(ctx));

    // Autostart must see the real gates, not the permissive default snapshot.
    if let Err(err) = poller::poll_once(&fleet, control_plane.as_ref()).await {
        warn!(err = %err, "control.initial_poll_failed");
    }

    let shutdown = CancellationToken::new();
    let poller_task = tokio::spawn(poller::run_control_poller(
        Arc::clone(&fleet),
        control_plane,
        limits.control_poll_interval(),
        shutdown.clone(),
    ));
    let heartbeat_task = tokio::spawn(telemetry::run_heartbeat(
        Arc::clone(&fleet),
        limits.heartbeat_interval(),
        shutdown.clone(),
    ));

    let logins = join_all(fleet_file.accounts.iter().map(|entry| {
        let fleet = Arc::clone(&fleet);
        async move {
            let result = fleet.login(entry.account(), entry.settings.clone()).await;
            (entry, result)
        }
    }))
    .await;

    for (entry, result) in logins {
        // Login and start failures are logged where they happen.
        let Ok(scheduler) = result else {
            continue;
        };
        for (mode, template) in &entry.autostart {
            let _ = scheduler.start(*mode, template).await;
        }
    }

    info!(
        accounts = fleet.account_ids().await.len(),
        configured = fleet_file.accounts.len(),
        "fleet.ready"
    );

    tokio::signal::ctrl_c().await?;

    shutdown.cancel();
    let stopped = fleet.stop_all(StopReason::Shutdown).await;
    let _ = poller_task.await;
    let _ = heartbeat_task.await;
    info!(stopped, "fleet.shutdown");

    Ok(())
}

fn init_tracing(log_filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_filter.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
