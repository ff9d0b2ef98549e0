use crate::{
    control_plane::{ControlPlaneApi, ControlPlaneError},
    fleet::Fleet,
    logging,
    scheduler::StopReason,
};
use fleetmail_protocol::model::{AccountId, ControlStatus};
use std::{sync::Arc, time::Duration};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Stops implied by moving from one control snapshot to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlActions {
    pub broadcast: Option<StopReason>,
    pub accounts: Vec<AccountId>,
}

impl ControlActions {
    pub fn is_empty(&self) -> bool {
        self.broadcast.is_none() && self.accounts.is_empty()
    }
}

/// Only restrictive edges produce actions; nothing restarts on a permissive edge.
pub fn control_transitions(prev: &ControlStatus, next: &ControlStatus) -> ControlActions {
    let broadcast = if !prev.panic_mode && next.panic_mode {
        Some(StopReason::PanicMode)
    } else if !prev.stop_spam && next.stop_spam {
        Some(StopReason::SoftStop)
    } else if prev.bot_enabled && !next.bot_enabled {
        Some(StopReason::BotDisabled)
    } else {
        None
    };

    let accounts = next
        .per_account
        .iter()
        .filter(|(id, enabled)| !**enabled && prev.mailing_enabled(id))
        .map(|(id, _)| id.clone())
        .collect();

    ControlActions {
        broadcast,
        accounts,
    }
}

/// Publishes `next` as the current snapshot and carries out the stops it implies.
pub async fn apply_control_status(fleet: &Fleet, next: ControlStatus) -> ControlActions {
    let ctx = fleet.context();
    let actions = control_transitions(&ctx.control_snapshot(), &next);
    ctx.replace_control_status(next);

    if let Some(reason) = actions.broadcast {
        let stopped = fleet.stop_all(reason).await;
        logging::log_broadcast_stop(reason, stopped);
    }
    for account_id in &actions.accounts {
        let stopped = fleet
            .stop_account(account_id, StopReason::MailingDisabled)
            .await;
        logging::log_account_stop(account_id, stopped);
    }

    actions
}

pub async fn poll_once(
    fleet: &Fleet,
    client: &dyn ControlPlaneApi,
) -> Result<ControlActions, ControlPlaneError> {
    let status = client.get_status().await?;
    Ok(apply_control_status(fleet, status).await)
}

/// Polls until `shutdown` fires. A failed poll keeps the previous snapshot in effect.
pub async fn run_control_poller(
    fleet: Arc<Fleet>,
    client: Arc<dyn ControlPlaneApi>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut tick = time::interval(interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tick.tick() => {
                match poll_once(&fleet, client.as_ref()).await {
                    Ok(actions) if actions.is_empty() => debug!("control.poll_ok"),
                    Ok(actions) => debug!(
                        broadcast = actions.broadcast.map(StopReason::as_str).unwrap_or("-"),
                        accounts = actions.accounts.len(),
                        "control.poll_applied"
                    ),
                    Err(err) => logging::log_poll_failed(&err),
                }
            }
        }
    }
}
