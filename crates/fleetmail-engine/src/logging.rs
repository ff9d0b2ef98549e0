use crate::{
    account::Account,
    control_plane::ControlPlaneError,
    platform::PlatformError,
    scheduler::{StartError, StopReason, TickOutcome},
};
use fleetmail_protocol::model::{Category, Mode};
use tracing::{debug, info, warn};

pub fn log_started(account_id: &str, mode: Mode, target: &str) {
    info!(account_id, %mode, target, "scheduler.started");
}

pub fn log_start_rejected(account_id: &str, mode: Mode, err: &StartError) {
    warn!(account_id, %mode, reason = %err, "scheduler.start_rejected");
}

pub fn log_stopped(account_id: &str, mode: Mode, reason: StopReason) {
    info!(
        account_id,
        %mode,
        reason = reason.as_str(),
        "scheduler.stopped"
    );
}

pub fn log_trial_activated(account_id: &str) {
    info!(account_id, "scheduler.trial_activated");
}

pub fn log_campaign_reset(account_id: &str, mode: Mode) {
    info!(account_id, %mode, "scheduler.campaign_reset");
}

pub fn log_category_rotated(account_id: &str, mode: Mode, from: Category, to: Category) {
    info!(
        account_id,
        %mode,
        from = from.as_str(),
        to = to.as_str(),
        "scheduler.category_rotated"
    );
}

pub fn log_invite_advanced(account_id: &str, index: usize) {
    info!(account_id, index, "scheduler.invite_advanced");
}

pub fn log_token_refreshed(account_id: &str) {
    info!(account_id, "platform.token_refreshed");
}

pub fn log_token_refresh_failed(account_id: &str, err: &PlatformError) {
    warn!(account_id, err = %err, "platform.token_refresh_failed");
}

/// Transport failures stay at debug so normal network flakiness does not read as an error.
pub fn log_tick(account_id: &str, mode: Mode, outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Sent {
            recipient_id,
            first_contact,
        } => info!(
            account_id,
            %mode,
            recipient_id = recipient_id.as_str(),
            first_contact,
            "scheduler.tick_sent"
        ),
        TickOutcome::Rejected {
            recipient_id,
            reason,
            retry_count,
        } => info!(
            account_id,
            %mode,
            recipient_id = recipient_id.as_str(),
            reason = reason.as_str(),
            retry_count,
            "scheduler.tick_rejected"
        ),
        TickOutcome::RetryExhausted {
            recipient_id,
            reason,
            retry_count,
        } => warn!(
            account_id,
            %mode,
            recipient_id = recipient_id.as_str(),
            reason = reason.as_str(),
            retry_count,
            "scheduler.retry_exhausted"
        ),
        TickOutcome::TransportFailed { reason } => debug!(
            account_id,
            %mode,
            reason = reason.as_str(),
            "scheduler.tick_transport_failed"
        ),
        TickOutcome::Unauthorized => info!(account_id, %mode, "scheduler.tick_unauthorized"),
        TickOutcome::Waiting(wait) => debug!(
            account_id,
            %mode,
            wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            "scheduler.tick_waiting"
        ),
        TickOutcome::Idle => debug!(account_id, %mode, "scheduler.tick_idle"),
        TickOutcome::ListExhausted | TickOutcome::InvitesComplete => {
            info!(account_id, %mode, "scheduler.campaign_complete")
        }
    }
}

/// Only identifiers are logged; credentials never reach the subscriber.
pub fn log_account_registered(account: &Account) {
    info!(
        account_id = account.id.as_str(),
        display_id = account.display_id.as_str(),
        login = account.credentials.login.as_str(),
        "fleet.account_registered"
    );
}

pub fn log_account_removed(account_id: &str, stopped: usize) {
    info!(account_id, stopped, "fleet.account_removed");
}

pub fn log_login_failed(account_id: &str, err: &PlatformError) {
    warn!(account_id, err = %err, "fleet.login_failed");
}

pub fn log_broadcast_stop(reason: StopReason, stopped: usize) {
    warn!(reason = reason.as_str(), stopped, "control.broadcast_stop");
}

pub fn log_account_stop(account_id: &str, stopped: usize) {
    warn!(account_id, stopped, "control.account_stop");
}

pub fn log_poll_failed(err: &ControlPlaneError) {
    warn!(err = %err, "control.poll_failed");
}
