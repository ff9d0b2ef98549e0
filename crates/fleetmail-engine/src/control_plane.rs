mod http;

pub use http::HttpControlPlaneClient;

use crate::account::Account;
use async_trait::async_trait;
use fleetmail_protocol::{
    events::{AccountStatus, PaymentStatus},
    model::ControlStatus,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlPlaneError {
    #[error("control plane unreachable: {0}")]
    Transport(String),
    #[error("control plane answered with status {0}")]
    Status(u16),
    #[error("control plane response malformed: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ControlPlaneApi: Send + Sync {
    async fn get_status(&self) -> Result<ControlStatus, ControlPlaneError>;

    async fn check_account_allowed(&self, account_id: &str)
        -> Result<AccountStatus, ControlPlaneError>;

    async fn check_payment(&self, account_id: &str) -> Result<PaymentStatus, ControlPlaneError>;

    async fn activate_trial(&self, account_id: &str) -> Result<PaymentStatus, ControlPlaneError>;
}

/// Operator decision point consulted when an unpaid account could start a trial.
#[async_trait]
pub trait OperatorPrompt: Send + Sync {
    async fn confirm_trial(&self, account: &Account) -> bool;
}

/// Answers every trial prompt the same way; used by the headless binary.
#[derive(Debug, Clone, Copy)]
pub struct StandingTrialAnswer {
    accept: bool,
}

impl StandingTrialAnswer {
    pub fn new(accept: bool) -> Self {
        Self { accept }
    }
}

#[async_trait]
impl OperatorPrompt for StandingTrialAnswer {
    async fn confirm_trial(&self, _account: &Account) -> bool {
        self.accept
    }
}
