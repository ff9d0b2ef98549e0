mod http;

pub use http::HttpPlatformClient;

use crate::account::Credentials;
use async_trait::async_trait;
use fleetmail_protocol::{
    events::SendRequest,
    model::{AccountId, Category, InboundMessage, Mode, Recipient},
};
use thiserror::Error;

/// Failures reported by the platform collaborator.
///
/// `Rejected` means the platform answered and refused; `Transport` means no
/// usable answer came back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("platform rejected request: {0}")]
    Rejected(String),
    #[error("platform unreachable: {0}")]
    Transport(String),
    #[error("platform session expired")]
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account_id: AccountId,
    pub token: String,
}

#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<String, PlatformError>;

    async fn list_recipients(
        &self,
        session: &Session,
        mode: Mode,
        category: Category,
    ) -> Result<Vec<Recipient>, PlatformError>;

    async fn check_sendable(
        &self,
        session: &Session,
        mode: Mode,
        recipient_id: &str,
    ) -> Result<Option<String>, PlatformError>;

    async fn send(&self, session: &Session, request: SendRequest) -> Result<(), PlatformError>;

    async fn list_inbox(&self, session: &Session) -> Result<Vec<InboundMessage>, PlatformError>;
}
