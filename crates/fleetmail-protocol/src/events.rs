use crate::model::{AccountId, Category, Mode, RecipientId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod names {
    pub const SEND_SUCCEEDED: &str = "send.succeeded";
    pub const SEND_FAILED: &str = "send.failed";
    pub const FLEET_HEARTBEAT: &str = "fleet.heartbeat";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope<T> {
    #[serde(rename = "t")]
    pub event_type: String,
    #[serde(rename = "id")]
    pub event_id: Uuid,
    #[serde(rename = "ts")]
    pub ts_unix: u64,
    #[serde(rename = "d")]
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(event_type: impl Into<String>, ts_unix: u64, data: T) -> Self {
        Self {
            event_type: event_type.into(),
            event_id: Uuid::new_v4(),
            ts_unix,
            data,
        }
    }
}

/// One delivery attempt that reached the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendAttemptEvent {
    pub account_id: AccountId,
    pub recipient_id: RecipientId,
    pub mode: Mode,
    pub target: String,
    pub campaign_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub first_contact: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeartbeatEvent {
    pub accounts: usize,
    pub mail_running: usize,
    pub chat_running: usize,
    pub sent: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryEvent {
    SendSucceeded(SendAttemptEvent),
    SendFailed(SendAttemptEvent),
    Heartbeat(HeartbeatEvent),
}

impl TelemetryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TelemetryEvent::SendSucceeded(_) => names::SEND_SUCCEEDED,
            TelemetryEvent::SendFailed(_) => names::SEND_FAILED,
            TelemetryEvent::Heartbeat(_) => names::FLEET_HEARTBEAT,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    pub exists: bool,
    pub paused: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub is_paid: bool,
    #[serde(default)]
    pub can_trial: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipientsQuery {
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendabilityResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendRequest {
    pub mode: Mode,
    pub token: String,
    pub recipient_id: RecipientId,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendResponse {
    pub ok: bool,
    #[serde(default)]
    pub reason: Option<String>,
}
