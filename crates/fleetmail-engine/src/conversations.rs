use fleetmail_protocol::model::{AccountId, RecipientId};
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationRecord {
    pub first_contact_at: Instant,
    pub last_contact_at: Instant,
    pub message_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactInfo {
    pub is_first: bool,
    pub response_time: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct ConversationTracker {
    records: Mutex<HashMap<(AccountId, RecipientId), ConversationRecord>>,
}

impl ConversationTracker {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    pub async fn track(&self, account_id: &str, recipient_id: &str) -> ContactInfo {
        self.track_at(account_id, recipient_id, Instant::now()).await
    }

    pub async fn track_at(&self, account_id: &str, recipient_id: &str, now: Instant) -> ContactInfo {
        let mut records = self.records.lock().await;
        let key = (account_id.to_string(), recipient_id.to_string());

        match records.get_mut(&key) {
            Some(record) => {
                let response_time = now.saturating_duration_since(record.last_contact_at);
                record.last_contact_at = now;
                record.message_count = record.message_count.saturating_add(1);
                ContactInfo {
                    is_first: false,
                    response_time: Some(response_time),
                }
            }
            None => {
                records.insert(
                    key,
                    ConversationRecord {
                        first_contact_at: now,
                        last_contact_at: now,
                        message_count: 1,
                    },
                );
                ContactInfo {
                    is_first: true,
                    response_time: None,
                }
            }
        }
    }

    pub async fn record(&self, account_id: &str, recipient_id: &str) -> Option<ConversationRecord> {
        self.records
            .lock()
            .await
            .get(&(account_id.to_string(), recipient_id.to_string()))
            .copied()
    }

    pub async fn conversation_count(&self) -> usize {
        self.records.lock().await.len()
    }
}
