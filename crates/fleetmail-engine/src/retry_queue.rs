use fleetmail_protocol::{
    config::EngineLimits,
    model::{Recipient, RecipientId},
};
use rand::{seq::SliceRandom, Rng};
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryItem {
    pub recipient: Recipient,
    pub retry_count: u32,
    pub failed_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DequeueOutcome {
    Ready(RetryItem),
    /// Items exist but all are still cooling down; carries the shortest remaining wait.
    Wait(Duration),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryFailure {
    Queued { retry_count: u32 },
    Exhausted { retry_count: u32 },
}

/// Recipients whose delivery was rejected, waiting for another attempt.
///
/// A dequeued item stays in the queue until it either succeeds (`remove`) or
/// fails often enough to be evicted by `record_failure_at`.
#[derive(Debug)]
pub struct RetryQueue {
    items: HashMap<RecipientId, RetryItem>,
    cooldown: Duration,
    max_retries: u32,
}

impl RetryQueue {
    pub fn new(cooldown: Duration, max_retries: u32) -> Self {
        Self {
            items: HashMap::new(),
            cooldown,
            max_retries,
        }
    }

    pub fn from_limits(limits: &EngineLimits) -> Self {
        Self::new(limits.retry_cooldown(), limits.max_retries)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, recipient_id: &str) -> Option<&RetryItem> {
        self.items.get(recipient_id)
    }

    pub fn enqueue(&mut self, recipient: Recipient) -> RetryFailure {
        self.record_failure_at(recipient, Instant::now())
    }

    pub fn record_failure_at(&mut self, recipient: Recipient, now: Instant) -> RetryFailure {
        let recipient_id = recipient.id.clone();
        let retry_count = match self.items.get_mut(&recipient_id) {
            Some(item) => {
                item.retry_count = item.retry_count.saturating_add(1);
                item.failed_at = now;
                item.retry_count
            }
            None => {
                self.items.insert(
                    recipient_id.clone(),
                    RetryItem {
                        recipient,
                        retry_count: 0,
                        failed_at: now,
                    },
                );
                0
            }
        };

        if retry_count >= self.max_retries {
            self.items.remove(&recipient_id);
            return RetryFailure::Exhausted { retry_count };
        }

        RetryFailure::Queued { retry_count }
    }

    pub fn dequeue_ready(&self) -> DequeueOutcome {
        self.dequeue_ready_at(Instant::now(), &mut rand::thread_rng())
    }

    pub fn dequeue_ready_at<R: Rng + ?Sized>(&self, now: Instant, rng: &mut R) -> DequeueOutcome {
        let mut ready = Vec::new();
        let mut shortest_wait: Option<Duration> = None;

        for item in self.items.values() {
            if item.retry_count >= self.max_retries {
                continue;
            }

            let elapsed = now.saturating_duration_since(item.failed_at);
            if elapsed >= self.cooldown {
                ready.push(item);
            } else {
                let remaining = self.cooldown - elapsed;
                shortest_wait = Some(shortest_wait.map_or(remaining, |w| w.min(remaining)));
            }
        }

        if let Some(item) = ready.choose(rng) {
            return DequeueOutcome::Ready((*item).clone());
        }

        match shortest_wait {
            Some(wait) => DequeueOutcome::Wait(wait),
            None => DequeueOutcome::Empty,
        }
    }

    pub fn remove(&mut self, recipient_id: &str) -> Option<RetryItem> {
        self.items.remove(recipient_id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
