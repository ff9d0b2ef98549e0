use super::{AccountScheduler, Campaign, StopReason};
use crate::{
    invites::InviteStep,
    logging,
    platform::{PlatformError, Session},
    resolver::{self, CampaignView, Resolution},
    retry_queue::{DequeueOutcome, RetryFailure},
    rotator,
};
use fleetmail_protocol::{
    events::{SendAttemptEvent, SendRequest, TelemetryEvent},
    model::{Mode, Recipient, RecipientId, Settings, Target},
    template,
};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Result of one `process_one_user` pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Sent {
        recipient_id: RecipientId,
        first_contact: bool,
    },
    /// The platform refused the message; the recipient waits in the retry queue.
    Rejected {
        recipient_id: RecipientId,
        reason: String,
        retry_count: u32,
    },
    /// Rejected again after the last permitted retry; the recipient is dropped.
    RetryExhausted {
        recipient_id: RecipientId,
        reason: String,
        retry_count: u32,
    },
    /// No answer from the platform. Counters and campaign state are untouched.
    TransportFailed { reason: String },
    /// The session token expired; a fresh login was attempted.
    Unauthorized,
    /// Only cooling-down retries remain.
    Waiting(Duration),
    Idle,
    ListExhausted,
    InvitesComplete,
}

impl TickOutcome {
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            TickOutcome::ListExhausted => Some(StopReason::ListExhausted),
            TickOutcome::InvitesComplete => Some(StopReason::InvitesComplete),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Pick {
    Fresh {
        recipient: Recipient,
        next_cursor: Option<usize>,
    },
    Retry {
        recipient: Recipient,
        retry_count: u32,
    },
    Wait(Duration),
    Idle,
    ListExhausted,
}

impl AccountScheduler {
    pub async fn process_one_user(&self, mode: Mode) -> TickOutcome {
        self.process_one_user_at(mode, Instant::now()).await
    }

    pub async fn process_one_user_at(&self, mode: Mode, now: Instant) -> TickOutcome {
        let state = self.mode_state(mode);
        let mut settings = state.settings.read().await.clone();
        let session = self.session().await;
        let mut campaign = state.campaign.lock().await;

        let body_template = match (mode, campaign.invites.as_mut()) {
            (Mode::Chat, Some(invites)) => match invites.advance_at(now) {
                InviteStep::Complete => return TickOutcome::InvitesComplete,
                InviteStep::Active { index, text } => {
                    if index != settings.current_invite_index {
                        settings.current_invite_index = index;
                        state.settings.write().await.current_invite_index = index;
                        logging::log_invite_advanced(&self.account.id, index);
                    }
                    text
                }
            },
            _ => campaign.template.clone(),
        };

        let pick = match self
            .pick(mode, &session, &mut settings, &mut campaign, now)
            .await
        {
            Ok(pick) => pick,
            Err(err) => return self.platform_failure(err).await,
        };

        let (recipient, next_cursor, prior_retry) = match pick {
            Pick::Fresh {
                recipient,
                next_cursor,
            } => (recipient, next_cursor, None),
            Pick::Retry {
                recipient,
                retry_count,
            } => (recipient, None, Some(retry_count)),
            Pick::Wait(wait) => return TickOutcome::Waiting(wait),
            Pick::Idle => return TickOutcome::Idle,
            Pick::ListExhausted => return TickOutcome::ListExhausted,
        };

        let body = template::render(&body_template, &recipient);
        let delivery = self.deliver(mode, &session, &recipient, body).await;

        let reason = match delivery {
            Ok(()) => {
                if let Some(cursor) = next_cursor {
                    campaign.id_cursor = cursor;
                }
                campaign.contacted.insert(recipient.id.clone());
                campaign.retries.remove(&recipient.id);
                let waiting = campaign.retries.len();
                let campaign_id = campaign.id;
                {
                    let mut counters = state.counters.lock().await;
                    counters.sent += 1;
                    counters.waiting = waiting;
                }
                drop(campaign);

                let contact = self
                    .ctx
                    .conversations
                    .track_at(&self.account.id, &recipient.id, now)
                    .await;

                self.ctx
                    .telemetry
                    .emit(TelemetryEvent::SendSucceeded(SendAttemptEvent {
                        first_contact: contact.is_first,
                        response_time_ms: contact.response_time.map(duration_ms),
                        retry_count: prior_retry,
                        ..self.attempt(mode, &settings, campaign_id, &recipient.id)
                    }));

                return TickOutcome::Sent {
                    recipient_id: recipient.id,
                    first_contact: contact.is_first,
                };
            }
            Err(PlatformError::Rejected(reason)) => reason,
            Err(err) => {
                drop(campaign);
                return self.platform_failure(err).await;
            }
        };

        if let Some(cursor) = next_cursor {
            campaign.id_cursor = cursor;
        }
        let recipient_id = recipient.id.clone();
        let failure = campaign.retries.record_failure_at(recipient, now);
        if let RetryFailure::Exhausted { .. } = failure {
            campaign.exhausted.insert(recipient_id.clone());
        }
        let waiting = campaign.retries.len();
        let campaign_id = campaign.id;
        {
            let mut counters = state.counters.lock().await;
            counters.errors += 1;
            counters.waiting = waiting;
        }
        drop(campaign);

        let retry_count = match failure {
            RetryFailure::Queued { retry_count } | RetryFailure::Exhausted { retry_count } => {
                retry_count
            }
        };
        self.ctx
            .telemetry
            .emit(TelemetryEvent::SendFailed(SendAttemptEvent {
                reason: Some(reason.clone()),
                first_contact: false,
                retry_count: Some(retry_count),
                ..self.attempt(mode, &settings, campaign_id, &recipient_id)
            }));

        match failure {
            RetryFailure::Queued { retry_count } => TickOutcome::Rejected {
                recipient_id,
                reason,
                retry_count,
            },
            RetryFailure::Exhausted { retry_count } => TickOutcome::RetryExhausted {
                recipient_id,
                reason,
                retry_count,
            },
        }
    }

    /// Fresh recipients first, then ready retries, then at most one category rotation.
    async fn pick(
        &self,
        mode: Mode,
        session: &Session,
        settings: &mut Settings,
        campaign: &mut Campaign,
        now: Instant,
    ) -> Result<Pick, PlatformError> {
        let mut rotated = false;

        loop {
            let view = CampaignView {
                contacted: &campaign.contacted,
                id_cursor: campaign.id_cursor,
            };
            let resolution =
                resolver::resolve(self.ctx.platform.as_ref(), session, mode, settings, view)
                    .await?;

            let list_exhausted = match resolution {
                Resolution::Candidates(pool) => {
                    // Rejected recipients come back through the retry queue, after their cooldown.
                    let fresh = pool.into_iter().find(|recipient| {
                        campaign.retries.get(&recipient.id).is_none()
                            && !campaign.exhausted.contains(&recipient.id)
                    });
                    if let Some(recipient) = fresh {
                        return Ok(Pick::Fresh {
                            recipient,
                            next_cursor: None,
                        });
                    }
                    false
                }
                Resolution::Listed {
                    recipient,
                    next_cursor,
                } => {
                    return Ok(Pick::Fresh {
                        recipient,
                        next_cursor: Some(next_cursor),
                    })
                }
                Resolution::ListExhausted => true,
            };

            match campaign
                .retries
                .dequeue_ready_at(now, &mut rand::thread_rng())
            {
                DequeueOutcome::Ready(item) => {
                    return Ok(Pick::Retry {
                        recipient: item.recipient,
                        retry_count: item.retry_count,
                    })
                }
                DequeueOutcome::Wait(wait) => return Ok(Pick::Wait(wait)),
                DequeueOutcome::Empty => {}
            }

            if list_exhausted {
                return Ok(Pick::ListExhausted);
            }

            let current = match settings.target.category() {
                Some(category) if settings.auto && !rotated => category,
                _ => return Ok(Pick::Idle),
            };
            let disabled = rotator::disabled_for_mode(mode, &settings.disabled_categories);
            let next = rotator::next_category(current, &disabled);

            campaign.restart();
            self.mode_state(mode).counters.lock().await.waiting = 0;
            settings.target = Target::Category(next);
            self.mode_state(mode).settings.write().await.target = Target::Category(next);
            logging::log_category_rotated(&self.account.id, mode, current, next);
            rotated = true;
        }
    }

    async fn deliver(
        &self,
        mode: Mode,
        session: &Session,
        recipient: &Recipient,
        body: String,
    ) -> Result<(), PlatformError> {
        let platform = self.ctx.platform.as_ref();
        let token = platform
            .check_sendable(session, mode, &recipient.id)
            .await?
            .ok_or_else(|| PlatformError::Rejected("not_sendable".to_string()))?;

        platform
            .send(
                session,
                SendRequest {
                    mode,
                    token,
                    recipient_id: recipient.id.clone(),
                    body,
                    in_reply_to: recipient.in_reply_to.clone(),
                },
            )
            .await
    }

    async fn platform_failure(&self, err: PlatformError) -> TickOutcome {
        match err {
            PlatformError::Unauthorized => {
                self.refresh_auth().await;
                TickOutcome::Unauthorized
            }
            PlatformError::Transport(reason) | PlatformError::Rejected(reason) => {
                TickOutcome::TransportFailed { reason }
            }
        }
    }

    fn attempt(
        &self,
        mode: Mode,
        settings: &Settings,
        campaign_id: Uuid,
        recipient_id: &str,
    ) -> SendAttemptEvent {
        SendAttemptEvent {
            account_id: self.account.id.clone(),
            recipient_id: recipient_id.to_string(),
            mode,
            target: settings.target.label().to_string(),
            campaign_id,
            reason: None,
            first_contact: false,
            response_time_ms: None,
            retry_count: None,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
