use fleetmail_protocol::{model::Settings, template::split_invites};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteStep {
    Active { index: usize, text: String },
    /// The last invite's window has elapsed and the rotation does not cycle.
    Complete,
}

/// Time-based rotation through the invites of a chat template.
#[derive(Debug, Clone)]
pub struct InviteRotator {
    invites: Vec<String>,
    index: usize,
    started_at: Instant,
    rotation: Duration,
    cyclic: bool,
    complete: bool,
}

impl InviteRotator {
    /// Returns `None` when the template holds no invites.
    pub fn new(template: &str, settings: &Settings, now: Instant) -> Option<Self> {
        let invites = split_invites(template);
        if invites.is_empty() {
            return None;
        }

        let index = if settings.current_invite_index < invites.len() {
            settings.current_invite_index
        } else {
            0
        };

        Some(Self {
            invites,
            index,
            started_at: now,
            rotation: rotation_window(settings.rotation_hours),
            cyclic: settings.cyclic,
            complete: false,
        })
    }

    pub fn len(&self) -> usize {
        self.invites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invites.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn advance_at(&mut self, now: Instant) -> InviteStep {
        if self.complete {
            return InviteStep::Complete;
        }

        if now.saturating_duration_since(self.started_at) >= self.rotation {
            self.index += 1;
            self.started_at = now;

            if self.index >= self.invites.len() {
                if !self.cyclic {
                    self.complete = true;
                    return InviteStep::Complete;
                }
                self.index = 0;
            }
        }

        InviteStep::Active {
            index: self.index,
            text: self.invites[self.index].clone(),
        }
    }
}

fn rotation_window(hours: f64) -> Duration {
    if hours.is_finite() && hours > 0.0 {
        Duration::from_secs_f64(hours * 60.0 * 60.0)
    } else {
        Duration::ZERO
    }
}
