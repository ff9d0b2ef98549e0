use crate::{
    control_plane::{ControlPlaneApi, OperatorPrompt},
    conversations::ConversationTracker,
    platform::PlatformApi,
    telemetry::TelemetrySink,
};
use fleetmail_protocol::{config::EngineLimits, model::ControlStatus};
use std::sync::Arc;
use tokio::sync::watch;

/// Collaborators and process-wide state shared by every scheduler.
pub struct EngineContext {
    pub limits: EngineLimits,
    pub platform: Arc<dyn PlatformApi>,
    pub control_plane: Arc<dyn ControlPlaneApi>,
    pub telemetry: Arc<dyn TelemetrySink>,
    pub prompt: Arc<dyn OperatorPrompt>,
    pub conversations: ConversationTracker,
    control: watch::Sender<Arc<ControlStatus>>,
}

impl EngineContext {
    pub fn new(
        limits: EngineLimits,
        platform: Arc<dyn PlatformApi>,
        control_plane: Arc<dyn ControlPlaneApi>,
        telemetry: Arc<dyn TelemetrySink>,
        prompt: Arc<dyn OperatorPrompt>,
    ) -> Self {
        let (control, _) = watch::channel(Arc::new(ControlStatus::default()));
        Self {
            limits,
            platform,
            control_plane,
            telemetry,
            prompt,
            conversations: ConversationTracker::new(),
            control,
        }
    }

    /// Current control snapshot. Snapshots are never mutated, only replaced.
    pub fn control_snapshot(&self) -> Arc<ControlStatus> {
        Arc::clone(&self.control.borrow())
    }

    /// Publishes a new snapshot and returns the one it replaced.
    pub fn replace_control_status(&self, next: ControlStatus) -> Arc<ControlStatus> {
        self.control.send_replace(Arc::new(next))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::Harness;
    use fleetmail_protocol::model::ControlStatus;
    use std::sync::Arc;

    #[test]
    fn starts_with_permissive_snapshot() {
        let harness = Harness::new();
        assert_eq!(*harness.ctx.control_snapshot(), ControlStatus::default());
    }

    #[test]
    fn replacement_leaves_earlier_snapshots_untouched() {
        let harness = Harness::new();
        let before = harness.ctx.control_snapshot();

        let previous = harness.ctx.replace_control_status(ControlStatus {
            panic_mode: true,
            ..ControlStatus::default()
        });

        assert!(Arc::ptr_eq(&before, &previous));
        assert!(!before.panic_mode);
        assert!(harness.ctx.control_snapshot().panic_mode);
    }
}
