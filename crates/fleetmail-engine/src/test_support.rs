use crate::{
    account::{Account, AccountSettings, Credentials},
    context::EngineContext,
    control_plane::{ControlPlaneApi, ControlPlaneError, OperatorPrompt},
    platform::{PlatformApi, PlatformError, Session},
    telemetry::TelemetrySink,
};
use async_trait::async_trait;
use fleetmail_protocol::{
    config::EngineLimits,
    events::{AccountStatus, PaymentStatus, SendRequest, TelemetryEvent},
    model::{Category, ControlStatus, InboundMessage, Mode, Recipient},
};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

#[derive(Debug, Default)]
struct PlatformState {
    categories: HashMap<Category, Vec<Recipient>>,
    inbox: Vec<InboundMessage>,
    listing_failure: Option<PlatformError>,
    rejections: HashMap<String, String>,
    send_transport_failures: HashSet<String>,
    unsendable: HashSet<String>,
    expire_next_send: bool,
    sent: Vec<SendRequest>,
    tokens_seen: Vec<String>,
}

/// In-memory platform; every recipient is sendable and accepted unless configured otherwise.
#[derive(Debug, Default)]
pub struct FakePlatform {
    state: Mutex<PlatformState>,
    list_calls: AtomicUsize,
    login_calls: AtomicUsize,
    stall_sends: AtomicBool,
}

impl FakePlatform {
    fn state(&self) -> std::sync::MutexGuard<'_, PlatformState> {
        self.state.lock().expect("fake platform lock poisoned")
    }

    pub fn set_category(&self, category: Category, recipients: Vec<Recipient>) {
        self.state().categories.insert(category, recipients);
    }

    pub fn set_inbox(&self, inbox: Vec<InboundMessage>) {
        self.state().inbox = inbox;
    }

    pub fn fail_listing(&self, err: PlatformError) {
        self.state().listing_failure = Some(err);
    }

    pub fn reject(&self, recipient_id: &str, reason: &str) {
        self.state()
            .rejections
            .insert(recipient_id.to_string(), reason.to_string());
    }

    pub fn accept(&self, recipient_id: &str) {
        self.state().rejections.remove(recipient_id);
    }

    pub fn drop_sends_to(&self, recipient_id: &str) {
        self.state()
            .send_transport_failures
            .insert(recipient_id.to_string());
    }

    pub fn mark_unsendable(&self, recipient_id: &str) {
        self.state().unsendable.insert(recipient_id.to_string());
    }

    pub fn expire_next_send(&self) {
        self.state().expire_next_send = true;
    }

    /// Every later `send` hangs forever, like a platform that never answers.
    pub fn stall_sends(&self) {
        self.stall_sends.store(true, Ordering::SeqCst);
    }

    pub fn send_attempts(&self) -> usize {
        self.state().tokens_seen.len()
    }

    pub fn sent(&self) -> Vec<SendRequest> {
        self.state().sent.clone()
    }

    pub fn sent_ids(&self) -> Vec<String> {
        self.state()
            .sent
            .iter()
            .map(|req| req.recipient_id.clone())
            .collect()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.state().tokens_seen.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn login(&self, credentials: &Credentials) -> Result<String, PlatformError> {
        let n = self.login_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{}-token-{n}", credentials.login))
    }

    async fn list_recipients(
        &self,
        _session: &Session,
        _mode: Mode,
        category: Category,
    ) -> Result<Vec<Recipient>, PlatformError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if let Some(err) = state.listing_failure.clone() {
            return Err(err);
        }
        Ok(state.categories.get(&category).cloned().unwrap_or_default())
    }

    async fn check_sendable(
        &self,
        _session: &Session,
        _mode: Mode,
        recipient_id: &str,
    ) -> Result<Option<String>, PlatformError> {
        if self.state().unsendable.contains(recipient_id) {
            return Ok(None);
        }
        Ok(Some(format!("send-{recipient_id}")))
    }

    async fn send(&self, session: &Session, request: SendRequest) -> Result<(), PlatformError> {
        self.state().tokens_seen.push(session.token.clone());
        if self.stall_sends.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let mut state = self.state();
        if std::mem::take(&mut state.expire_next_send) {
            return Err(PlatformError::Unauthorized);
        }
        if state.send_transport_failures.contains(&request.recipient_id) {
            return Err(PlatformError::Transport("connection reset".to_string()));
        }
        if let Some(reason) = state.rejections.get(&request.recipient_id) {
            return Err(PlatformError::Rejected(reason.clone()));
        }
        state.sent.push(request);
        Ok(())
    }

    async fn list_inbox(&self, _session: &Session) -> Result<Vec<InboundMessage>, PlatformError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if let Some(err) = state.listing_failure.clone() {
            return Err(err);
        }
        Ok(state.inbox.clone())
    }
}

#[derive(Debug)]
struct ControlPlaneState {
    status: Result<ControlStatus, ControlPlaneError>,
    account: AccountStatus,
    payment: PaymentStatus,
}

#[derive(Debug)]
pub struct FakeControlPlane {
    state: Mutex<ControlPlaneState>,
    trial_activations: AtomicUsize,
    remote_checks: AtomicUsize,
}

impl Default for FakeControlPlane {
    fn default() -> Self {
        Self {
            state: Mutex::new(ControlPlaneState {
                status: Ok(ControlStatus::default()),
                account: AccountStatus {
                    exists: true,
                    paused: false,
                },
                payment: PaymentStatus {
                    is_paid: true,
                    can_trial: false,
                },
            }),
            trial_activations: AtomicUsize::new(0),
            remote_checks: AtomicUsize::new(0),
        }
    }
}

impl FakeControlPlane {
    fn state(&self) -> std::sync::MutexGuard<'_, ControlPlaneState> {
        self.state.lock().expect("fake control plane lock poisoned")
    }

    pub fn set_status(&self, status: ControlStatus) {
        self.state().status = Ok(status);
    }

    pub fn fail_status(&self, err: ControlPlaneError) {
        self.state().status = Err(err);
    }

    pub fn set_account(&self, account: AccountStatus) {
        self.state().account = account;
    }

    pub fn set_payment(&self, payment: PaymentStatus) {
        self.state().payment = payment;
    }

    pub fn trial_activations(&self) -> usize {
        self.trial_activations.load(Ordering::SeqCst)
    }

    pub fn remote_checks(&self) -> usize {
        self.remote_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControlPlaneApi for FakeControlPlane {
    async fn get_status(&self) -> Result<ControlStatus, ControlPlaneError> {
        self.state().status.clone()
    }

    async fn check_account_allowed(
        &self,
        _account_id: &str,
    ) -> Result<AccountStatus, ControlPlaneError> {
        self.remote_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.state().account)
    }

    async fn check_payment(&self, _account_id: &str) -> Result<PaymentStatus, ControlPlaneError> {
        Ok(self.state().payment)
    }

    async fn activate_trial(&self, _account_id: &str) -> Result<PaymentStatus, ControlPlaneError> {
        self.trial_activations.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.payment = PaymentStatus {
            is_paid: true,
            can_trial: false,
        };
        Ok(state.payment)
    }
}

#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .expect("telemetry lock poisoned")
            .clone()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn emit(&self, event: TelemetryEvent) {
        self.events
            .lock()
            .expect("telemetry lock poisoned")
            .push(event);
    }
}

#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    accept: AtomicBool,
    asked: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn accepting(accept: bool) -> Self {
        Self {
            accept: AtomicBool::new(accept),
            asked: AtomicUsize::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OperatorPrompt for ScriptedPrompt {
    async fn confirm_trial(&self, _account: &Account) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.accept.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub platform: Arc<FakePlatform>,
    pub control_plane: Arc<FakeControlPlane>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub prompt: Arc<ScriptedPrompt>,
    pub ctx: Arc<EngineContext>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_limits(EngineLimits::default())
    }

    pub fn with_limits(limits: EngineLimits) -> Self {
        let platform = Arc::new(FakePlatform::default());
        let control_plane = Arc::new(FakeControlPlane::default());
        let telemetry = Arc::new(RecordingTelemetry::default());
        let prompt = Arc::new(ScriptedPrompt::accepting(true));
        let ctx = Arc::new(EngineContext::new(
            limits,
            platform.clone(),
            control_plane.clone(),
            telemetry.clone(),
            prompt.clone(),
        ));

        Self {
            platform,
            control_plane,
            telemetry,
            prompt,
            ctx,
        }
    }
}

pub fn test_account(id: &str) -> Account {
    Account {
        id: id.to_string(),
        display_id: format!("display-{id}"),
        credentials: Credentials {
            login: format!("{id}@example.com"),
            password: "s3cret-password".to_string(),
        },
    }
}

pub fn fixed_speed_settings(secs: u64) -> AccountSettings {
    let mut settings = AccountSettings::default();
    for mode in Mode::ALL {
        let target = match mode {
            Mode::Mail => &mut settings.mail,
            Mode::Chat => &mut settings.chat,
        };
        target.speed = fleetmail_protocol::model::SpeedPolicy::FixedSecs(secs);
    }
    settings
}
