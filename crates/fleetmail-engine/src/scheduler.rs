mod tick;

pub use tick::TickOutcome;

use crate::{
    account::{Account, AccountSettings},
    context::EngineContext,
    control_plane::ControlPlaneError,
    fleet::now_unix,
    invites::InviteRotator,
    logging,
    platform::Session,
    rate_model,
    retry_queue::RetryQueue,
};
use fleetmail_protocol::model::{Category, Gate, Mode, RecipientId, Settings, SpeedPolicy, Target};
use serde::Serialize;
use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Running { started_unix: u64 },
}

impl SchedulerState {
    pub fn is_running(self) -> bool {
        matches!(self, SchedulerState::Running { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counters {
    pub sent: u64,
    pub errors: u64,
    pub waiting: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Operator,
    PanicMode,
    SoftStop,
    BotDisabled,
    MailingDisabled,
    InvitesComplete,
    ListExhausted,
    AccountRemoved,
    Shutdown,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Operator => "operator",
            StopReason::PanicMode => "panic_mode",
            StopReason::SoftStop => "soft_stop",
            StopReason::BotDisabled => "bot_disabled",
            StopReason::MailingDisabled => "mailing_disabled",
            StopReason::InvitesComplete => "invites_complete",
            StopReason::ListExhausted => "list_exhausted",
            StopReason::AccountRemoved => "account_removed",
            StopReason::Shutdown => "shutdown",
        }
    }
}

impl From<Gate> for StopReason {
    fn from(gate: Gate) -> Self {
        match gate {
            Gate::PanicMode => StopReason::PanicMode,
            Gate::BotDisabled => StopReason::BotDisabled,
            Gate::MailingDisabled => StopReason::MailingDisabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("{0} scheduler is already running")]
    AlreadyRunning(Mode),
    #[error("start blocked by control gate: {0}")]
    Gate(Gate),
    #[error("message template is empty")]
    EmptyTemplate,
    #[error("account is not registered with the control plane")]
    AccountNotRegistered,
    #[error("account is paused by the control plane")]
    AccountPaused,
    #[error("account has no active subscription")]
    PaymentRequired,
    #[error("trial activation was declined")]
    TrialDeclined,
    #[error("account is not logged in")]
    NotLoggedIn,
    #[error(transparent)]
    ControlPlane(#[from] ControlPlaneError),
}

/// Per-(account, mode) campaign state, touched only by the mode's own tick and operator resets.
#[derive(Debug)]
pub(crate) struct Campaign {
    pub(crate) id: Uuid,
    pub(crate) contacted: HashSet<RecipientId>,
    pub(crate) retries: RetryQueue,
    /// Recipients whose retries ran out; never targeted again this campaign.
    pub(crate) exhausted: HashSet<RecipientId>,
    pub(crate) id_cursor: usize,
    pub(crate) template: String,
    pub(crate) invites: Option<InviteRotator>,
}

impl Campaign {
    fn new(retries: RetryQueue) -> Self {
        Self {
            id: Uuid::new_v4(),
            contacted: HashSet::new(),
            retries,
            exhausted: HashSet::new(),
            id_cursor: 0,
            template: String::new(),
            invites: None,
        }
    }

    pub(crate) fn restart(&mut self) {
        self.id = Uuid::new_v4();
        self.contacted.clear();
        self.retries.clear();
        self.exhausted.clear();
        self.id_cursor = 0;
    }
}

#[derive(Debug, Default)]
struct RunState {
    started_unix: Option<u64>,
    generation: u64,
    cancel: Option<CancellationToken>,
}

#[derive(Debug)]
pub(crate) struct ModeState {
    pub(crate) settings: RwLock<Settings>,
    pub(crate) campaign: Mutex<Campaign>,
    pub(crate) counters: Mutex<Counters>,
    run: Mutex<RunState>,
}

impl ModeState {
    fn new(settings: Settings, retries: RetryQueue) -> Self {
        Self {
            settings: RwLock::new(settings),
            campaign: Mutex::new(Campaign::new(retries)),
            counters: Mutex::new(Counters::default()),
            run: Mutex::new(RunState::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeSnapshot {
    pub mode: Mode,
    pub state: SchedulerState,
    pub target: String,
    pub counters: Counters,
}

/// Mail and chat schedulers for one logged-in account.
pub struct AccountScheduler {
    account: Account,
    token: RwLock<String>,
    ctx: Arc<EngineContext>,
    mail: ModeState,
    chat: ModeState,
}

impl AccountScheduler {
    pub fn new(
        account: Account,
        token: String,
        settings: AccountSettings,
        ctx: Arc<EngineContext>,
    ) -> Self {
        let mode_state = |mode| {
            ModeState::new(
                settings.for_mode(mode).clone(),
                RetryQueue::from_limits(&ctx.limits),
            )
        };
        let mail = mode_state(Mode::Mail);
        let chat = mode_state(Mode::Chat);

        Self {
            account,
            token: RwLock::new(token),
            ctx,
            mail,
            chat,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub(crate) fn mode_state(&self, mode: Mode) -> &ModeState {
        match mode {
            Mode::Mail => &self.mail,
            Mode::Chat => &self.chat,
        }
    }

    pub(crate) async fn session(&self) -> Session {
        Session {
            account_id: self.account.id.clone(),
            token: self.token.read().await.clone(),
        }
    }

    pub async fn state(&self, mode: Mode) -> SchedulerState {
        match self.mode_state(mode).run.lock().await.started_unix {
            Some(started_unix) => SchedulerState::Running { started_unix },
            None => SchedulerState::Idle,
        }
    }

    pub async fn is_running(&self, mode: Mode) -> bool {
        self.state(mode).await.is_running()
    }

    /// Never waits on the campaign lock, so it stays cheap while a send is in flight.
    pub async fn counters(&self, mode: Mode) -> Counters {
        *self.mode_state(mode).counters.lock().await
    }

    pub async fn snapshot(&self, mode: Mode) -> ModeSnapshot {
        ModeSnapshot {
            mode,
            state: self.state(mode).await,
            target: self.settings(mode).await.target.label().to_string(),
            counters: self.counters(mode).await,
        }
    }

    pub async fn start(self: &Arc<Self>, mode: Mode, template: &str) -> Result<(), StartError> {
        let result = self.try_start(mode, template).await;
        if let Err(err) = &result {
            logging::log_start_rejected(&self.account.id, mode, err);
        }
        result
    }

    async fn try_start(self: &Arc<Self>, mode: Mode, template: &str) -> Result<(), StartError> {
        if self.is_running(mode).await {
            return Err(StartError::AlreadyRunning(mode));
        }

        if let Some(gate) = self.ctx.control_snapshot().closed_gate(&self.account.id) {
            return Err(StartError::Gate(gate));
        }

        let now = Instant::now();
        let settings = self.settings(mode).await;
        let invites = match mode {
            Mode::Chat => Some(
                InviteRotator::new(template, &settings, now).ok_or(StartError::EmptyTemplate)?,
            ),
            Mode::Mail if template.trim().is_empty() => return Err(StartError::EmptyTemplate),
            Mode::Mail => None,
        };

        self.check_remote_permissions().await?;

        let state = self.mode_state(mode);
        let mut run = state.run.lock().await;
        if run.started_unix.is_some() {
            return Err(StartError::AlreadyRunning(mode));
        }

        {
            let mut campaign = state.campaign.lock().await;
            campaign.template = template.to_string();
            campaign.invites = invites;
        }

        let cancel = CancellationToken::new();
        run.generation = run.generation.wrapping_add(1);
        run.started_unix = Some(now_unix());
        run.cancel = Some(cancel.clone());
        let generation = run.generation;
        drop(run);

        logging::log_started(&self.account.id, mode, settings.target.label());
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run_loop(mode, generation, cancel).await });
        Ok(())
    }

    async fn check_remote_permissions(&self) -> Result<(), StartError> {
        let control_plane = &self.ctx.control_plane;
        let status = control_plane
            .check_account_allowed(&self.account.id)
            .await?;
        if !status.exists {
            return Err(StartError::AccountNotRegistered);
        }
        if status.paused {
            return Err(StartError::AccountPaused);
        }

        let payment = control_plane.check_payment(&self.account.id).await?;
        if payment.is_paid {
            return Ok(());
        }
        if !payment.can_trial {
            return Err(StartError::PaymentRequired);
        }
        if !self.ctx.prompt.confirm_trial(&self.account).await {
            return Err(StartError::TrialDeclined);
        }

        let activated = control_plane.activate_trial(&self.account.id).await?;
        if !activated.is_paid {
            return Err(StartError::PaymentRequired);
        }
        logging::log_trial_activated(&self.account.id);
        Ok(())
    }

    /// Returns `true` when the mode was running.
    pub async fn stop(&self, mode: Mode, reason: StopReason) -> bool {
        let mut run = self.mode_state(mode).run.lock().await;
        let Some(cancel) = run.cancel.take() else {
            return false;
        };
        cancel.cancel();
        run.started_unix = None;
        drop(run);

        logging::log_stopped(&self.account.id, mode, reason);
        true
    }

    pub async fn stop_all(&self, reason: StopReason) -> usize {
        let mut stopped = 0;
        for mode in Mode::ALL {
            if self.stop(mode, reason).await {
                stopped += 1;
            }
        }
        stopped
    }

    /// Stops the run identified by `generation` unless a newer run replaced it.
    async fn finish(&self, mode: Mode, generation: u64, reason: StopReason) {
        let mut run = self.mode_state(mode).run.lock().await;
        if run.generation != generation || run.started_unix.is_none() {
            return;
        }
        if let Some(cancel) = run.cancel.take() {
            cancel.cancel();
        }
        run.started_unix = None;
        drop(run);

        logging::log_stopped(&self.account.id, mode, reason);
    }

    async fn run_loop(self: Arc<Self>, mode: Mode, generation: u64, cancel: CancellationToken) {
        let mut delay = Duration::ZERO;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            if cancel.is_cancelled() {
                break;
            }

            if let Some(gate) = self.ctx.control_snapshot().closed_gate(&self.account.id) {
                self.finish(mode, generation, gate.into()).await;
                break;
            }

            let outcome = self.process_one_user(mode).await;
            logging::log_tick(&self.account.id, mode, &outcome);

            if let Some(reason) = outcome.stop_reason() {
                self.finish(mode, generation, reason).await;
                break;
            }
            if cancel.is_cancelled() {
                break;
            }

            let speed = self.mode_state(mode).settings.read().await.speed;
            delay = rate_model::next_delay(speed, &self.ctx.limits);
        }
    }

    pub async fn settings(&self, mode: Mode) -> Settings {
        self.mode_state(mode).settings.read().await.clone()
    }

    pub async fn update_settings<F>(&self, mode: Mode, update: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.mode_state(mode).settings.write().await;
        update(&mut settings);
    }

    pub async fn set_target(&self, mode: Mode, target: Target) {
        self.update_settings(mode, |s| s.target = target).await;
    }

    pub async fn set_speed(&self, mode: Mode, speed: SpeedPolicy) {
        self.update_settings(mode, |s| s.speed = speed).await;
    }

    pub async fn set_auto(&self, mode: Mode, auto: bool) {
        self.update_settings(mode, |s| s.auto = auto).await;
    }

    pub async fn set_blacklist(&self, mode: Mode, blacklist: BTreeSet<RecipientId>) {
        self.update_settings(mode, |s| s.blacklist = blacklist).await;
    }

    pub async fn blacklist_add(&self, mode: Mode, recipient_id: impl Into<RecipientId>) {
        let recipient_id = recipient_id.into();
        self.update_settings(mode, |s| {
            s.blacklist.insert(recipient_id);
        })
        .await;
    }

    pub async fn set_disabled_categories(&self, mode: Mode, disabled: BTreeSet<Category>) {
        self.update_settings(mode, |s| s.disabled_categories = disabled)
            .await;
    }

    pub async fn set_photo_only(&self, photo_only: bool) {
        self.update_settings(Mode::Mail, |s| s.photo_only = photo_only)
            .await;
    }

    /// Applies to the next chat start; a running rotation keeps its window.
    pub async fn set_rotation(&self, rotation_hours: f64, cyclic: bool) {
        self.update_settings(Mode::Chat, |s| {
            s.rotation_hours = rotation_hours;
            s.cyclic = cyclic;
        })
        .await;
    }

    /// Starts a new campaign: forgets contacted recipients and pending retries.
    pub async fn reset_campaign(&self, mode: Mode) {
        let state = self.mode_state(mode);
        let mut campaign = state.campaign.lock().await;
        campaign.restart();
        state.counters.lock().await.waiting = 0;
        drop(campaign);
        logging::log_campaign_reset(&self.account.id, mode);
    }

    pub(crate) async fn refresh_auth(&self) {
        match self.ctx.platform.login(&self.account.credentials).await {
            Ok(token) => {
                *self.token.write().await = token;
                logging::log_token_refreshed(&self.account.id);
            }
            Err(err) => logging::log_token_refresh_failed(&self.account.id, &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixed_speed_settings, test_account, Harness};
    use fleetmail_protocol::{
        events::{AccountStatus, PaymentStatus},
        model::{ControlStatus, Recipient},
    };
    use std::collections::BTreeMap;
    use tokio::time::{sleep, timeout};

    fn scheduler(harness: &Harness) -> Arc<AccountScheduler> {
        Arc::new(AccountScheduler::new(
            test_account("acc-1"),
            "tok-0".to_string(),
            fixed_speed_settings(3600),
            Arc::clone(&harness.ctx),
        ))
    }

    async fn wait_until_idle(scheduler: &AccountScheduler, mode: Mode) {
        timeout(Duration::from_secs(2), async {
            while scheduler.is_running(mode).await {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("scheduler should go idle");
    }

    #[tokio::test]
    async fn each_closed_gate_refuses_start_before_remote_checks() {
        let cases = [
            (
                ControlStatus {
                    panic_mode: true,
                    ..ControlStatus::default()
                },
                Gate::PanicMode,
            ),
            (
                ControlStatus {
                    bot_enabled: false,
                    ..ControlStatus::default()
                },
                Gate::BotDisabled,
            ),
            (
                ControlStatus {
                    per_account: BTreeMap::from([("acc-1".to_string(), false)]),
                    ..ControlStatus::default()
                },
                Gate::MailingDisabled,
            ),
        ];

        for (status, gate) in cases {
            let harness = Harness::new();
            harness.ctx.replace_control_status(status);
            let scheduler = scheduler(&harness);

            let err = scheduler
                .start(Mode::Mail, "Hi {name}")
                .await
                .expect_err("closed gate must refuse start");

            assert_eq!(err, StartError::Gate(gate));
            assert_eq!(harness.control_plane.remote_checks(), 0);
            assert!(!scheduler.is_running(Mode::Mail).await);
        }
    }

    #[tokio::test]
    async fn stop_spam_alone_does_not_block_start() {
        let harness = Harness::new();
        harness.ctx.replace_control_status(ControlStatus {
            stop_spam: true,
            ..ControlStatus::default()
        });
        let scheduler = scheduler(&harness);

        scheduler
            .start(Mode::Mail, "Hi")
            .await
            .expect("soft stop is a broadcast, not a gate");
        assert!(scheduler.is_running(Mode::Mail).await);
    }

    #[tokio::test]
    async fn empty_templates_are_refused() {
        let harness = Harness::new();
        let scheduler = scheduler(&harness);

        assert_eq!(
            scheduler.start(Mode::Mail, "   ").await,
            Err(StartError::EmptyTemplate)
        );
        assert_eq!(
            scheduler.start(Mode::Chat, " __ \n __ ").await,
            Err(StartError::EmptyTemplate)
        );
    }

    #[tokio::test]
    async fn remote_account_status_gates_start() {
        let harness = Harness::new();
        let scheduler = scheduler(&harness);

        harness.control_plane.set_account(AccountStatus {
            exists: false,
            paused: false,
        });
        assert_eq!(
            scheduler.start(Mode::Mail, "Hi").await,
            Err(StartError::AccountNotRegistered)
        );

        harness.control_plane.set_account(AccountStatus {
            exists: true,
            paused: true,
        });
        assert_eq!(
            scheduler.start(Mode::Mail, "Hi").await,
            Err(StartError::AccountPaused)
        );

        harness.control_plane.set_account(AccountStatus {
            exists: true,
            paused: false,
        });
        harness.control_plane.set_payment(PaymentStatus {
            is_paid: false,
            can_trial: false,
        });
        assert_eq!(
            scheduler.start(Mode::Mail, "Hi").await,
            Err(StartError::PaymentRequired)
        );
        assert_eq!(harness.prompt.asked(), 0);
    }

    #[tokio::test]
    async fn declined_trial_aborts_start() {
        let harness = Harness::new();
        harness.control_plane.set_payment(PaymentStatus {
            is_paid: false,
            can_trial: true,
        });
        let ctx = Arc::new(EngineContext::new(
            harness.ctx.limits.clone(),
            harness.platform.clone(),
            harness.control_plane.clone(),
            harness.telemetry.clone(),
            Arc::new(crate::test_support::ScriptedPrompt::accepting(false)),
        ));
        let scheduler = Arc::new(AccountScheduler::new(
            test_account("acc-1"),
            "tok-0".to_string(),
            fixed_speed_settings(3600),
            ctx,
        ));

        assert_eq!(
            scheduler.start(Mode::Mail, "Hi").await,
            Err(StartError::TrialDeclined)
        );
        assert_eq!(harness.control_plane.trial_activations(), 0);
    }

    #[tokio::test]
    async fn accepted_trial_activates_and_starts() {
        let harness = Harness::new();
        harness.control_plane.set_payment(PaymentStatus {
            is_paid: false,
            can_trial: true,
        });
        let scheduler = scheduler(&harness);

        scheduler
            .start(Mode::Mail, "Hi")
            .await
            .expect("accepted trial should start");

        assert_eq!(harness.prompt.asked(), 1);
        assert_eq!(harness.control_plane.trial_activations(), 1);
        assert!(scheduler.is_running(Mode::Mail).await);
    }

    #[tokio::test]
    async fn second_start_reports_already_running() {
        let harness = Harness::new();
        let scheduler = scheduler(&harness);
        scheduler.start(Mode::Chat, "Hi").await.expect("first start");

        assert_eq!(
            scheduler.start(Mode::Chat, "Hi").await,
            Err(StartError::AlreadyRunning(Mode::Chat))
        );
        assert!(!scheduler.is_running(Mode::Mail).await);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let harness = Harness::new();
        let scheduler = scheduler(&harness);
        scheduler.start(Mode::Mail, "Hi").await.expect("start");

        assert!(scheduler.stop(Mode::Mail, StopReason::Operator).await);
        assert!(!scheduler.stop(Mode::Mail, StopReason::Operator).await);
        assert_eq!(scheduler.state(Mode::Mail).await, SchedulerState::Idle);

        scheduler
            .start(Mode::Mail, "Hi")
            .await
            .expect("restart after stop");
        assert!(scheduler.is_running(Mode::Mail).await);
    }

    #[tokio::test]
    async fn first_tick_fires_immediately_and_stop_prevents_the_next() {
        let harness = Harness::new();
        harness.platform.set_category(
            Category::Online,
            vec![Recipient::with_id("A"), Recipient::with_id("B")],
        );
        let scheduler = scheduler(&harness);

        scheduler.start(Mode::Mail, "Hi {name}").await.expect("start");
        timeout(Duration::from_secs(2), async {
            while harness.platform.sent_ids().is_empty() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("first tick should send");

        assert!(scheduler.stop(Mode::Mail, StopReason::Operator).await);
        sleep(Duration::from_millis(20)).await;
        assert_eq!(harness.platform.sent_ids(), vec!["A"]);
        assert_eq!(scheduler.counters(Mode::Mail).await.sent, 1);
    }

    #[tokio::test]
    async fn running_loop_halts_on_gate_closed_after_start() {
        let harness = Harness::new();
        harness
            .platform
            .set_category(Category::Online, vec![Recipient::with_id("A")]);
        let scheduler = scheduler(&harness);

        scheduler.start(Mode::Mail, "Hi").await.expect("start");
        harness.ctx.replace_control_status(ControlStatus {
            panic_mode: true,
            ..ControlStatus::default()
        });

        wait_until_idle(&scheduler, Mode::Mail).await;
        assert!(harness.platform.sent().is_empty());
    }

    #[tokio::test]
    async fn exhausted_id_list_stops_the_mode() {
        let harness = Harness::new();
        let scheduler = Arc::new(AccountScheduler::new(
            test_account("acc-1"),
            "tok-0".to_string(),
            fixed_speed_settings(0),
            Arc::clone(&harness.ctx),
        ));
        scheduler
            .set_target(Mode::Mail, Target::IdList(vec!["7".to_string()]))
            .await;

        scheduler.start(Mode::Mail, "Hi").await.expect("start");

        wait_until_idle(&scheduler, Mode::Mail).await;
        assert_eq!(harness.platform.sent_ids(), vec!["7"]);
    }

    #[tokio::test]
    async fn chat_start_resumes_stored_invite_index() {
        let harness = Harness::new();
        let scheduler = scheduler(&harness);
        scheduler
            .update_settings(Mode::Chat, |s| s.current_invite_index = 1)
            .await;

        scheduler
            .start(Mode::Chat, "first __ second __ third")
            .await
            .expect("start chat");

        let campaign = scheduler.mode_state(Mode::Chat).campaign.lock().await;
        let invites = campaign.invites.as_ref().expect("chat start builds invites");
        assert_eq!(invites.len(), 3);
        assert_eq!(invites.index(), 1);
    }

    #[tokio::test]
    async fn operator_setters_update_settings() {
        let harness = Harness::new();
        let scheduler = scheduler(&harness);

        scheduler.set_speed(Mode::Mail, SpeedPolicy::Smart).await;
        scheduler.set_auto(Mode::Mail, true).await;
        scheduler.blacklist_add(Mode::Mail, "spam-1").await;
        scheduler.set_photo_only(true).await;
        scheduler
            .set_disabled_categories(Mode::Mail, BTreeSet::from([Category::Favorites]))
            .await;
        scheduler.set_rotation(0.5, true).await;

        let mail = scheduler.settings(Mode::Mail).await;
        assert_eq!(mail.speed, SpeedPolicy::Smart);
        assert!(mail.auto);
        assert!(mail.blacklist.contains("spam-1"));
        assert!(mail.photo_only);
        assert!(mail.disabled_categories.contains(&Category::Favorites));

        let chat = scheduler.settings(Mode::Chat).await;
        assert_eq!(chat.rotation_hours, 0.5);
        assert!(chat.cyclic);
        assert!(!chat.photo_only);
    }

    #[tokio::test]
    async fn reset_campaign_forgets_contacts_and_retries() {
        let harness = Harness::new();
        let scheduler = scheduler(&harness);
        let before = {
            let mut campaign = scheduler.mode_state(Mode::Mail).campaign.lock().await;
            campaign.contacted.insert("A".to_string());
            campaign.retries.enqueue(Recipient::with_id("B"));
            campaign.exhausted.insert("C".to_string());
            campaign.id
        };
        scheduler.mode_state(Mode::Mail).counters.lock().await.waiting = 1;

        scheduler.reset_campaign(Mode::Mail).await;

        let campaign = scheduler.mode_state(Mode::Mail).campaign.lock().await;
        assert!(campaign.contacted.is_empty());
        assert!(campaign.retries.is_empty());
        assert!(campaign.exhausted.is_empty());
        assert_ne!(campaign.id, before);
        drop(campaign);
        assert_eq!(scheduler.counters(Mode::Mail).await.waiting, 0);
    }
}
