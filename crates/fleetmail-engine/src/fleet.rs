use crate::{
    account::{Account, AccountSettings},
    context::EngineContext,
    logging,
    platform::PlatformError,
    scheduler::{AccountScheduler, ModeSnapshot, StartError, StopReason},
};
use fleetmail_protocol::{
    events::HeartbeatEvent,
    model::{AccountId, Mode},
};
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("account {0} is already registered")]
    AlreadyRegistered(AccountId),
    #[error("account {0} is not registered")]
    UnknownAccount(AccountId),
    #[error("login failed for account {account_id}: {source}")]
    Login {
        account_id: AccountId,
        source: PlatformError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub account_id: AccountId,
    pub display_id: String,
    pub mail: ModeSnapshot,
    pub chat: ModeSnapshot,
}

/// Registry of logged-in accounts and the single handle for fleet-wide stops.
pub struct Fleet {
    ctx: Arc<EngineContext>,
    accounts: RwLock<HashMap<AccountId, Arc<AccountScheduler>>>,
}

impl Fleet {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self {
            ctx,
            accounts: RwLock::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    /// Logs in against the platform and registers the account on success.
    pub async fn login(
        &self,
        account: Account,
        settings: AccountSettings,
    ) -> Result<Arc<AccountScheduler>, RegistryError> {
        if self.accounts.read().await.contains_key(&account.id) {
            return Err(RegistryError::AlreadyRegistered(account.id));
        }

        let token = match self.ctx.platform.login(&account.credentials).await {
            Ok(token) => token,
            Err(source) => {
                logging::log_login_failed(&account.id, &source);
                return Err(RegistryError::Login {
                    account_id: account.id,
                    source,
                });
            }
        };

        self.register_account(account, token, settings).await
    }

    pub async fn register_account(
        &self,
        account: Account,
        token: String,
        settings: AccountSettings,
    ) -> Result<Arc<AccountScheduler>, RegistryError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return Err(RegistryError::AlreadyRegistered(account.id));
        }

        let account_id = account.id.clone();
        let scheduler = Arc::new(AccountScheduler::new(
            account,
            token,
            settings,
            Arc::clone(&self.ctx),
        ));
        accounts.insert(account_id, Arc::clone(&scheduler));
        drop(accounts);

        logging::log_account_registered(scheduler.account());
        Ok(scheduler)
    }

    /// Stops both modes and drops the account from the registry.
    pub async fn remove_account(&self, account_id: &str) -> Result<(), RegistryError> {
        let removed = self.accounts.write().await.remove(account_id);
        let Some(scheduler) = removed else {
            return Err(RegistryError::UnknownAccount(account_id.to_string()));
        };

        let stopped = scheduler.stop_all(StopReason::AccountRemoved).await;
        logging::log_account_removed(account_id, stopped);
        Ok(())
    }

    pub async fn account(&self, account_id: &str) -> Option<Arc<AccountScheduler>> {
        self.accounts.read().await.get(account_id).cloned()
    }

    pub async fn account_ids(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self.accounts.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn schedulers(&self) -> Vec<Arc<AccountScheduler>> {
        self.accounts.read().await.values().cloned().collect()
    }

    pub async fn start(&self, account_id: &str, mode: Mode, template: &str) -> Result<(), StartError> {
        let scheduler = self
            .account(account_id)
            .await
            .ok_or(StartError::NotLoggedIn)?;
        scheduler.start(mode, template).await
    }

    pub async fn stop(&self, account_id: &str, mode: Mode) -> bool {
        match self.account(account_id).await {
            Some(scheduler) => scheduler.stop(mode, StopReason::Operator).await,
            None => false,
        }
    }

    /// Stops every running scheduler, both modes, across all accounts.
    pub async fn stop_all(&self, reason: StopReason) -> usize {
        let mut stopped = 0;
        for scheduler in self.schedulers().await {
            stopped += scheduler.stop_all(reason).await;
        }
        stopped
    }

    pub async fn stop_account(&self, account_id: &str, reason: StopReason) -> usize {
        match self.account(account_id).await {
            Some(scheduler) => scheduler.stop_all(reason).await,
            None => 0,
        }
    }

    pub async fn snapshot(&self, account_id: &str) -> Option<AccountSnapshot> {
        let scheduler = self.account(account_id).await?;
        let account = scheduler.account();

        Some(AccountSnapshot {
            account_id: account.id.clone(),
            display_id: account.display_id.clone(),
            mail: scheduler.snapshot(Mode::Mail).await,
            chat: scheduler.snapshot(Mode::Chat).await,
        })
    }

    pub async fn heartbeat(&self) -> HeartbeatEvent {
        let schedulers = self.schedulers().await;
        let mut event = HeartbeatEvent {
            accounts: schedulers.len(),
            mail_running: 0,
            chat_running: 0,
            sent: 0,
            errors: 0,
        };

        for scheduler in &schedulers {
            for mode in Mode::ALL {
                if scheduler.is_running(mode).await {
                    match mode {
                        Mode::Mail => event.mail_running += 1,
                        Mode::Chat => event.chat_running += 1,
                    }
                }
                let counters = scheduler.counters(mode).await;
                event.sent += counters.sent;
                event.errors += counters.errors;
            }
        }

        event
    }
}

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
