use crate::account::{Account, AccountSettings, Credentials};
use clap::Parser;
use fleetmail_protocol::{
    config::EngineLimits,
    model::{AccountId, Mode},
};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashSet},
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_PLATFORM_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_CONTROL_URL: &str = "http://127.0.0.1:8081";
pub const DEFAULT_FLEET_FILE: &str = "fleet.json";
pub const DEFAULT_LOG_FILTER: &str = "fleetmail_engine=info";

#[derive(Debug, Clone, Parser)]
#[command(name = "fleetmail", version, about = "Per-account messaging scheduler")]
pub struct EngineArgs {
    #[arg(long, env = "FLEETMAIL_PLATFORM_URL", default_value = DEFAULT_PLATFORM_URL)]
    pub platform_url: String,
    #[arg(long, env = "FLEETMAIL_CONTROL_URL", default_value = DEFAULT_CONTROL_URL)]
    pub control_url: String,
    #[arg(long, env = "FLEETMAIL_TELEMETRY_URL")]
    pub telemetry_url: Option<String>,
    #[arg(long, env = "FLEETMAIL_FLEET_FILE", default_value = DEFAULT_FLEET_FILE)]
    pub fleet_file: PathBuf,
    #[arg(
        long,
        env = "FLEETMAIL_POLL_INTERVAL_SECS",
        default_value_t = EngineLimits::default().control_poll_interval_secs,
        value_parser = clap::value_parser!(u64).range(1..=3_600)
    )]
    pub poll_interval_secs: u64,
    #[arg(
        long,
        env = "FLEETMAIL_HEARTBEAT_INTERVAL_SECS",
        default_value_t = EngineLimits::default().heartbeat_interval_secs,
        value_parser = clap::value_parser!(u64).range(1..=86_400)
    )]
    pub heartbeat_interval_secs: u64,
    /// Activate trials without asking when an unpaid account is eligible.
    #[arg(long, env = "FLEETMAIL_ACCEPT_TRIALS")]
    pub accept_trials: bool,
    #[arg(long, env = "FLEETMAIL_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

impl EngineArgs {
    pub fn limits(&self) -> EngineLimits {
        EngineLimits {
            control_poll_interval_secs: self.poll_interval_secs,
            heartbeat_interval_secs: self.heartbeat_interval_secs,
            ..EngineLimits::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum FleetFileError {
    #[error("cannot read fleet file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("fleet file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("fleet file lists account {0} more than once")]
    DuplicateAccount(AccountId),
    #[error("fleet file has an account with an empty id")]
    EmptyAccountId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetEntry {
    pub id: AccountId,
    #[serde(default)]
    pub display_id: Option<String>,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default)]
    pub settings: AccountSettings,
    /// Templates for modes that start right after login.
    #[serde(default)]
    pub autostart: BTreeMap<Mode, String>,
}

impl FleetEntry {
    pub fn account(&self) -> Account {
        Account {
            id: self.id.clone(),
            display_id: self.display_id.clone().unwrap_or_else(|| self.id.clone()),
            credentials: self.credentials.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FleetFile {
    pub accounts: Vec<FleetEntry>,
}

impl FleetFile {
    pub fn from_json(raw: &str) -> Result<Self, FleetFileError> {
        let file: FleetFile = serde_json::from_str(raw)?;

        let mut seen = HashSet::new();
        for entry in &file.accounts {
            if entry.id.trim().is_empty() {
                return Err(FleetFileError::EmptyAccountId);
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(FleetFileError::DuplicateAccount(entry.id.clone()));
            }
        }

        Ok(file)
    }

    pub fn load(path: &Path) -> Result<Self, FleetFileError> {
        let raw = fs::read_to_string(path).map_err(|source| FleetFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }
}
