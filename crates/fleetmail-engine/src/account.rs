use fleetmail_protocol::model::{AccountId, Mode, Settings};
use serde::Deserialize;
use std::fmt;

#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub display_id: String,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    pub mail: Settings,
    pub chat: Settings,
}

impl AccountSettings {
    pub fn for_mode(&self, mode: Mode) -> &Settings {
        match mode {
            Mode::Mail => &self.mail,
            Mode::Chat => &self.chat,
        }
    }
}
