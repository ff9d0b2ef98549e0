use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};
use thiserror::Error;

pub type AccountId = String;
pub type RecipientId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Mail,
    Chat,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Mail, Mode::Chat];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Mail => "mail",
            Mode::Chat => "chat",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live recipient pools on the platform, declared in rotation priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Payers,
    MyFavorite,
    Favorites,
    Inbox,
    Online,
}

impl Category {
    pub const ROTATION_ORDER: [Category; 5] = [
        Category::Payers,
        Category::MyFavorite,
        Category::Favorites,
        Category::Inbox,
        Category::Online,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Payers => "payers",
            Category::MyFavorite => "my-favorite",
            Category::Favorites => "favorites",
            Category::Inbox => "inbox",
            Category::Online => "online",
        }
    }

    pub fn supports(self, mode: Mode) -> bool {
        !(self == Category::Inbox && mode == Mode::Chat)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    Category(Category),
    IdList(Vec<RecipientId>),
}

impl Target {
    pub fn category(&self) -> Option<Category> {
        match self {
            Target::Category(category) => Some(*category),
            Target::IdList(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Target::Category(category) => category.as_str(),
            Target::IdList(_) => "id-list",
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        Target::Category(Category::Online)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "SpeedRepr", into = "SpeedRepr")]
pub enum SpeedPolicy {
    #[default]
    Smart,
    FixedSecs(u64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SpeedRepr {
    Secs(u64),
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("speed must be \"smart\" or whole seconds, got {0:?}")]
pub struct InvalidSpeed(pub String);

impl TryFrom<SpeedRepr> for SpeedPolicy {
    type Error = InvalidSpeed;

    fn try_from(value: SpeedRepr) -> Result<Self, Self::Error> {
        match value {
            SpeedRepr::Secs(secs) => Ok(SpeedPolicy::FixedSecs(secs)),
            SpeedRepr::Named(name) => {
                let trimmed = name.trim();
                if trimmed.eq_ignore_ascii_case("smart") {
                    return Ok(SpeedPolicy::Smart);
                }
                trimmed
                    .parse::<u64>()
                    .map(SpeedPolicy::FixedSecs)
                    .map_err(|_| InvalidSpeed(name))
            }
        }
    }
}

impl From<SpeedPolicy> for SpeedRepr {
    fn from(value: SpeedPolicy) -> Self {
        match value {
            SpeedPolicy::Smart => SpeedRepr::Named("smart".to_string()),
            SpeedPolicy::FixedSecs(secs) => SpeedRepr::Secs(secs),
        }
    }
}

/// Operator-controlled knobs for one mode of one account.
///
/// `photo_only` only applies to mail; `rotation_hours`, `cyclic` and
/// `current_invite_index` only apply to chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub target: Target,
    pub speed: SpeedPolicy,
    pub blacklist: BTreeSet<RecipientId>,
    pub auto: bool,
    pub disabled_categories: BTreeSet<Category>,
    pub photo_only: bool,
    pub rotation_hours: f64,
    pub cyclic: bool,
    pub current_invite_index: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: Target::default(),
            speed: SpeedPolicy::Smart,
            blacklist: BTreeSet::new(),
            auto: false,
            disabled_categories: BTreeSet::new(),
            photo_only: false,
            rotation_hours: 24.0,
            cyclic: false,
            current_invite_index: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipient {
    pub id: RecipientId,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub birthday: Option<String>,
    pub age_from: Option<u32>,
    pub age_to: Option<u32>,
    pub photo_url: Option<String>,
    /// Inbound message this send answers, set for inbox pseudo-recipients.
    pub in_reply_to: Option<String>,
}

impl Recipient {
    pub fn with_id(id: impl Into<RecipientId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn has_photo(&self) -> bool {
        self.photo_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub id: String,
    pub sender: Recipient,
    #[serde(default)]
    pub replied: bool,
}

impl InboundMessage {
    pub fn into_reply_target(self) -> Recipient {
        Recipient {
            in_reply_to: Some(self.id),
            ..self.sender
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    PanicMode,
    BotDisabled,
    MailingDisabled,
}

impl Gate {
    pub fn as_str(self) -> &'static str {
        match self {
            Gate::PanicMode => "panic_mode",
            Gate::BotDisabled => "bot_disabled",
            Gate::MailingDisabled => "mailing_disabled",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fleet-wide switches published by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlStatus {
    pub panic_mode: bool,
    pub stop_spam: bool,
    pub bot_enabled: bool,
    pub per_account: BTreeMap<AccountId, bool>,
}

impl Default for ControlStatus {
    fn default() -> Self {
        Self {
            panic_mode: false,
            stop_spam: false,
            bot_enabled: true,
            per_account: BTreeMap::new(),
        }
    }
}

impl ControlStatus {
    pub fn mailing_enabled(&self, account_id: &str) -> bool {
        self.per_account.get(account_id).copied().unwrap_or(true)
    }

    pub fn closed_gate(&self, account_id: &str) -> Option<Gate> {
        if self.panic_mode {
            return Some(Gate::PanicMode);
        }
        if !self.bot_enabled {
            return Some(Gate::BotDisabled);
        }
        if !self.mailing_enabled(account_id) {
            return Some(Gate::MailingDisabled);
        }
        None
    }
}
