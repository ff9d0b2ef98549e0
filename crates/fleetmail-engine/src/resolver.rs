use crate::platform::{PlatformApi, PlatformError, Session};
use fleetmail_protocol::model::{Category, Mode, Recipient, RecipientId, Settings, Target};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Filtered pool for a live category; empty when the category is drained.
    Candidates(Vec<Recipient>),
    /// Next unsent entry of an explicit id list, with the cursor to store for the next call.
    Listed {
        recipient: Recipient,
        next_cursor: usize,
    },
    /// The explicit id list has nothing left at or after the cursor.
    ListExhausted,
}

/// Campaign state the resolver filters against.
#[derive(Debug, Clone, Copy)]
pub struct CampaignView<'a> {
    pub contacted: &'a HashSet<RecipientId>,
    pub id_cursor: usize,
}

pub async fn resolve(
    platform: &dyn PlatformApi,
    session: &Session,
    mode: Mode,
    settings: &Settings,
    campaign: CampaignView<'_>,
) -> Result<Resolution, PlatformError> {
    let category = match &settings.target {
        Target::IdList(ids) => return Ok(next_listed(ids, mode, settings, campaign)),
        Target::Category(category) => *category,
    };

    let pool = match category {
        Category::Inbox if mode == Mode::Mail => platform
            .list_inbox(session)
            .await?
            .into_iter()
            .filter(|message| !message.replied)
            .map(|message| message.into_reply_target())
            .collect(),
        Category::Inbox => Vec::new(),
        Category::Payers | Category::MyFavorite | Category::Favorites | Category::Online => {
            platform.list_recipients(session, mode, category).await?
        }
    };

    Ok(Resolution::Candidates(filter_candidates(
        pool,
        mode,
        settings,
        campaign.contacted,
    )))
}

pub fn filter_candidates(
    pool: Vec<Recipient>,
    mode: Mode,
    settings: &Settings,
    contacted: &HashSet<RecipientId>,
) -> Vec<Recipient> {
    let mut seen = HashSet::new();
    pool.into_iter()
        .filter(|recipient| is_eligible(recipient, mode, settings, contacted))
        .filter(|recipient| seen.insert(recipient.id.clone()))
        .collect()
}

fn is_eligible(
    recipient: &Recipient,
    mode: Mode,
    settings: &Settings,
    contacted: &HashSet<RecipientId>,
) -> bool {
    if recipient.id.is_empty()
        || contacted.contains(&recipient.id)
        || settings.blacklist.contains(&recipient.id)
    {
        return false;
    }

    !(mode == Mode::Mail && settings.photo_only && !recipient.has_photo())
}

fn next_listed(
    ids: &[RecipientId],
    mode: Mode,
    settings: &Settings,
    campaign: CampaignView<'_>,
) -> Resolution {
    // Listed ids carry no profile, so the photo filter cannot apply to them.
    let listed_settings = Settings {
        photo_only: false,
        ..settings.clone()
    };

    ids.iter()
        .enumerate()
        .skip(campaign.id_cursor)
        .map(|(position, id)| (position, Recipient::with_id(id.trim())))
        .find(|(_, recipient)| is_eligible(recipient, mode, &listed_settings, campaign.contacted))
        .map_or(Resolution::ListExhausted, |(position, recipient)| {
            Resolution::Listed {
                recipient,
                next_cursor: position + 1,
            }
        })
}
