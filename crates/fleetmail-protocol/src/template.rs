use crate::model::Recipient;

pub const INVITE_SEPARATOR: &str = "__";

const NAME_FILLER: &str = "dear";
const CITY_FILLER: &str = "your city";
const COUNTRY_FILLER: &str = "your country";

/// Splits a chat template into its ordered invites.
///
/// Invites are separated by a standalone `__`, usually on a line of its own
/// between blank lines. A `__` glued to other text (`snake__case`, URLs) is
/// kept. Surrounding whitespace is trimmed and empty segments are dropped.
pub fn split_invites(text: &str) -> Vec<String> {
    let mut invites = Vec::new();
    let mut start = 0;

    for (at, _) in text.match_indices(INVITE_SEPARATOR) {
        let end = at + INVITE_SEPARATOR.len();
        let before = text[..at].chars().next_back();
        let after = text[end..].chars().next();
        if before.map_or(true, char::is_whitespace) && after.map_or(true, char::is_whitespace) {
            push_invite(&mut invites, &text[start..at]);
            start = end;
        }
    }
    push_invite(&mut invites, &text[start..]);

    invites
}

fn push_invite(invites: &mut Vec<String>, segment: &str) {
    let segment = segment.trim();
    if !segment.is_empty() {
        invites.push(segment.to_string());
    }
}

/// Substitutes recipient macros into a message template.
pub fn render(template: &str, recipient: &Recipient) -> String {
    let number = |value: Option<u32>| value.map(|v| v.to_string()).unwrap_or_default();
    let text = |value: &Option<String>, filler: &str| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(filler)
            .to_string()
    };

    let substitutions = [
        ("{name}", text(&recipient.name, NAME_FILLER)),
        ("{age}", number(recipient.age)),
        ("{city}", text(&recipient.city, CITY_FILLER)),
        ("{country}", text(&recipient.country, COUNTRY_FILLER)),
        ("{countryCode}", text(&recipient.country_code, "")),
        ("{accountId}", recipient.id.clone()),
        ("{birthday}", text(&recipient.birthday, "")),
        ("{ageFrom}", number(recipient.age_from)),
        ("{ageTo}", number(recipient.age_to)),
        ("{profilePhoto}", text(&recipient.photo_url, "")),
    ];

    substitutions
        .iter()
        .fold(template.to_string(), |acc, (macro_name, value)| {
            acc.replace(macro_name, value)
        })
}
