//! Render the footer appended to relayed messages.

use discast_common::DisplayFlags;

/// Joins the enabled signature fragments.
const SEPARATOR: &str = " | ";

/// Render a link's signature from its display flags.
///
/// Fragments in order: source link, origin hashtag, promotional credit.
/// Returns an empty string when nothing is enabled, in which case no footer
/// is appended at all.
#[must_use]
pub fn render(
    flags: &DisplayFlags,
    message_url: &str,
    channel_label: &str,
    credit: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    if flags.with_source {
        parts.push(format!("<a href=\"{message_url}\">Source</a>"));
    }
    if flags.with_hashtag {
        parts.push(channel_label.to_string());
    }
    if flags.with_mention
        && let Some(credit) = credit
    {
        parts.push(credit.to_string());
    }
    parts.join(SEPARATOR)
}
