use serde::{Deserialize, Serialize};

use discast_common::DisplayFlags;

/// Resolution granularity: a whole source guild or a single source channel.
///
/// Doubles as the cache-key scheme (`{namespace}:{scope id}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Guild(String),
    Channel(String),
}

impl Scope {
    #[must_use]
    pub fn cache_key(&self) -> String {
        match self {
            Scope::Guild(id) => format!("guild_links:{id}"),
            Scope::Channel(id) => format!("channel_links:{id}"),
        }
    }
}

/// The source side of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceChannel {
    pub guild_id: String,
    pub channel_id: String,
    pub name: String,
}

impl SourceChannel {
    /// Both cache keys a write to this channel invalidates.
    #[must_use]
    pub(crate) fn scope_keys(&self) -> [String; 2] {
        [
            Scope::Guild(self.guild_id.clone()).cache_key(),
            Scope::Channel(self.channel_id.clone()).cache_key(),
        ]
    }
}

/// A destination key record: grants posting access to one target channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelKey {
    pub id: i64,
    /// Unique 16-hex-char token handed to the source-side administrator.
    pub token: String,
    /// Target platform chat the key posts to.
    pub chat_id: i64,
    pub description: String,
}

/// One source-channel ↔ destination-channel connection, with the joined key
/// record and per-link display options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingLink {
    pub id: i64,
    pub source: SourceChannel,
    pub key: ChannelKey,
    pub flags: DisplayFlags,
    /// Directive for the per-destination rewrite service, when set.
    pub rewrite_prompt: Option<String>,
}
