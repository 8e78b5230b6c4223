use serde::{Deserialize, Serialize};

use discast_rewrite::RewriteConfig;

/// Relay configuration. The host process loads it (env, file — its choice);
/// defaults mirror the platform constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Name of the durable queue shared by producer and consumer.
    pub queue_name: String,

    /// Lifetime of resolver cache entries, in seconds.
    pub cache_ttl_secs: u64,

    /// Delay before an over-length continuation is sent, in seconds.
    pub continuation_delay_secs: u64,

    /// Credit line appended when a link enables `with_mention`.
    pub credit: Option<String>,

    /// Rewrite service settings; absent means pass-through.
    pub rewrite: Option<RewriteConfig>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            queue_name: "discast.posts".into(),
            cache_ttl_secs: 60 * 60,
            continuation_delay_secs: 10,
            credit: None,
            rewrite: None,
        }
    }
}

impl RelayConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn continuation_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.continuation_delay_secs)
    }
}
