use async_trait::async_trait;

use discast_common::DisplayFlags;

use crate::{
    error::Result,
    types::{ChannelKey, RoutingLink, Scope, SourceChannel},
};

/// Input for creating a link between a source channel and a key record.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub source: SourceChannel,
    pub key_id: i64,
    pub flags: DisplayFlags,
    pub rewrite_prompt: Option<String>,
}

/// Input for creating a destination key record.
#[derive(Debug, Clone)]
pub struct NewKey {
    pub token: String,
    pub chat_id: i64,
    pub description: String,
}

/// Persistent link/key storage port.
///
/// The relay only consumes read results; mutations come from the
/// administrative layer and must be followed by cache invalidation (see
/// [`crate::Resolver`]'s admin operations, which enforce the ordering).
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Active links under a scope, ordered by creation.
    async fn list_links(&self, scope: &Scope) -> Result<Vec<RoutingLink>>;

    /// Look up a key record by its unique token.
    async fn find_key(&self, token: &str) -> Result<Option<ChannelKey>>;

    async fn create_link(&self, link: NewLink) -> Result<RoutingLink>;

    async fn update_flags(&self, link_id: i64, flags: DisplayFlags) -> Result<RoutingLink>;

    async fn set_rewrite_prompt(
        &self,
        link_id: i64,
        prompt: Option<String>,
    ) -> Result<RoutingLink>;

    /// Delete a link; returns the deleted record so callers can invalidate
    /// its scopes.
    async fn delete_link(&self, link_id: i64) -> Result<RoutingLink>;

    async fn create_key(&self, key: NewKey) -> Result<ChannelKey>;

    /// Delete a key and every link that hangs off it; returns the removed
    /// links so callers can invalidate their scopes.
    async fn delete_key(&self, key_id: i64) -> Result<Vec<RoutingLink>>;
}
