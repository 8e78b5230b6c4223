//! Administrative mutations with invalidate-on-write.
//!
//! Every operation commits the store write, then deletes the affected cache
//! entries, then returns. Callers acknowledging an admin action after one of
//! these returns can therefore never leave a stale cache entry behind.

use rand::RngCore;

use discast_common::DisplayFlags;

use crate::{
    error::{Error, Result},
    resolve::Resolver,
    store::{NewKey, NewLink},
    types::{ChannelKey, RoutingLink, SourceChannel},
};

/// Key tokens are 8 random bytes, hex-encoded.
pub const KEY_TOKEN_LEN: usize = 16;

const MIN_DESCRIPTION_LEN: usize = 2;
const MAX_DESCRIPTION_LEN: usize = 40;

impl Resolver {
    /// Link a source channel to the destination identified by `token`.
    pub async fn create_link(
        &self,
        source: SourceChannel,
        token: &str,
        flags: DisplayFlags,
    ) -> Result<RoutingLink> {
        if token.len() != KEY_TOKEN_LEN {
            return Err(Error::invalid_input(format!(
                "key token must be {KEY_TOKEN_LEN} characters"
            )));
        }
        let key = self
            .store()
            .find_key(token)
            .await?
            .ok_or_else(|| Error::not_found("no key with that token"))?;
        let link = self
            .store()
            .create_link(NewLink {
                source,
                key_id: key.id,
                flags,
                rewrite_prompt: None,
            })
            .await?;
        self.invalidate_source(&link.source).await?;
        Ok(link)
    }

    /// Replace a link's display flags.
    pub async fn set_flags(&self, link_id: i64, flags: DisplayFlags) -> Result<RoutingLink> {
        let link = self.store().update_flags(link_id, flags).await?;
        self.invalidate_source(&link.source).await?;
        Ok(link)
    }

    /// Set or clear a link's rewrite directive.
    pub async fn set_rewrite_prompt(
        &self,
        link_id: i64,
        prompt: Option<String>,
    ) -> Result<RoutingLink> {
        let link = self.store().set_rewrite_prompt(link_id, prompt).await?;
        self.invalidate_source(&link.source).await?;
        Ok(link)
    }

    /// Remove a link.
    pub async fn delete_link(&self, link_id: i64) -> Result<()> {
        let link = self.store().delete_link(link_id).await?;
        self.invalidate_source(&link.source).await?;
        Ok(())
    }

    /// Create a destination key for a target chat. The generated token is the
    /// credential handed to source-side administrators.
    pub async fn create_key(&self, chat_id: i64, description: &str) -> Result<ChannelKey> {
        let len = description.chars().count();
        if !(MIN_DESCRIPTION_LEN..=MAX_DESCRIPTION_LEN).contains(&len) {
            return Err(Error::invalid_input(format!(
                "description must be {MIN_DESCRIPTION_LEN}-{MAX_DESCRIPTION_LEN} characters"
            )));
        }
        self.store()
            .create_key(NewKey {
                token: generate_token(),
                chat_id,
                description: description.to_string(),
            })
            .await
    }

    /// Revoke a key and every link using it.
    pub async fn revoke_key(&self, key_id: i64) -> Result<()> {
        let removed = self.store().delete_key(key_id).await?;
        let mut keys: Vec<String> = removed
            .iter()
            .flat_map(|link| link.source.scope_keys())
            .collect();
        keys.sort_unstable();
        keys.dedup();
        if !keys.is_empty() {
            self.cache_delete(&keys).await?;
        }
        Ok(())
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; KEY_TOKEN_LEN / 2];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use {
        super::*,
        crate::{cache::MemoryCache, memory::MemoryLinkStore, types::Scope},
    };

    fn resolver() -> Resolver {
        Resolver::new(
            Arc::new(MemoryLinkStore::new()),
            Arc::new(MemoryCache::new()),
        )
    }

    fn source() -> SourceChannel {
        SourceChannel {
            guild_id: "g1".into(),
            channel_id: "c1".into(),
            name: "news".into(),
        }
    }

    #[tokio::test]
    async fn generated_tokens_are_hex_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), KEY_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn create_link_requires_existing_key() {
        let resolver = resolver();
        let err = resolver
            .create_link(source(), &"0".repeat(KEY_TOKEN_LEN), DisplayFlags::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn key_description_is_validated() {
        let resolver = resolver();
        assert!(resolver.create_key(-1, "x").await.is_err());
        assert!(resolver.create_key(-1, &"y".repeat(41)).await.is_err());
        assert!(resolver.create_key(-1, "team news").await.is_ok());
    }

    #[tokio::test]
    async fn flag_update_is_visible_immediately() {
        let resolver = resolver();
        let key = resolver.create_key(-100, "team news").await.unwrap();
        let link = resolver
            .create_link(source(), &key.token, DisplayFlags::default())
            .await
            .unwrap();
        let scope = Scope::Channel("c1".into());

        // Prime the cache with the old flags.
        let cached = resolver.resolve(&scope).await.unwrap();
        assert!(!cached[0].flags.with_source);

        resolver
            .set_flags(
                link.id,
                DisplayFlags {
                    with_source: true,
                    ..DisplayFlags::default()
                },
            )
            .await
            .unwrap();

        // No stale read: the mutation invalidated before returning.
        let fresh = resolver.resolve(&scope).await.unwrap();
        assert!(fresh[0].flags.with_source);
    }

    #[tokio::test]
    async fn delete_link_invalidates_guild_scope_too() {
        let resolver = resolver();
        let key = resolver.create_key(-100, "team news").await.unwrap();
        resolver
            .create_link(source(), &key.token, DisplayFlags::default())
            .await
            .unwrap();
        let guild_scope = Scope::Guild("g1".into());

        let before = resolver.resolve(&guild_scope).await.unwrap();
        assert_eq!(before.len(), 1);

        let link_id = before[0].id;
        resolver.delete_link(link_id).await.unwrap();

        let after = resolver.resolve(&guild_scope).await.unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn revoke_key_clears_every_affected_scope() {
        let resolver = resolver();
        let key = resolver.create_key(-100, "team news").await.unwrap();
        resolver
            .create_link(source(), &key.token, DisplayFlags::default())
            .await
            .unwrap();
        let other = SourceChannel {
            channel_id: "c2".into(),
            ..source()
        };
        resolver
            .create_link(other, &key.token, DisplayFlags::default())
            .await
            .unwrap();

        resolver.resolve(&Scope::Channel("c1".into())).await.unwrap();
        resolver.resolve(&Scope::Channel("c2".into())).await.unwrap();

        resolver.revoke_key(key.id).await.unwrap();

        assert!(
            resolver
                .resolve(&Scope::Channel("c1".into()))
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            resolver
                .resolve(&Scope::Channel("c2".into()))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
