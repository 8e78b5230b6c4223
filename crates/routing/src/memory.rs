use std::sync::Mutex;

use async_trait::async_trait;

use discast_common::DisplayFlags;

use crate::{
    error::{Error, Result},
    store::{LinkStore, NewKey, NewLink},
    types::{ChannelKey, RoutingLink, Scope},
};

/// In-memory [`LinkStore`] for tests and single-process embedding.
///
/// Key records are embedded (joined) into the links that reference them, the
/// same shape a relational backend returns from its join.
#[derive(Default)]
pub struct MemoryLinkStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    links: Vec<RoutingLink>,
    keys: Vec<ChannelKey>,
    next_link_id: i64,
    next_key_id: i64,
}

impl MemoryLinkStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn list_links(&self, scope: &Scope) -> Result<Vec<RoutingLink>> {
        let inner = self.lock();
        let links = inner
            .links
            .iter()
            .filter(|link| match scope {
                Scope::Guild(id) => link.source.guild_id == *id,
                Scope::Channel(id) => link.source.channel_id == *id,
            })
            .cloned()
            .collect();
        Ok(links)
    }

    async fn find_key(&self, token: &str) -> Result<Option<ChannelKey>> {
        let inner = self.lock();
        Ok(inner.keys.iter().find(|key| key.token == token).cloned())
    }

    async fn create_link(&self, link: NewLink) -> Result<RoutingLink> {
        let mut inner = self.lock();
        let key = inner
            .keys
            .iter()
            .find(|key| key.id == link.key_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("key {}", link.key_id)))?;
        inner.next_link_id += 1;
        let record = RoutingLink {
            id: inner.next_link_id,
            source: link.source,
            key,
            flags: link.flags,
            rewrite_prompt: link.rewrite_prompt,
        };
        inner.links.push(record.clone());
        Ok(record)
    }

    async fn update_flags(&self, link_id: i64, flags: DisplayFlags) -> Result<RoutingLink> {
        let mut inner = self.lock();
        let link = inner
            .links
            .iter_mut()
            .find(|link| link.id == link_id)
            .ok_or_else(|| Error::not_found(format!("link {link_id}")))?;
        link.flags = flags;
        Ok(link.clone())
    }

    async fn set_rewrite_prompt(
        &self,
        link_id: i64,
        prompt: Option<String>,
    ) -> Result<RoutingLink> {
        let mut inner = self.lock();
        let link = inner
            .links
            .iter_mut()
            .find(|link| link.id == link_id)
            .ok_or_else(|| Error::not_found(format!("link {link_id}")))?;
        link.rewrite_prompt = prompt;
        Ok(link.clone())
    }

    async fn delete_link(&self, link_id: i64) -> Result<RoutingLink> {
        let mut inner = self.lock();
        let index = inner
            .links
            .iter()
            .position(|link| link.id == link_id)
            .ok_or_else(|| Error::not_found(format!("link {link_id}")))?;
        Ok(inner.links.remove(index))
    }

    async fn create_key(&self, key: NewKey) -> Result<ChannelKey> {
        let mut inner = self.lock();
        if inner.keys.iter().any(|existing| existing.token == key.token) {
            return Err(Error::invalid_input("key token already exists"));
        }
        inner.next_key_id += 1;
        let record = ChannelKey {
            id: inner.next_key_id,
            token: key.token,
            chat_id: key.chat_id,
            description: key.description,
        };
        inner.keys.push(record.clone());
        Ok(record)
    }

    async fn delete_key(&self, key_id: i64) -> Result<Vec<RoutingLink>> {
        let mut inner = self.lock();
        let index = inner
            .keys
            .iter()
            .position(|key| key.id == key_id)
            .ok_or_else(|| Error::not_found(format!("key {key_id}")))?;
        inner.keys.remove(index);

        let (removed, kept): (Vec<_>, Vec<_>) = inner
            .links
            .drain(..)
            .partition(|link| link.key.id == key_id);
        inner.links = kept;
        Ok(removed)
    }
}
