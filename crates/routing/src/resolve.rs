use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    cache::{DEFAULT_TTL, RoutingCache},
    error::Result,
    store::LinkStore,
    types::{RoutingLink, Scope, SourceChannel},
};

/// Cache-aside resolver from a source scope to its active links.
pub struct Resolver {
    store: Arc<dyn LinkStore>,
    cache: Arc<dyn RoutingCache>,
    ttl: Duration,
}

impl Resolver {
    pub fn new(store: Arc<dyn LinkStore>, cache: Arc<dyn RoutingCache>) -> Self {
        Self::with_ttl(store, cache, DEFAULT_TTL)
    }

    pub fn with_ttl(
        store: Arc<dyn LinkStore>,
        cache: Arc<dyn RoutingCache>,
        ttl: Duration,
    ) -> Self {
        Self { store, cache, ttl }
    }

    pub(crate) fn store(&self) -> &dyn LinkStore {
        &*self.store
    }

    /// Resolve the ordered set of active links for a scope.
    ///
    /// Cache failures and corrupt entries degrade to a store read; a store
    /// failure propagates and the caller must not dispatch.
    pub async fn resolve(&self, scope: &Scope) -> Result<Vec<RoutingLink>> {
        let key = scope.cache_key();
        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<RoutingLink>>(&raw) {
                Ok(links) => {
                    debug!(key, links = links.len(), "routing cache hit");
                    return Ok(links);
                },
                Err(e) => {
                    warn!(key, error = %e, "corrupt routing cache entry, falling back to store");
                },
            },
            Ok(None) => {},
            Err(e) => {
                warn!(key, error = %e, "routing cache read failed, falling back to store");
            },
        }

        let links = self.store.list_links(scope).await?;
        match serde_json::to_string(&links) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(&key, &raw, self.ttl).await {
                    warn!(key, error = %e, "routing cache write failed");
                }
            },
            Err(e) => warn!(key, error = %e, "routing links not serializable for cache"),
        }
        debug!(key, links = links.len(), "routing resolved from store");
        Ok(links)
    }

    /// Drop the cache entry for a scope. The next `resolve` repopulates from
    /// the store.
    pub async fn invalidate(&self, scope: &Scope) -> Result<()> {
        self.cache.delete(&[scope.cache_key()]).await
    }

    /// Drop both scope entries (guild and channel) a link write touches.
    pub(crate) async fn invalidate_source(&self, source: &SourceChannel) -> Result<()> {
        self.cache.delete(&source.scope_keys()).await
    }

    pub(crate) async fn cache_delete(&self, keys: &[String]) -> Result<()> {
        self.cache.delete(keys).await
    }

    /// Flush the whole cache. Invoked on process start and clean shutdown.
    pub async fn flush_cache(&self) -> Result<()> {
        self.cache.flush().await
    }
}
