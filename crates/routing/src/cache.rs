use std::{collections::HashMap, time::Duration};

use {
    async_trait::async_trait,
    tokio::{sync::RwLock, time::Instant},
};

use crate::error::Result;

/// Default lifetime for resolver cache entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Key-value cache port used by the resolver.
///
/// A TTL applies on every write. Concurrent readers and writers are not
/// coordinated beyond the backend's own atomicity; authoritative writes go
/// through [`RoutingCache::delete`], never through an update in place.
#[async_trait]
pub trait RoutingCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Delete every listed key. Missing keys are not an error.
    async fn delete(&self, keys: &[String]) -> Result<()>;

    /// Drop every entry. Invoked on process start and clean shutdown.
    async fn flush(&self) -> Result<()>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process TTL cache backing the resolver when no external cache is
/// wired in, and standing in for one in tests.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoutingCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
