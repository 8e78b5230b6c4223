//! Resolve a source channel to its active destination links.
//!
//! Resolution is cache-aside over a TTL'd key-value cache: a miss falls
//! through to the link store and repopulates the cache; the cache is an
//! optimization, never a source of truth. Every administrative write deletes
//! the affected scope keys after the store write commits and before the call
//! returns, so no reader observes an entry older than the latest committed
//! write for the same scope.

pub mod admin;
pub mod cache;
pub mod error;
pub mod memory;
pub mod resolve;
pub mod store;
pub mod types;

pub use {
    cache::{MemoryCache, RoutingCache},
    error::{Error, Result},
    memory::MemoryLinkStore,
    resolve::Resolver,
    store::{LinkStore, NewKey, NewLink},
    types::{ChannelKey, RoutingLink, Scope, SourceChannel},
};
