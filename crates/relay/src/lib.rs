//! Relay pipeline between ingestion and delivery.
//!
//! A durable queue decouples the two halves: the producer normalizes source
//! events into immutable payloads and publishes them; the consumer resolves
//! each payload's routing links, fans out to every destination with isolated
//! failure, and acknowledges only after a complete dispatch attempt.

pub mod config;
pub mod consume;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod produce;
pub mod queue;

pub use {
    config::RelayConfig,
    consume::Consumer,
    dispatch::Dispatcher,
    envelope::{PostEnvelope, WIRE_VERSION},
    error::{Error, Result},
    produce::{Producer, SourceAttachment, SourceChannelKind, SourceEvent, build_post},
    queue::{Delivery, MemoryQueue, PostQueue},
};
