//! Durable post queue port and an in-process implementation.
//!
//! The contract mirrors a broker's single named durable queue: persistent
//! JSON messages, per-delivery tags, acknowledgment after processing, and
//! redelivery of unacked messages when the consumer connection is
//! re-established. The broker client itself is an external collaborator;
//! [`MemoryQueue`] stands in for it in-process and in tests.

use std::collections::{HashMap, VecDeque};

use {
    async_trait::async_trait,
    tokio::sync::{Mutex, Notify},
};

use crate::error::{Error, Result};

/// A message handed to the consumer. Must be acked after a complete dispatch
/// attempt; dropping it unacked leaves it for redelivery.
#[derive(Debug)]
pub struct Delivery {
    pub tag: u64,
    pub body: Vec<u8>,
}

/// Queue port shared by producer and consumer.
#[async_trait]
pub trait PostQueue: Send + Sync {
    async fn publish(&self, body: Vec<u8>) -> Result<()>;

    /// Next delivery, or `None` once the queue is closed.
    async fn next(&self) -> Result<Option<Delivery>>;

    /// Acknowledge a delivery. Unknown tags are ignored (a broker ack is
    /// idempotent from the consumer's point of view).
    async fn ack(&self, tag: u64) -> Result<()>;
}

#[derive(Default)]
struct State {
    ready: VecDeque<Vec<u8>>,
    unacked: HashMap<u64, Vec<u8>>,
    next_tag: u64,
    closed: bool,
}

/// FIFO in-process queue with broker-like unacked tracking.
#[derive(Default)]
pub struct MemoryQueue {
    state: Mutex<State>,
    notify: Notify,
}

impl MemoryQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-queue every unacked delivery, oldest first — what a broker does
    /// when a consumer connection drops without acking.
    pub async fn recover(&self) {
        let mut state = self.state.lock().await;
        let mut tags: Vec<u64> = state.unacked.keys().copied().collect();
        tags.sort_unstable();
        for tag in tags.into_iter().rev() {
            if let Some(body) = state.unacked.remove(&tag) {
                state.ready.push_front(body);
            }
        }
        drop(state);
        self.notify.notify_waiters();
    }

    /// Close the queue; pending and future `next` calls observe end-of-stream.
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
        self.notify.notify_waiters();
    }

    /// Messages waiting for delivery (not counting unacked ones).
    pub async fn depth(&self) -> usize {
        self.state.lock().await.ready.len()
    }

    /// Deliveries handed out but not yet acked.
    pub async fn unacked(&self) -> usize {
        self.state.lock().await.unacked.len()
    }
}

#[async_trait]
impl PostQueue for MemoryQueue {
    async fn publish(&self, body: Vec<u8>) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(Error::queue("queue is closed"));
            }
            state.ready.push_back(body);
        }
        self.notify.notify_one();
        Ok(())
    }

    async fn next(&self) -> Result<Option<Delivery>> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().await;
                if let Some(body) = state.ready.pop_front() {
                    state.next_tag += 1;
                    let tag = state.next_tag;
                    state.unacked.insert(tag, body.clone());
                    return Ok(Some(Delivery { tag, body }));
                }
                if state.closed {
                    return Ok(None);
                }
            }
            notified.await;
        }
    }

    async fn ack(&self, tag: u64) -> Result<()> {
        self.state.lock().await.unacked.remove(&tag);
        Ok(())
    }
}
