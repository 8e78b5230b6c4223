//! Tracked deferred continuation sends.
//!
//! The overflow tail of a budgeted message is delivered after a fixed delay
//! as an independent plain-text message. Tails are not fire-and-forget:
//! every pending tail is recorded here so a graceful shutdown can flush them
//! immediately instead of dropping whatever a timer had not fired yet.
//! Nothing is persisted; a hard kill still loses pending tails.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tracing::{debug, warn};

use crate::{budget, send::TelegramSend};

/// Default delay before a continuation is sent.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);

struct Pending {
    chat_id: i64,
    text: String,
    signature: String,
}

struct Inner {
    sender: Arc<dyn TelegramSend>,
    delay: Duration,
    pending: Mutex<HashMap<u64, Pending>>,
    seq: AtomicU64,
}

/// Owned set of deferred continuation records and their timers.
#[derive(Clone)]
pub struct Continuations {
    inner: Arc<Inner>,
}

impl Continuations {
    #[must_use]
    pub fn new(sender: Arc<dyn TelegramSend>, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                sender,
                delay,
                pending: Mutex::new(HashMap::new()),
                seq: AtomicU64::new(0),
            }),
        }
    }

    /// Schedule `text` for delivery to `chat_id` after the configured delay.
    ///
    /// The continuation is budgeted like any other plain-text message when
    /// it fires; if it overflows again, its own tail is scheduled the same
    /// way.
    pub fn schedule(&self, chat_id: i64, text: String, signature: String) {
        Inner::schedule(
            Arc::clone(&self.inner),
            Pending {
                chat_id,
                text,
                signature,
            },
        );
    }

    /// Deliver every pending continuation immediately, without further
    /// delays. The graceful-shutdown path.
    pub async fn flush(&self) {
        let drained: Vec<Pending> = {
            let mut pending = self.inner.lock_pending();
            pending.drain().map(|(_, record)| record).collect()
        };
        for mut record in drained {
            loop {
                let budgeted = budget::budget(&record.text, &record.signature, false);
                if Inner::send_head(&*self.inner.sender, record.chat_id, &budgeted.head)
                    .await
                    .is_err()
                {
                    break;
                }
                match budgeted.deferred_tail {
                    Some(tail) => record.text = tail,
                    None => break,
                }
            }
        }
    }

    /// Number of continuations still waiting on their timer.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.lock_pending().len()
    }
}

impl Inner {
    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Pending>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn schedule(inner: Arc<Inner>, record: Pending) {
        let id = inner.seq.fetch_add(1, Ordering::Relaxed);
        debug!(chat_id = record.chat_id, len = record.text.len(), "continuation scheduled");
        inner.lock_pending().insert(id, record);

        let task_inner = Arc::clone(&inner);
        tokio::spawn(async move {
            tokio::time::sleep(task_inner.delay).await;
            // Already flushed? Then the record is gone and there is nothing
            // left to send.
            let Some(record) = task_inner.lock_pending().remove(&id) else {
                return;
            };

            let budgeted = budget::budget(&record.text, &record.signature, false);
            if Inner::send_head(&*task_inner.sender, record.chat_id, &budgeted.head)
                .await
                .is_err()
            {
                return;
            }
            if let Some(tail) = budgeted.deferred_tail {
                Inner::schedule(
                    Arc::clone(&task_inner),
                    Pending {
                        chat_id: record.chat_id,
                        text: tail,
                        signature: record.signature,
                    },
                );
            }
        });
    }

    async fn send_head(
        sender: &dyn TelegramSend,
        chat_id: i64,
        head: &str,
    ) -> crate::error::Result<()> {
        let result = sender
            .send_text(chat_id, head, !discast_markup::has_links(head))
            .await;
        if let Err(ref e) = result {
            // No retry: continuations are best-effort by design.
            warn!(chat_id, error = %e, "continuation send failed");
        }
        result
    }
}
