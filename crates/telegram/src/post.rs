//! Per-destination post delivery.

use std::{sync::Arc, time::Duration};

use tracing::info;

use discast_common::MediaSet;

use crate::{
    budget,
    continuations::Continuations,
    error::Result,
    media,
    send::TelegramSend,
};

/// A resolved delivery target: destination chat plus its rendered signature.
#[derive(Debug, Clone)]
pub struct Destination {
    pub chat_id: i64,
    pub signature: String,
}

/// Delivers one post to one destination: batched media when present,
/// budgeted text otherwise. Owns the continuation set for deferred tails.
pub struct PostDelivery {
    sender: Arc<dyn TelegramSend>,
    http: reqwest::Client,
    continuations: Continuations,
}

impl PostDelivery {
    #[must_use]
    pub fn new(sender: Arc<dyn TelegramSend>, continuation_delay: Duration) -> Self {
        let continuations = Continuations::new(Arc::clone(&sender), continuation_delay);
        Self {
            sender,
            http: reqwest::Client::new(),
            continuations,
        }
    }

    /// Deliver a post body (possibly rewritten per destination) and media.
    ///
    /// Media failures are contained per category inside the batcher; a text
    /// send failure propagates so the dispatcher can log the destination as
    /// failed.
    pub async fn deliver(&self, dest: &Destination, media: &MediaSet, text: &str) -> Result<()> {
        if media.is_empty() {
            self.send_text(dest, text).await?;
        } else {
            media::send_media(
                &*self.sender,
                &self.http,
                &self.continuations,
                dest.chat_id,
                media,
                text,
                &dest.signature,
            )
            .await;
        }
        Ok(())
    }

    async fn send_text(&self, dest: &Destination, text: &str) -> Result<()> {
        let budgeted = budget::budget(text, &dest.signature, false);
        self.sender
            .send_text(
                dest.chat_id,
                &budgeted.head,
                !discast_markup::has_links(&budgeted.head),
            )
            .await?;
        if let Some(tail) = budgeted.deferred_tail {
            self.continuations
                .schedule(dest.chat_id, tail, dest.signature.clone());
        }
        info!(
            chat_id = dest.chat_id,
            head_len = budgeted.head.len(),
            "text post delivered"
        );
        Ok(())
    }

    /// Deliver pending continuations immediately (graceful shutdown).
    pub async fn flush(&self) {
        self.continuations.flush().await;
    }

    /// Continuations still waiting on their timer.
    #[must_use]
    pub fn pending_continuations(&self) -> usize {
        self.continuations.pending_count()
    }
}
