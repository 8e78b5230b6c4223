//! Ingestion side: normalize source events and publish them.

use std::sync::Arc;

use {
    chrono::{DateTime, Utc},
    tracing::info,
};

use discast_common::{MediaKind, MediaSet, PostPayload, RouteOrigin};

use crate::{envelope::PostEnvelope, error::Result, queue::PostQueue};

/// Where in the source platform a channel sits. Drives the hashtag label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceChannelKind {
    Text,
    Announcement,
    PublicThread,
    PrivateThread,
    Other,
}

/// One attachment as the source platform reports it.
#[derive(Debug, Clone)]
pub struct SourceAttachment {
    pub url: String,
    pub content_type: Option<String>,
}

/// Raw inbound event from the source platform, before normalization.
#[derive(Debug, Clone)]
pub struct SourceEvent {
    pub text: String,
    /// Display names mentioned in the text.
    pub mentions: Vec<String>,
    pub attachments: Vec<SourceAttachment>,
    /// Canonical link to the message (or to the message it replies to).
    pub message_url: String,
    pub guild_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_kind: SourceChannelKind,
}

impl SourceEvent {
    /// Hashtag-ready label: `#name` with dashes removed for channels that
    /// have a usable name, `#other` for everything else.
    #[must_use]
    pub fn channel_label(&self) -> String {
        match self.channel_kind {
            SourceChannelKind::Other => "#other".to_string(),
            _ => format!("#{}", self.channel_name.replace('-', "")),
        }
    }
}

/// Build the immutable queue payload from a raw source event.
#[must_use]
pub fn build_post(event: &SourceEvent, now: DateTime<Utc>) -> PostPayload {
    let text = discast_markup::normalize(&event.text, &event.mentions, now);
    let mut media = MediaSet::default();
    for attachment in &event.attachments {
        media.push(
            MediaKind::from_mime(attachment.content_type.as_deref()),
            attachment.url.clone(),
        );
    }
    PostPayload {
        text,
        media,
        message_url: event.message_url.clone(),
        origin: RouteOrigin {
            guild_id: event.guild_id.clone(),
            channel_id: event.channel_id.clone(),
            channel_label: event.channel_label(),
        },
    }
}

/// Durable producer: envelope, serialize, publish.
pub struct Producer {
    queue: Arc<dyn PostQueue>,
}

impl Producer {
    pub fn new(queue: Arc<dyn PostQueue>) -> Self {
        Self { queue }
    }

    /// Normalize a source event and enqueue it.
    pub async fn publish(&self, event: &SourceEvent) -> Result<()> {
        self.publish_post(build_post(event, Utc::now())).await
    }

    /// Enqueue an already-built payload.
    pub async fn publish_post(&self, post: PostPayload) -> Result<()> {
        let channel = post.origin.channel_id.clone();
        let body = PostEnvelope::new(post).encode()?;
        self.queue.publish(body).await?;
        info!(channel, "post published to relay queue");
        Ok(())
    }
}
