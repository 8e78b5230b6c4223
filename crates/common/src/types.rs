use serde::{Deserialize, Serialize};

// ── Media taxonomy ──────────────────────────────────────────────────────────

/// Closed media taxonomy for relayed attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Animation,
    Video,
    Photo,
    Document,
}

impl MediaKind {
    /// Fixed category order for outbound sends.
    pub const SEND_ORDER: [MediaKind; 4] = [
        MediaKind::Animation,
        MediaKind::Video,
        MediaKind::Photo,
        MediaKind::Document,
    ];

    /// Classify an attachment by its MIME type.
    ///
    /// Unknown or absent content types fall back to `Document`, which is the
    /// only category that survives arbitrary bytes on the target platform.
    #[must_use]
    pub fn from_mime(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return MediaKind::Document;
        };
        if content_type.contains("video") {
            return MediaKind::Video;
        }
        match content_type {
            "image/gif" => MediaKind::Animation,
            "image/png" | "image/jpeg" => MediaKind::Photo,
            _ => MediaKind::Document,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Animation => "animation",
            MediaKind::Video => "video",
            MediaKind::Photo => "photo",
            MediaKind::Document => "document",
        }
    }
}

/// Ordered source URLs per media category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSet {
    pub animation: Vec<String>,
    pub video: Vec<String>,
    pub photo: Vec<String>,
    pub document: Vec<String>,
}

impl MediaSet {
    pub fn push(&mut self, kind: MediaKind, url: String) {
        match kind {
            MediaKind::Animation => self.animation.push(url),
            MediaKind::Video => self.video.push(url),
            MediaKind::Photo => self.photo.push(url),
            MediaKind::Document => self.document.push(url),
        }
    }

    #[must_use]
    pub fn get(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Animation => &self.animation,
            MediaKind::Video => &self.video,
            MediaKind::Photo => &self.photo,
            MediaKind::Document => &self.document,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        MediaKind::SEND_ORDER
            .iter()
            .all(|kind| self.get(*kind).is_empty())
    }

    /// Non-empty categories in send order.
    #[must_use]
    pub fn batches(&self) -> Vec<(MediaKind, &[String])> {
        MediaKind::SEND_ORDER
            .iter()
            .filter_map(|kind| {
                let urls = self.get(*kind);
                (!urls.is_empty()).then_some((*kind, urls))
            })
            .collect()
    }
}

// ── Queue payload ───────────────────────────────────────────────────────────

/// Identity of the source channel a post originated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOrigin {
    pub guild_id: String,
    pub channel_id: String,
    /// Hashtag-ready channel label (e.g. `#news`), derived at ingestion.
    pub channel_label: String,
}

/// Display options attached to one routing link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayFlags {
    pub with_source: bool,
    pub with_hashtag: bool,
    pub with_mention: bool,
}

/// The unit of work placed on the relay queue. Immutable once enqueued.
///
/// `text` may be empty only when `media` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPayload {
    pub text: String,
    pub media: MediaSet,
    /// Canonical link back to the source message.
    pub message_url: String,
    pub origin: RouteOrigin,
}
