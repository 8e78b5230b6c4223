//! Recording sender for tests.
//!
//! Available in regular builds so integration tests in dependent crates can
//! drive the whole pipeline without touching the network.

use std::sync::Mutex;

use async_trait::async_trait;

use discast_common::MediaKind;

use crate::{
    error::{Error, Result},
    send::{GroupItem, MediaSource, TelegramSend},
};

/// One recorded send.
#[derive(Debug, Clone)]
pub enum SentCall {
    Text {
        chat_id: i64,
        html: String,
        disable_preview: bool,
    },
    Group {
        chat_id: i64,
        items: Vec<GroupItem>,
    },
    Single {
        chat_id: i64,
        kind: MediaKind,
        source: MediaSource,
        caption: Option<String>,
    },
}

/// Records every call; optionally fails selected operations.
#[derive(Default)]
pub struct MockSender {
    calls: Mutex<Vec<SentCall>>,
    fail_video_groups: bool,
    fail_chats: Vec<i64>,
}

impl MockSender {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every grouped send whose items are videos fails, driving the
    /// per-item fallback path.
    #[must_use]
    pub fn failing_video_groups() -> Self {
        Self {
            fail_video_groups: true,
            ..Self::default()
        }
    }

    /// Every send to one of `chats` fails.
    #[must_use]
    pub fn failing_for_chats(chats: Vec<i64>) -> Self {
        Self {
            fail_chats: chats,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SentCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Recorded sends to one chat, in order.
    pub fn calls_for(&self, chat_id: i64) -> Vec<SentCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                SentCall::Text { chat_id: id, .. }
                | SentCall::Group { chat_id: id, .. }
                | SentCall::Single { chat_id: id, .. } => *id == chat_id,
            })
            .collect()
    }

    fn record(&self, call: SentCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn check_chat(&self, chat_id: i64) -> Result<()> {
        if self.fail_chats.contains(&chat_id) {
            return Err(Error::message(format!("mock failure for chat {chat_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl TelegramSend for MockSender {
    async fn send_text(&self, chat_id: i64, html: &str, disable_preview: bool) -> Result<()> {
        self.record(SentCall::Text {
            chat_id,
            html: html.to_string(),
            disable_preview,
        });
        self.check_chat(chat_id)
    }

    async fn send_media_group(&self, chat_id: i64, items: &[GroupItem]) -> Result<()> {
        self.record(SentCall::Group {
            chat_id,
            items: items.to_vec(),
        });
        self.check_chat(chat_id)?;
        if self.fail_video_groups && items.iter().all(|item| item.kind == MediaKind::Video) {
            return Err(Error::message("mock video group rejection"));
        }
        Ok(())
    }

    async fn send_single(
        &self,
        chat_id: i64,
        kind: MediaKind,
        source: &MediaSource,
        caption: Option<&str>,
    ) -> Result<()> {
        self.record(SentCall::Single {
            chat_id,
            kind,
            source: source.clone(),
            caption: caption.map(ToString::to_string),
        });
        self.check_chat(chat_id)
    }
}
