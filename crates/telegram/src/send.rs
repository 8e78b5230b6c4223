//! Send surface of the Telegram Bot API consumed by the relay.

use {
    async_trait::async_trait,
    teloxide::{
        payloads::{SendDocumentSetters, SendMessageSetters, SendPhotoSetters, SendVideoSetters},
        prelude::*,
        types::{
            ChatId, InputFile, InputMedia, InputMediaDocument, InputMediaPhoto, InputMediaVideo,
            LinkPreviewOptions, ParseMode,
        },
    },
};

use discast_common::MediaKind;

use crate::error::{Context, Result};

/// Content source for one outgoing media item.
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// Fetched by Telegram from the given URL.
    Url(String),
    /// Uploaded from memory (download-then-reupload path).
    Bytes { data: Vec<u8>, filename: String },
}

/// One item of a grouped-media send.
#[derive(Debug, Clone)]
pub struct GroupItem {
    pub kind: MediaKind,
    pub source: MediaSource,
    pub caption: Option<String>,
}

/// The send operations the relay needs from the target platform.
///
/// Captions and text are Telegram HTML and already budgeted by the caller.
#[async_trait]
pub trait TelegramSend: Send + Sync {
    async fn send_text(&self, chat_id: i64, html: &str, disable_preview: bool) -> Result<()>;

    async fn send_media_group(&self, chat_id: i64, items: &[GroupItem]) -> Result<()>;

    async fn send_single(
        &self,
        chat_id: i64,
        kind: MediaKind,
        source: &MediaSource,
        caption: Option<&str>,
    ) -> Result<()>;
}

/// teloxide-backed sender.
pub struct BotSender {
    bot: Bot,
}

impl BotSender {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl TelegramSend for BotSender {
    async fn send_text(&self, chat_id: i64, html: &str, disable_preview: bool) -> Result<()> {
        let mut req = self
            .bot
            .send_message(ChatId(chat_id), html)
            .parse_mode(ParseMode::Html);
        if disable_preview {
            req = req.link_preview_options(disabled_preview());
        }
        req.await?;
        Ok(())
    }

    async fn send_media_group(&self, chat_id: i64, items: &[GroupItem]) -> Result<()> {
        let media = items
            .iter()
            .map(to_input_media)
            .collect::<Result<Vec<_>>>()?;
        self.bot.send_media_group(ChatId(chat_id), media).await?;
        Ok(())
    }

    async fn send_single(
        &self,
        chat_id: i64,
        kind: MediaKind,
        source: &MediaSource,
        caption: Option<&str>,
    ) -> Result<()> {
        let chat = ChatId(chat_id);
        let file = input_file(source)?;
        match kind {
            MediaKind::Photo => {
                let mut req = self.bot.send_photo(chat, file);
                if let Some(caption) = caption {
                    req = req.caption(caption).parse_mode(ParseMode::Html);
                }
                req.await?;
            },
            // Animations ride the video method, as do per-item video
            // fallback sends.
            MediaKind::Video | MediaKind::Animation => {
                let mut req = self.bot.send_video(chat, file);
                if let Some(caption) = caption {
                    req = req.caption(caption).parse_mode(ParseMode::Html);
                }
                req.await?;
            },
            MediaKind::Document => {
                let mut req = self.bot.send_document(chat, file);
                if let Some(caption) = caption {
                    req = req.caption(caption).parse_mode(ParseMode::Html);
                }
                req.await?;
            },
        }
        Ok(())
    }
}

fn input_file(source: &MediaSource) -> Result<InputFile> {
    match source {
        MediaSource::Url(url) => {
            let parsed = url
                .parse()
                .with_context(|| format!("invalid media url {url}"))?;
            Ok(InputFile::url(parsed))
        },
        MediaSource::Bytes { data, filename } => {
            Ok(InputFile::memory(data.clone()).file_name(filename.clone()))
        },
    }
}

fn to_input_media(item: &GroupItem) -> Result<InputMedia> {
    let file = input_file(&item.source)?;
    let media = match item.kind {
        MediaKind::Photo => {
            let mut media = InputMediaPhoto::new(file).parse_mode(ParseMode::Html);
            media.caption = item.caption.clone();
            InputMedia::Photo(media)
        },
        MediaKind::Video | MediaKind::Animation => {
            let mut media = InputMediaVideo::new(file).parse_mode(ParseMode::Html);
            media.caption = item.caption.clone();
            InputMedia::Video(media)
        },
        MediaKind::Document => {
            let mut media = InputMediaDocument::new(file).parse_mode(ParseMode::Html);
            media.caption = item.caption.clone();
            InputMedia::Document(media)
        },
    };
    Ok(media)
}

fn disabled_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}
