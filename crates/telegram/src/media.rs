//! Batch attachments by category and emit them in platform order.
//!
//! Categories go out as animation, video, photo, document; the last
//! non-empty category carries the post text, the others only the signature.
//! One category's failure never blocks the ones after it.

use {futures::future::join_all, tracing::{info, warn}};

use discast_common::{MediaKind, MediaSet};

use crate::{
    budget,
    continuations::Continuations,
    error::{Error, Result},
    send::{GroupItem, MediaSource, TelegramSend},
};

/// Send every media category of a post to one destination.
///
/// `text` is the destination's (possibly rewritten) body; it becomes the
/// caption of the last category. Caption overflow is deferred through
/// `continuations` like any text overflow.
pub(crate) async fn send_media(
    sender: &dyn TelegramSend,
    http: &reqwest::Client,
    continuations: &Continuations,
    chat_id: i64,
    media: &MediaSet,
    text: &str,
    signature: &str,
) {
    let batches = media.batches();
    let Some(last) = batches.len().checked_sub(1) else {
        return;
    };

    for (index, (kind, urls)) in batches.into_iter().enumerate() {
        let caption_text = if index == last { text } else { "" };
        let result = match kind {
            MediaKind::Photo | MediaKind::Video => {
                send_group(
                    sender,
                    continuations,
                    chat_id,
                    kind,
                    urls,
                    caption_text,
                    signature,
                )
                .await
            },
            MediaKind::Animation => {
                send_each(
                    sender,
                    continuations,
                    chat_id,
                    MediaKind::Animation,
                    urls,
                    caption_text,
                    signature,
                )
                .await;
                Ok(())
            },
            MediaKind::Document => {
                send_documents(
                    sender,
                    http,
                    continuations,
                    chat_id,
                    urls,
                    caption_text,
                    signature,
                )
                .await
            },
        };
        match result {
            Ok(()) => info!(chat_id, category = kind.as_str(), count = urls.len(), "media category sent"),
            Err(e) => {
                warn!(chat_id, category = kind.as_str(), error = %e, "media category send failed");
            },
        }
    }
}

/// Grouped send for photos and videos. The first item carries the caption,
/// the rest the signature. A rejected video group retries item by item.
async fn send_group(
    sender: &dyn TelegramSend,
    continuations: &Continuations,
    chat_id: i64,
    kind: MediaKind,
    urls: &[String],
    text: &str,
    signature: &str,
) -> Result<()> {
    let lead = caption_for(continuations, chat_id, text, signature);
    let items: Vec<GroupItem> = urls
        .iter()
        .enumerate()
        .map(|(index, url)| GroupItem {
            kind,
            source: MediaSource::Url(url.clone()),
            caption: if index == 0 {
                non_empty(lead.clone())
            } else {
                non_empty(signature.to_string())
            },
        })
        .collect();

    match sender.send_media_group(chat_id, &items).await {
        Ok(()) => Ok(()),
        // Telegram rejects some video combinations in grouped sends; the
        // per-item path accepts them.
        Err(e) if kind == MediaKind::Video => {
            warn!(chat_id, error = %e, "video group send failed, retrying items individually");
            send_each(
                sender,
                continuations,
                chat_id,
                MediaKind::Video,
                urls,
                text,
                signature,
            )
            .await;
            Ok(())
        },
        Err(e) => Err(e),
    }
}

/// Individual sends with the caption on the **last** item. Used for
/// animations and as the video-group fallback. Per-item failures are logged
/// and skipped.
async fn send_each(
    sender: &dyn TelegramSend,
    continuations: &Continuations,
    chat_id: i64,
    kind: MediaKind,
    urls: &[String],
    text: &str,
    signature: &str,
) {
    let Some(last) = urls.len().checked_sub(1) else {
        return;
    };
    let lead = caption_for(continuations, chat_id, text, signature);
    for (index, url) in urls.iter().enumerate() {
        let caption = if index == last {
            non_empty(lead.clone())
        } else {
            non_empty(signature.to_string())
        };
        let source = MediaSource::Url(url.clone());
        if let Err(e) = sender
            .send_single(chat_id, kind, &source, caption.as_deref())
            .await
        {
            warn!(chat_id, url, error = %e, "single media send failed");
        }
    }
}

/// Documents are fetched into memory first (their source URLs may expire or
/// be unreachable from the target platform), then re-uploaded as one group
/// with the caption on the last item only.
async fn send_documents(
    sender: &dyn TelegramSend,
    http: &reqwest::Client,
    continuations: &Continuations,
    chat_id: i64,
    urls: &[String],
    text: &str,
    signature: &str,
) -> Result<()> {
    let bodies = join_all(urls.iter().map(|url| fetch(http, url))).await;
    let mut items: Vec<GroupItem> = urls
        .iter()
        .zip(bodies)
        .filter_map(|(url, body)| {
            body.map(|data| GroupItem {
                kind: MediaKind::Document,
                source: MediaSource::Bytes {
                    data,
                    filename: filename_from_url(url),
                },
                caption: None,
            })
        })
        .collect();
    if items.is_empty() {
        return Err(Error::message("no document could be fetched"));
    }

    let lead = caption_for(continuations, chat_id, text, signature);
    if let Some(last) = items.last_mut() {
        last.caption = non_empty(lead);
    }
    sender.send_media_group(chat_id, &items).await
}

async fn fetch(http: &reqwest::Client, url: &str) -> Option<Vec<u8>> {
    let result = async {
        let response = http.get(url).send().await?.error_for_status()?;
        response.bytes().await
    }
    .await;
    match result {
        Ok(bytes) => Some(bytes.to_vec()),
        Err(e) => {
            warn!(url, error = %e, "document download failed");
            None
        },
    }
}

/// Budget a caption and schedule its overflow, if any.
fn caption_for(
    continuations: &Continuations,
    chat_id: i64,
    text: &str,
    signature: &str,
) -> String {
    let budgeted = budget::budget(text, signature, true);
    if let Some(tail) = budgeted.deferred_tail {
        continuations.schedule(chat_id, tail, signature.to_string());
    }
    budgeted.head
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

/// Upload filename derived from the URL's last path segment.
fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let without_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
    without_scheme
        .split_once('/')
        .and_then(|(_, rest)| rest.rsplit('/').next())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("file")
        .to_string()
}
