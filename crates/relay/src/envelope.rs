//! Versioned wire format for queued posts.
//!
//! The payload crosses a durable queue between separately deployed halves,
//! so the wrapper carries an explicit schema version and decode validates
//! it; a mismatch is a malformed payload, not a crash deeper in the
//! pipeline.

use serde::{Deserialize, Serialize};

use discast_common::PostPayload;

use crate::error::{Error, Result};

/// Wire schema version understood by this build.
pub const WIRE_VERSION: u32 = 1;

/// Versioned wrapper around the payload as it crosses the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostEnvelope {
    pub version: u32,
    pub post: PostPayload,
}

impl PostEnvelope {
    #[must_use]
    pub fn new(post: PostPayload) -> Self {
        Self {
            version: WIRE_VERSION,
            post,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::queue(format!("encode envelope: {e}")))
    }

    /// Decode and version-check a queue message body.
    pub fn decode(body: &[u8]) -> Result<PostPayload> {
        let envelope: PostEnvelope =
            serde_json::from_slice(body).map_err(|e| Error::malformed(e))?;
        if envelope.version != WIRE_VERSION {
            return Err(Error::malformed(format!(
                "unsupported wire version {} (expected {WIRE_VERSION})",
                envelope.version
            )));
        }
        Ok(envelope.post)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use discast_common::{MediaSet, RouteOrigin};

    use super::*;

    fn post() -> PostPayload {
        PostPayload {
            text: "hi".into(),
            media: MediaSet::default(),
            message_url: "https://discord.com/channels/1/2/3".into(),
            origin: RouteOrigin {
                guild_id: "1".into(),
                channel_id: "2".into(),
                channel_label: "#news".into(),
            },
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let body = PostEnvelope::new(post()).encode().unwrap();
        let decoded = PostEnvelope::decode(&body).unwrap();
        assert_eq!(decoded, post());
    }

    #[test]
    fn garbage_is_malformed() {
        let err = PostEnvelope::decode(b"{truncated").unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }

    #[test]
    fn version_mismatch_is_malformed() {
        let mut envelope = PostEnvelope::new(post());
        envelope.version = 99;
        let body = serde_json::to_vec(&envelope).unwrap();
        let err = PostEnvelope::decode(&body).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let err = PostEnvelope::decode(br#"{"version":1,"post":{"text":"x"}}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }
}
