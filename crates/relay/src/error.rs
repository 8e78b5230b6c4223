use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Queue payload failed to decode or carried an unsupported schema
    /// version. The message is logged and left unacked; redelivery would hit
    /// the same error, so it is effectively dropped.
    #[error("malformed queue payload: {reason}")]
    MalformedPayload { reason: String },

    /// Routing lookup failed; the message stays unacked for redelivery.
    #[error(transparent)]
    Resolution(#[from] discast_routing::Error),

    #[error("queue failure: {0}")]
    Queue(String),

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        Self::MalformedPayload {
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn queue(message: impl std::fmt::Display) -> Self {
        Self::Queue(message.to_string())
    }
}

impl discast_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

discast_common::impl_context!();
