//! Telegram delivery for relayed posts.
//!
//! Budgets text against the platform's length ceilings, renders per-link
//! signatures, batches media by category, and sends through the
//! [`send::TelegramSend`] port (teloxide-backed in production, recorded in
//! tests). Over-length text spills into tracked deferred continuations.

pub mod budget;
pub mod continuations;
pub mod error;
pub mod media;
pub mod mock;
pub mod post;
pub mod send;
pub mod signature;

pub use {
    budget::{Budgeted, MAX_CAPTION_LEN, MAX_TEXT_LEN, budget},
    continuations::Continuations,
    error::{Error, Result},
    post::{Destination, PostDelivery},
    send::{BotSender, GroupItem, MediaSource, TelegramSend},
};
