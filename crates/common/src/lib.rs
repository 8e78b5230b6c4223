//! Shared payload types and error utilities used across all discast crates.

pub mod error;
pub mod types;

pub use {
    error::FromMessage,
    types::{DisplayFlags, MediaKind, MediaSet, PostPayload, RouteOrigin},
};
