//! Best-effort per-destination text rewriting.
//!
//! The rewrite capability never blocks delivery: implementations must not
//! fail, and the bundled HTTP client degrades to returning the source text
//! unchanged on any transport, status, or decode problem.

pub mod client;
pub mod config;

use async_trait::async_trait;

pub use {client::OpenAiRewriter, config::RewriteConfig};

/// Rewrite `source` according to a per-link `directive`.
#[async_trait]
pub trait Rewrite: Send + Sync {
    /// Must not fail; degrade to returning `source` unchanged.
    async fn rewrite(&self, source: &str, directive: &str) -> String;
}

/// No-op rewriter used when no rewrite service is configured.
pub struct Passthrough;

#[async_trait]
impl Rewrite for Passthrough {
    async fn rewrite(&self, source: &str, _directive: &str) -> String {
        source.to_string()
    }
}
