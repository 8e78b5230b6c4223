//! Fan out one post to every resolved destination.
//!
//! Destinations needing a rewrite are grouped apart from the as-is set so
//! the latter goes out immediately while rewrites resolve in parallel.
//! Every destination is individually contained: one failure is logged and
//! never aborts the siblings.

use std::sync::Arc;

use {futures::future::join_all, tracing::{info, warn}};

use {
    discast_common::PostPayload,
    discast_rewrite::Rewrite,
    discast_routing::RoutingLink,
    discast_telegram::{Destination, PostDelivery, signature},
};

struct Target {
    chat_id: i64,
    signature: String,
    rewrite_prompt: Option<String>,
}

/// Fan-out dispatcher over one shared delivery and rewrite capability.
pub struct Dispatcher {
    delivery: Arc<PostDelivery>,
    rewriter: Arc<dyn Rewrite>,
    /// Credit line used by links with `with_mention` enabled.
    credit: Option<String>,
}

impl Dispatcher {
    pub fn new(
        delivery: Arc<PostDelivery>,
        rewriter: Arc<dyn Rewrite>,
        credit: Option<String>,
    ) -> Self {
        Self {
            delivery,
            rewriter,
            credit,
        }
    }

    /// Dispatch a post to all its links. Never fails: per-destination errors
    /// are contained and logged. An empty link set is a no-op.
    pub async fn dispatch(&self, post: &PostPayload, links: &[RoutingLink]) {
        if links.is_empty() {
            return;
        }

        let targets: Vec<Target> = links
            .iter()
            .map(|link| Target {
                chat_id: link.key.chat_id,
                signature: signature::render(
                    &link.flags,
                    &post.message_url,
                    &post.origin.channel_label,
                    self.credit.as_deref(),
                ),
                rewrite_prompt: link.rewrite_prompt.clone(),
            })
            .collect();

        let (rewrite, as_is): (Vec<Target>, Vec<Target>) = targets
            .into_iter()
            .partition(|t| t.rewrite_prompt.is_some() && !post.text.is_empty());

        info!(
            channel = %post.origin.channel_id,
            destinations = rewrite.len() + as_is.len(),
            rewrites = rewrite.len(),
            "dispatching post"
        );

        let send_as_is = join_all(
            as_is
                .iter()
                .map(|target| self.deliver_one(post, target, &post.text)),
        );

        // The as-is set does not wait for rewrites; the rewrite set sends
        // once all rewrites resolve.
        let send_rewritten = async {
            let rewritten = join_all(rewrite.iter().map(|target| {
                let prompt = target.rewrite_prompt.as_deref().unwrap_or_default();
                self.rewriter.rewrite(&post.text, prompt)
            }))
            .await;
            join_all(
                rewrite
                    .iter()
                    .zip(rewritten.iter())
                    .map(|(target, text)| self.deliver_one(post, target, text)),
            )
            .await;
        };

        futures::join!(send_as_is, send_rewritten);
    }

    async fn deliver_one(&self, post: &PostPayload, target: &Target, text: &str) {
        let destination = Destination {
            chat_id: target.chat_id,
            signature: target.signature.clone(),
        };
        if let Err(e) = self.delivery.deliver(&destination, &post.media, text).await {
            // Contained: siblings keep going, the consumer still acks.
            warn!(chat_id = target.chat_id, error = %e, "destination delivery failed");
        }
    }
}
