//! Queue consumer: decode → resolve → dispatch → ack.
//!
//! A message is acknowledged only after the full dispatch attempt completes;
//! anything failing before dispatch leaves it unacked for redelivery.
//! Delivery is at-least-once and dispatch is not idempotent: a crash between
//! a destination send and the ack re-sends to that destination on
//! redelivery.

use std::sync::Arc;

use {
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use discast_routing::{Resolver, Scope};

use crate::{
    dispatch::Dispatcher,
    envelope::PostEnvelope,
    queue::{Delivery, PostQueue},
};

pub struct Consumer {
    queue: Arc<dyn PostQueue>,
    resolver: Arc<Resolver>,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
}

impl Consumer {
    pub fn new(
        queue: Arc<dyn PostQueue>,
        resolver: Arc<Resolver>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            queue,
            resolver,
            dispatcher,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops [`Consumer::run`] on cancellation.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Consume until the queue closes or the token fires. Each delivery is
    /// processed in its own task, so several payloads may be in flight with
    /// no ordering between them.
    pub async fn run(self: Arc<Self>) {
        info!("relay consumer started");
        loop {
            let delivery = tokio::select! {
                () = self.cancel.cancelled() => break,
                next = self.queue.next() => match next {
                    Ok(Some(delivery)) => delivery,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "queue receive failed, stopping consumer");
                        break;
                    },
                },
            };
            let consumer = Arc::clone(&self);
            tokio::spawn(async move { consumer.process(delivery).await });
        }
        info!("relay consumer stopped");
    }

    /// Handle one delivery end to end.
    pub async fn process(&self, delivery: Delivery) {
        let post = match PostEnvelope::decode(&delivery.body) {
            Ok(post) => post,
            Err(e) => {
                // Not acked, but redelivery would hit the same parse error;
                // the message is effectively dropped.
                warn!(tag = delivery.tag, error = %e, "dropping malformed queue payload");
                return;
            },
        };

        let scope = Scope::Channel(post.origin.channel_id.clone());
        let links = match self.resolver.resolve(&scope).await {
            Ok(links) => links,
            Err(e) => {
                warn!(
                    channel = %post.origin.channel_id,
                    error = %e,
                    "routing resolution failed, leaving message for redelivery"
                );
                return;
            },
        };

        self.dispatcher.dispatch(&post, &links).await;

        if let Err(e) = self.queue.ack(delivery.tag).await {
            warn!(tag = delivery.tag, error = %e, "ack failed");
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use {
        super::*,
        crate::{envelope::PostEnvelope, queue::MemoryQueue},
        discast_common::{MediaSet, PostPayload, RouteOrigin},
        discast_routing::{
            Error as RoutingError, LinkStore, MemoryCache, MemoryLinkStore, Result as RoutingResult,
            RoutingLink,
        },
        discast_telegram::{PostDelivery, mock::MockSender},
    };

    fn post() -> PostPayload {
        PostPayload {
            text: "hello".into(),
            media: MediaSet::default(),
            message_url: "https://discord.com/channels/1/2/3".into(),
            origin: RouteOrigin {
                guild_id: "g".into(),
                channel_id: "c".into(),
                channel_label: "#news".into(),
            },
        }
    }

    fn consumer_with(
        queue: Arc<MemoryQueue>,
        resolver: Arc<Resolver>,
        sender: Arc<MockSender>,
    ) -> Arc<Consumer> {
        let delivery = Arc::new(PostDelivery::new(sender, Duration::from_secs(10)));
        let dispatcher = Arc::new(Dispatcher::new(
            delivery,
            Arc::new(discast_rewrite::Passthrough),
            None,
        ));
        Arc::new(Consumer::new(queue, resolver, dispatcher))
    }

    fn empty_resolver() -> Arc<Resolver> {
        Arc::new(Resolver::new(
            Arc::new(MemoryLinkStore::new()),
            Arc::new(MemoryCache::new()),
        ))
    }

    #[tokio::test]
    async fn malformed_payload_is_not_acked() {
        let queue = Arc::new(MemoryQueue::new());
        let consumer = consumer_with(queue.clone(), empty_resolver(), Arc::new(MockSender::new()));

        queue.publish(b"{garbage".to_vec()).await.unwrap();
        let delivery = queue.next().await.unwrap().unwrap();
        consumer.process(delivery).await;

        assert_eq!(queue.unacked().await, 1);
    }

    #[tokio::test]
    async fn zero_links_still_acks() {
        let queue = Arc::new(MemoryQueue::new());
        let consumer = consumer_with(queue.clone(), empty_resolver(), Arc::new(MockSender::new()));

        queue
            .publish(PostEnvelope::new(post()).encode().unwrap())
            .await
            .unwrap();
        let delivery = queue.next().await.unwrap().unwrap();
        consumer.process(delivery).await;

        assert_eq!(queue.unacked().await, 0);
    }

    /// Store that always fails, simulating a resolution outage.
    struct DownStore;

    #[async_trait]
    impl LinkStore for DownStore {
        async fn list_links(&self, _scope: &Scope) -> RoutingResult<Vec<RoutingLink>> {
            Err(RoutingError::store("connection refused"))
        }
        async fn find_key(
            &self,
            _token: &str,
        ) -> RoutingResult<Option<discast_routing::ChannelKey>> {
            Err(RoutingError::store("connection refused"))
        }
        async fn create_link(
            &self,
            _link: discast_routing::NewLink,
        ) -> RoutingResult<RoutingLink> {
            Err(RoutingError::store("connection refused"))
        }
        async fn update_flags(
            &self,
            _link_id: i64,
            _flags: discast_common::DisplayFlags,
        ) -> RoutingResult<RoutingLink> {
            Err(RoutingError::store("connection refused"))
        }
        async fn set_rewrite_prompt(
            &self,
            _link_id: i64,
            _prompt: Option<String>,
        ) -> RoutingResult<RoutingLink> {
            Err(RoutingError::store("connection refused"))
        }
        async fn delete_link(&self, _link_id: i64) -> RoutingResult<RoutingLink> {
            Err(RoutingError::store("connection refused"))
        }
        async fn create_key(
            &self,
            _key: discast_routing::NewKey,
        ) -> RoutingResult<discast_routing::ChannelKey> {
            Err(RoutingError::store("connection refused"))
        }
        async fn delete_key(&self, _key_id: i64) -> RoutingResult<Vec<RoutingLink>> {
            Err(RoutingError::store("connection refused"))
        }
    }

    #[tokio::test]
    async fn resolution_failure_leaves_message_for_redelivery() {
        let queue = Arc::new(MemoryQueue::new());
        let resolver = Arc::new(Resolver::new(Arc::new(DownStore), Arc::new(MemoryCache::new())));
        let consumer = consumer_with(queue.clone(), resolver, Arc::new(MockSender::new()));

        queue
            .publish(PostEnvelope::new(post()).encode().unwrap())
            .await
            .unwrap();
        let delivery = queue.next().await.unwrap().unwrap();
        consumer.process(delivery).await;

        assert_eq!(queue.unacked().await, 1);
        queue.recover().await;
        assert_eq!(queue.depth().await, 1);
    }

    #[tokio::test]
    async fn cancel_token_stops_the_run_loop() {
        let queue = Arc::new(MemoryQueue::new());
        let consumer = consumer_with(queue, empty_resolver(), Arc::new(MockSender::new()));
        let cancel = consumer.cancel_token();

        let handle = tokio::spawn(Arc::clone(&consumer).run());
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn closing_the_queue_stops_the_run_loop() {
        let queue = Arc::new(MemoryQueue::new());
        let consumer = consumer_with(queue.clone(), empty_resolver(), Arc::new(MockSender::new()));

        let handle = tokio::spawn(Arc::clone(&consumer).run());
        queue.close().await;
        handle.await.unwrap();
    }
}
