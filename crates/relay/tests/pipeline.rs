//! End-to-end pipeline tests over the in-process queue, cache, store, and a
//! recording sender: publish → consume → resolve → budget → dispatch → ack.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{sync::Arc, time::Duration};

use {
    discast_common::{DisplayFlags, MediaKind, MediaSet, PostPayload, RouteOrigin},
    discast_relay::{Consumer, Dispatcher, MemoryQueue, PostQueue, Producer},
    discast_rewrite::Passthrough,
    discast_routing::{MemoryCache, MemoryLinkStore, Resolver, SourceChannel},
    discast_telegram::{
        MAX_TEXT_LEN, PostDelivery,
        budget::CONTINUATION_MARKER,
        mock::{MockSender, SentCall},
    },
};

const MESSAGE_URL: &str = "https://discord.com/channels/1/2/3";
const DEST_CHAT: i64 = -1_001;

struct Pipeline {
    queue: Arc<MemoryQueue>,
    resolver: Arc<Resolver>,
    sender: Arc<MockSender>,
    consumer: Arc<Consumer>,
    producer: Producer,
}

fn pipeline() -> Pipeline {
    let queue = Arc::new(MemoryQueue::new());
    let resolver = Arc::new(Resolver::new(
        Arc::new(MemoryLinkStore::new()),
        Arc::new(MemoryCache::new()),
    ));
    let sender = Arc::new(MockSender::new());
    let delivery = Arc::new(PostDelivery::new(sender.clone(), Duration::from_secs(10)));
    let dispatcher = Arc::new(Dispatcher::new(delivery, Arc::new(Passthrough), None));
    let consumer = Arc::new(Consumer::new(
        queue.clone(),
        resolver.clone(),
        dispatcher,
    ));
    let producer = Producer::new(queue.clone());
    Pipeline {
        queue,
        resolver,
        sender,
        consumer,
        producer,
    }
}

fn source_channel() -> SourceChannel {
    SourceChannel {
        guild_id: "g1".into(),
        channel_id: "c1".into(),
        name: "news".into(),
    }
}

fn post(text: &str) -> PostPayload {
    PostPayload {
        text: text.into(),
        media: MediaSet::default(),
        message_url: MESSAGE_URL.into(),
        origin: RouteOrigin {
            guild_id: "g1".into(),
            channel_id: "c1".into(),
            channel_label: "#news".into(),
        },
    }
}

async fn link_destination(pipeline: &Pipeline, flags: DisplayFlags) {
    let key = pipeline
        .resolver
        .create_key(DEST_CHAT, "team channel")
        .await
        .unwrap();
    pipeline
        .resolver
        .create_link(source_channel(), &key.token, flags)
        .await
        .unwrap();
}

fn text_sends(sender: &MockSender, chat_id: i64) -> Vec<String> {
    sender
        .calls_for(chat_id)
        .into_iter()
        .filter_map(|call| match call {
            SentCall::Text { html, .. } => Some(html),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn over_length_post_is_truncated_and_continued() {
    let pipeline = pipeline();
    link_destination(
        &pipeline,
        DisplayFlags {
            with_source: true,
            ..DisplayFlags::default()
        },
    )
    .await;

    let text = "word ".repeat(1_000); // 5000 chars against a 4096 ceiling
    pipeline.producer.publish_post(post(&text)).await.unwrap();

    let run = tokio::spawn(Arc::clone(&pipeline.consumer).run());
    tokio::time::sleep(Duration::from_secs(1)).await;

    let signature = format!("<a href=\"{MESSAGE_URL}\">Source</a>");
    let sig_block = format!("\n\n{signature}");

    // Immediate send: under the ceiling, signed, marked as continued.
    let sends = text_sends(&pipeline.sender, DEST_CHAT);
    assert_eq!(sends.len(), 1);
    let head = &sends[0];
    assert!(head.chars().count() <= MAX_TEXT_LEN);
    assert!(head.ends_with(&sig_block));
    assert!(head.contains(CONTINUATION_MARKER));

    // Acked after the complete dispatch attempt.
    assert_eq!(pipeline.queue.unacked().await, 0);

    // The deferred continuation carries exactly the remainder, signed again.
    let head_body = head
        .strip_suffix(&sig_block)
        .unwrap()
        .strip_suffix(&format!(" {CONTINUATION_MARKER}"))
        .unwrap();
    assert!(text.starts_with(head_body));
    let remainder = text[head_body.len()..].trim();

    tokio::time::sleep(Duration::from_secs(11)).await;
    let sends = text_sends(&pipeline.sender, DEST_CHAT);
    assert_eq!(sends.len(), 2);
    assert_eq!(sends[1], format!("{remainder}{sig_block}"));

    pipeline.queue.close().await;
    run.await.unwrap();
}

#[tokio::test]
async fn unlinked_scope_is_a_no_op_that_still_acks() {
    let pipeline = pipeline();
    // No links created at all.
    pipeline.producer.publish_post(post("hello")).await.unwrap();

    let delivery = pipeline.queue.next().await.unwrap().unwrap();
    pipeline.consumer.process(delivery).await;

    assert!(pipeline.sender.calls().is_empty());
    assert_eq!(pipeline.queue.unacked().await, 0);
}

#[tokio::test]
async fn media_post_flows_through_the_batcher() {
    let pipeline = pipeline();
    link_destination(
        &pipeline,
        DisplayFlags {
            with_hashtag: true,
            ..DisplayFlags::default()
        },
    )
    .await;

    let mut payload = post("fresh clip");
    payload
        .media
        .push(MediaKind::Photo, "https://cdn.example/a.png".into());
    payload
        .media
        .push(MediaKind::Photo, "https://cdn.example/b.png".into());
    pipeline.producer.publish_post(payload).await.unwrap();

    let delivery = pipeline.queue.next().await.unwrap().unwrap();
    pipeline.consumer.process(delivery).await;

    let calls = pipeline.sender.calls_for(DEST_CHAT);
    assert_eq!(calls.len(), 1);
    let SentCall::Group { items, .. } = &calls[0] else {
        panic!("expected a grouped photo send");
    };
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].caption.as_deref(), Some("fresh clip\n\n#news"));
    assert_eq!(items[1].caption.as_deref(), Some("#news"));
    assert_eq!(pipeline.queue.unacked().await, 0);
}

#[tokio::test]
async fn multi_destination_fanout_survives_one_failure() {
    let queue = Arc::new(MemoryQueue::new());
    let resolver = Arc::new(Resolver::new(
        Arc::new(MemoryLinkStore::new()),
        Arc::new(MemoryCache::new()),
    ));
    let sender = Arc::new(MockSender::failing_for_chats(vec![-2]));
    let delivery = Arc::new(PostDelivery::new(sender.clone(), Duration::from_secs(10)));
    let dispatcher = Arc::new(Dispatcher::new(delivery, Arc::new(Passthrough), None));
    let consumer = Arc::new(Consumer::new(queue.clone(), resolver.clone(), dispatcher));

    for chat_id in [-1, -2, -3] {
        let key = resolver
            .create_key(chat_id, "fanout destination")
            .await
            .unwrap();
        resolver
            .create_link(source_channel(), &key.token, DisplayFlags::default())
            .await
            .unwrap();
    }

    Producer::new(queue.clone())
        .publish_post(post("fan out"))
        .await
        .unwrap();
    let delivery = queue.next().await.unwrap().unwrap();
    consumer.process(delivery).await;

    // Destination -2 failed; -1 and -3 still delivered, and the message is
    // acked regardless.
    assert_eq!(sender.calls_for(-1).len(), 1);
    assert_eq!(sender.calls_for(-3).len(), 1);
    assert_eq!(queue.unacked().await, 0);
}
