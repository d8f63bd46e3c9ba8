//! Scheduled-delivery behaviour of the in-memory queue.

use gantry_core::ManualClock;
use gantry_queue::{InMemoryQueue, Message, Queue, TickableQueue, handler_fn};
use std::sync::{Arc, Mutex};
use time::Duration;
use time::macros::datetime;

fn base_time() -> time::OffsetDateTime {
    datetime!(2024-01-01 12:00 UTC)
}

fn recording_subscription() -> (Arc<Mutex<Vec<Message>>>, Arc<dyn gantry_queue::MessageHandler>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let handler = handler_fn(move |msg| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(msg);
            Ok(())
        }
    });
    (received, handler)
}

#[tokio::test]
async fn scheduled_message_not_delivered_before_time() {
    let clock = Arc::new(ManualClock::new(base_time()));
    let queue = InMemoryQueue::new(clock.clone());

    let (received, handler) = recording_subscription();
    queue
        .subscribe("sub1", "usersync", "p1", handler)
        .await
        .unwrap();

    queue
        .publish(
            Message::new("usersync", br#"{"test":"data"}"#.to_vec())
                .with_metadata("providerID", "p1")
                .with_deliver_at(base_time() + Duration::seconds(5)),
        )
        .await
        .unwrap();

    queue.process().await;
    assert_eq!(received.lock().unwrap().len(), 0);

    clock.advance(Duration::seconds(3));
    queue.process().await;
    assert_eq!(
        received.lock().unwrap().len(),
        0,
        "3s before deliver_at, nothing should move"
    );

    clock.advance(Duration::seconds(2));
    queue.process().await;
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn scheduled_message_delivered_exactly_once_after_advance() {
    let clock = Arc::new(ManualClock::new(base_time()));
    let queue = InMemoryQueue::new(clock.clone());

    let (received, handler) = recording_subscription();
    queue
        .subscribe("sub1", "usersync", "p1", handler)
        .await
        .unwrap();

    queue
        .publish(
            Message::new("usersync", b"{}".to_vec())
                .with_metadata("providerID", "p1")
                .with_deliver_at(base_time() + Duration::seconds(10)),
        )
        .await
        .unwrap();

    clock.advance(Duration::seconds(60));
    queue.process().await;
    queue.process().await;

    assert_eq!(received.lock().unwrap().len(), 1);
    assert_eq!(queue.pending_count(), 0);
}

#[tokio::test]
async fn unscheduled_message_is_deliverable_immediately() {
    let clock = Arc::new(ManualClock::new(base_time()));
    let queue = InMemoryQueue::new(clock);

    let (received, handler) = recording_subscription();
    queue
        .subscribe("sub1", "usersync", "", handler)
        .await
        .unwrap();

    queue
        .publish(Message::new("usersync", b"{}".to_vec()))
        .await
        .unwrap();

    queue.process().await;
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn messages_scheduled_apart_arrive_as_the_clock_passes_each() {
    let clock = Arc::new(ManualClock::new(base_time()));
    let queue = InMemoryQueue::new(clock.clone());

    let (received, handler) = recording_subscription();
    queue
        .subscribe("sub1", "syncconsistencycheck", "", handler)
        .await
        .unwrap();

    for (id, offset) in [("m1", 1), ("m2", 2), ("m3", 4)] {
        let mut msg = Message::new("syncconsistencycheck", b"{}".to_vec())
            .with_deliver_at(base_time() + Duration::seconds(offset));
        msg.message_id = id.to_string();
        queue.publish(msg).await.unwrap();
    }

    clock.advance(Duration::seconds(2));
    queue.process().await;
    {
        let got = received.lock().unwrap();
        let mut ids: Vec<_> = got.iter().map(|m| m.message_id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    clock.advance(Duration::seconds(2));
    queue.process().await;
    assert_eq!(received.lock().unwrap().len(), 3);
}
