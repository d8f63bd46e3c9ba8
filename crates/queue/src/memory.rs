//! In-process queue implementation.

use crate::error::QueueResult;
use crate::message::{Message, MessageHandler, Queue, TickOutcome, TickableQueue};
use async_trait::async_trait;
use futures::FutureExt;
use gantry_core::Clock;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Maximum delivery attempts per message before it is discarded.
pub const MAX_ATTEMPTS: u32 = 3;

struct Subscription {
    topic: String,
    provider_filter: String,
    handler: Arc<dyn MessageHandler>,
}

struct PendingMessage {
    msg: Message,
    attempts: u32,
}

struct Inner {
    subscriptions: HashMap<String, Subscription>,
    pending: Vec<PendingMessage>,
}

/// Mutex-serialised in-memory queue.
///
/// The lock is released around handler invocations so handlers may
/// re-enter `publish`/`subscribe` without deadlock. `publish` and `tick`
/// are safe to call from multiple tasks.
pub struct InMemoryQueue {
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl InMemoryQueue {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner {
                subscriptions: HashMap::new(),
                pending: Vec::new(),
            }),
        }
    }

    /// Find the handler for a ready message: first subscription whose topic
    /// matches and whose filter passes. Ties resolve arbitrarily; at most
    /// one handler is invoked per delivery.
    fn match_handler(&self, msg: &Message) -> Option<Arc<dyn MessageHandler>> {
        let inner = self.inner.lock().unwrap();
        for sub in inner.subscriptions.values() {
            if sub.topic != msg.topic {
                continue;
            }
            if !sub.provider_filter.is_empty() && sub.provider_filter != msg.provider_id() {
                continue;
            }
            return Some(sub.handler.clone());
        }
        None
    }
}

#[async_trait]
impl Queue for InMemoryQueue {
    async fn publish(&self, mut msg: Message) -> QueueResult<()> {
        if msg.message_id.is_empty() {
            msg.message_id = Uuid::new_v4().to_string();
        }
        if msg.deliver_at.is_none() {
            msg.deliver_at = Some(self.clock.now());
        }

        let mut inner = self.inner.lock().unwrap();
        inner.pending.push(PendingMessage { msg, attempts: 0 });
        Ok(())
    }

    async fn subscribe(
        &self,
        subscription_id: &str,
        topic: &str,
        provider_filter: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> QueueResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.subscriptions.insert(
            subscription_id.to_string(),
            Subscription {
                topic: topic.to_string(),
                provider_filter: provider_filter.to_string(),
                handler,
            },
        );
        Ok(())
    }

    async fn unsubscribe(&self, subscription_id: &str) -> QueueResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.subscriptions.remove(subscription_id);
        Ok(())
    }
}

#[async_trait]
impl TickableQueue for InMemoryQueue {
    async fn tick(&self) -> TickOutcome {
        let now = self.clock.now();

        // Pull the ready set out under the lock; scheduled messages stay.
        let ready: Vec<PendingMessage> = {
            let mut inner = self.inner.lock().unwrap();
            let (ready, still_pending): (Vec<PendingMessage>, Vec<PendingMessage>) = inner
                .pending
                .drain(..)
                .partition(|pm| pm.msg.deliver_at.is_none_or(|at| at <= now));
            inner.pending = still_pending;
            ready
        };

        let mut outcome = TickOutcome::default();
        let mut to_requeue = Vec::new();

        for mut pm in ready {
            let Some(handler) = self.match_handler(&pm.msg) else {
                pm.attempts += 1;
                if pm.attempts < MAX_ATTEMPTS {
                    to_requeue.push(pm);
                } else {
                    tracing::warn!(
                        topic = %pm.msg.topic,
                        message_id = %pm.msg.message_id,
                        "dropping unroutable message after max attempts"
                    );
                }
                continue;
            };

            // The lock is not held here: the handler may publish or
            // (un)subscribe. A panicking handler counts as a failed attempt.
            let result = AssertUnwindSafe(handler.handle(pm.msg.clone()))
                .catch_unwind()
                .await;

            match result {
                Ok(Ok(())) => outcome.delivered += 1,
                Ok(Err(err)) => {
                    pm.attempts += 1;
                    if pm.attempts < MAX_ATTEMPTS {
                        tracing::debug!(
                            topic = %pm.msg.topic,
                            message_id = %pm.msg.message_id,
                            attempts = pm.attempts,
                            error = %err,
                            "handler failed, requeueing"
                        );
                        to_requeue.push(pm);
                        outcome.requeued += 1;
                    } else {
                        tracing::warn!(
                            topic = %pm.msg.topic,
                            message_id = %pm.msg.message_id,
                            error = %err,
                            "dropping message after max attempts"
                        );
                    }
                }
                Err(_panic) => {
                    pm.attempts += 1;
                    if pm.attempts < MAX_ATTEMPTS {
                        tracing::error!(
                            topic = %pm.msg.topic,
                            message_id = %pm.msg.message_id,
                            "handler panicked, requeueing"
                        );
                        to_requeue.push(pm);
                        outcome.requeued += 1;
                    } else {
                        tracing::error!(
                            topic = %pm.msg.topic,
                            message_id = %pm.msg.message_id,
                            "handler panicked, dropping message after max attempts"
                        );
                    }
                }
            }
        }

        if !to_requeue.is_empty() {
            let mut inner = self.inner.lock().unwrap();
            inner.pending.extend(to_requeue);
        }

        outcome
    }

    fn pending_count(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::handler_fn;
    use gantry_core::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::macros::datetime;

    fn test_queue() -> (Arc<ManualClock>, InMemoryQueue) {
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 12:00 UTC)));
        let queue = InMemoryQueue::new(clock.clone());
        (clock, queue)
    }

    #[tokio::test]
    async fn unroutable_message_is_dropped_after_max_attempts() {
        let (_clock, queue) = test_queue();

        queue
            .publish(Message::new("orphan-topic", b"{}".to_vec()))
            .await
            .unwrap();

        // Each tick with no matching subscription burns one attempt.
        for _ in 0..MAX_ATTEMPTS {
            queue.tick().await;
        }
        assert_eq!(queue.pending_count(), 0);
    }

    #[tokio::test]
    async fn failing_handler_retries_then_drops() {
        let (_clock, queue) = test_queue();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_in_handler = calls.clone();
        queue
            .subscribe(
                "sub1",
                "usersync",
                "",
                handler_fn(move |_msg| {
                    let calls = calls_in_handler.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        anyhow::bail!("downstream unavailable")
                    }
                }),
            )
            .await
            .unwrap();

        queue
            .publish(Message::new("usersync", b"{}".to_vec()))
            .await
            .unwrap();

        let total = queue.process().await;
        assert_eq!(total, 0);
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS as usize);
        assert_eq!(queue.pending_count(), 0);
    }

    #[tokio::test]
    async fn panicking_handler_counts_as_failed_attempt() {
        let (_clock, queue) = test_queue();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_in_handler = calls.clone();
        queue
            .subscribe(
                "sub1",
                "usersync",
                "",
                handler_fn(move |_msg| {
                    let calls = calls_in_handler.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        panic!("handler bug");
                    }
                }),
            )
            .await
            .unwrap();

        queue
            .publish(Message::new("usersync", b"{}".to_vec()))
            .await
            .unwrap();

        queue.process().await;
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS as usize);
        assert_eq!(queue.pending_count(), 0);
    }

    #[tokio::test]
    async fn handler_may_republish_without_deadlock() {
        let (_clock, queue) = test_queue();
        let queue = Arc::new(queue);
        let delivered = Arc::new(AtomicUsize::new(0));

        let queue_in_handler = queue.clone();
        queue
            .subscribe(
                "sub-first",
                "first",
                "",
                handler_fn(move |_msg| {
                    let queue = queue_in_handler.clone();
                    async move {
                        queue
                            .publish(Message::new("second", b"{}".to_vec()))
                            .await?;
                        Ok(())
                    }
                }),
            )
            .await
            .unwrap();

        let delivered_in_handler = delivered.clone();
        queue
            .subscribe(
                "sub-second",
                "second",
                "",
                handler_fn(move |_msg| {
                    let delivered = delivered_in_handler.clone();
                    async move {
                        delivered.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }),
            )
            .await
            .unwrap();

        queue
            .publish(Message::new("first", b"{}".to_vec()))
            .await
            .unwrap();

        queue.process().await;
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsubscribe_removes_routing() {
        let (_clock, queue) = test_queue();
        let delivered = Arc::new(AtomicUsize::new(0));

        let delivered_in_handler = delivered.clone();
        queue
            .subscribe(
                "sub1",
                "usersync",
                "",
                handler_fn(move |_msg| {
                    let delivered = delivered_in_handler.clone();
                    async move {
                        delivered.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }),
            )
            .await
            .unwrap();
        queue.unsubscribe("sub1").await.unwrap();

        queue
            .publish(Message::new("usersync", b"{}".to_vec()))
            .await
            .unwrap();
        queue.process().await;

        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }
}
