//! Message and subscription contracts.

use crate::error::QueueResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use time::OffsetDateTime;

/// A message in flight.
///
/// `payload` is opaque to the queue (JSON by convention). `metadata`
/// carries routing hints; the `providerID` key is recognised for tenant
/// filtering. `deliver_at == None` means "deliverable now".
#[derive(Clone, Debug, Default)]
pub struct Message {
    pub message_id: String,
    pub topic: String,
    pub payload: Vec<u8>,
    pub metadata: HashMap<String, String>,
    pub deliver_at: Option<OffsetDateTime>,
}

impl Message {
    /// Build an immediately-deliverable message.
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            message_id: String::new(),
            topic: topic.into(),
            payload,
            metadata: HashMap::new(),
            deliver_at: None,
        }
    }

    /// Attach a metadata key.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Schedule delivery no earlier than `at`.
    pub fn with_deliver_at(mut self, at: OffsetDateTime) -> Self {
        self.deliver_at = Some(at);
        self
    }

    /// The tenant filter value carried by this message, if any.
    pub fn provider_id(&self) -> &str {
        self.metadata
            .get(gantry_core::messages::METADATA_PROVIDER_ID)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Result of a single handler invocation.
pub type HandlerResult = anyhow::Result<()>;

/// A topic consumer.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, msg: Message) -> HandlerResult;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, msg: Message) -> HandlerResult {
        (self.0)(msg).await
    }
}

/// Wrap a closure as a `MessageHandler`. Mostly useful in tests.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// The abstract queue capability both peers program against.
///
/// Production deployments substitute a real message bus at this boundary;
/// tests collapse both peers into one address space with a shared
/// [`crate::InMemoryQueue`].
#[async_trait]
pub trait Queue: Send + Sync {
    /// Append a message to the pending set. Never fails for capacity.
    async fn publish(&self, msg: Message) -> QueueResult<()>;

    /// Register (or replace) a subscription. An empty `provider_filter`
    /// matches any message on the topic; otherwise the message's
    /// `providerID` metadata must equal the filter.
    async fn subscribe(
        &self,
        subscription_id: &str,
        topic: &str,
        provider_filter: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> QueueResult<()>;

    async fn unsubscribe(&self, subscription_id: &str) -> QueueResult<()>;
}

/// Outcome of one tick, for the caller's scheduling logic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Messages dispatched to a handler that returned success.
    pub delivered: usize,
    /// Messages put back for another attempt.
    pub requeued: usize,
}

impl TickOutcome {
    /// True when the tick moved nothing.
    pub fn is_quiescent(&self) -> bool {
        self.delivered == 0 && self.requeued == 0
    }
}

/// A queue that is drained by cooperative ticking.
#[async_trait]
pub trait TickableQueue: Queue {
    /// Drain the set of ready messages once.
    async fn tick(&self) -> TickOutcome;

    /// Tick until quiescent; returns the total number of deliveries.
    async fn process(&self) -> usize {
        let mut total = 0;
        loop {
            let outcome = self.tick().await;
            total += outcome.delivered;
            if outcome.is_quiescent() {
                return total;
            }
        }
    }

    /// Number of messages currently pending (ready or scheduled).
    fn pending_count(&self) -> usize;
}
