//! Topic-addressed, time-aware message queue.
//!
//! The queue is the only coupling between the cloud catalogue and the
//! on-prem agent. It provides topic + tenant routing, per-message scheduled
//! delivery, bounded per-message attempts and cooperative tick-driven
//! draining. It deliberately provides no FIFO guarantee; correctness is
//! established by idempotent stage transitions and the reconciliation loop.

pub mod error;
pub mod memory;
pub mod message;
pub mod runtime;

pub use error::{QueueError, QueueResult};
pub use memory::{InMemoryQueue, MAX_ATTEMPTS};
pub use message::{
    HandlerResult, Message, MessageHandler, Queue, TickOutcome, TickableQueue, handler_fn,
};
pub use runtime::spawn_queue_ticker;
