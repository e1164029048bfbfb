pub mod memory;
mod producer;
pub mod redis;

pub use memory::InMemoryMessageFactory;
pub use producer::MessageProducer;
pub use redis::RedisMessageFactory;

use std::time::Duration;

use crate::error::TransportResult;
use crate::message::Message;

/// Transport-facing handle for publish/receive against named queues.
///
/// Implementations dequeue by atomic pop: a message returned by `get` or
/// `try_get` is owned by exactly one caller, which is what guarantees no
/// duplicate concurrent processing of a dequeued item. Failure paths
/// re-publish explicitly; there is no separate acknowledge call.
///
/// Clients are `Send` but not shared — each worker owns its own.
pub trait MessageQueueClient: Send {
    /// Enqueue a message. Never blocks on a consumer and is valid before any
    /// worker exists — messages accumulate until one starts.
    ///
    /// Publishing to an In queue also signals the [`TOPIC_IN`] channel so
    /// external listeners can wake; dead-lettering a message carrying
    /// [`options::NOTIFY_ON_DLQ`] also signals [`TOPIC_DLQ`].
    ///
    /// A transport failure surfaces as an error — a message accepted for
    /// publish is never silently dropped.
    ///
    /// [`TOPIC_IN`]: crate::queue::TOPIC_IN
    /// [`TOPIC_DLQ`]: crate::queue::TOPIC_DLQ
    /// [`options::NOTIFY_ON_DLQ`]: crate::message::options::NOTIFY_ON_DLQ
    fn publish(&mut self, queue: &str, message: &Message) -> TransportResult<()>;

    /// Blocking receive. Returns `Ok(None)` when the timeout elapses with no
    /// message available; an empty queue is never an error.
    fn get(&mut self, queue: &str, timeout: Duration) -> TransportResult<Option<Message>>;

    /// Non-blocking receive: `Ok(None)` immediately when empty. This is the
    /// dead-letter inspection/drain primitive used by operators and tests.
    fn try_get(&mut self, queue: &str) -> TransportResult<Option<Message>>;

    /// Number of messages currently waiting on `queue`.
    fn depth(&mut self, queue: &str) -> TransportResult<u64>;

    /// Subscribe to a broadcast topic channel. The receiver yields the names
    /// of queues that received work — never payloads.
    fn subscribe_topic(
        &mut self,
        topic: &str,
    ) -> TransportResult<crossbeam_channel::Receiver<String>>;
}

/// Creates queue clients and producers bound to one transport instance.
///
/// Dropping a factory must not disturb clients it has already handed out:
/// the in-memory factory shares its queue map by `Arc`, and the Redis
/// factory only holds connection parameters.
pub trait MessageFactory: Send + Sync {
    fn create_message_queue_client(&self) -> TransportResult<Box<dyn MessageQueueClient>>;

    fn create_message_producer(&self) -> TransportResult<MessageProducer> {
        Ok(MessageProducer::new(self.create_message_queue_client()?))
    }
}
