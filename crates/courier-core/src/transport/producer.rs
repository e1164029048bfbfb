use serde::Serialize;
use tracing::debug;

use crate::codec::{BodyCodec, JsonCodec};
use crate::error::TransportResult;
use crate::message::Message;
use crate::queue::{short_type_name, QueueNames};

use super::MessageQueueClient;

/// Producer surface over a queue client: typed publishes and fire-and-forget
/// sends.
///
/// `publish*` calls participate in request/reply — responses land on the
/// body type's Out queue, or on an explicit `reply_to`. `send_one_way*`
/// calls expect no reply and never set `reply_to`. Either way the publish
/// itself is fire-and-forget: failures are reported asynchronously through
/// the dead-letter queue, never synchronously to the producer.
pub struct MessageProducer<C: BodyCodec = JsonCodec> {
    client: Box<dyn MessageQueueClient>,
    codec: C,
}

impl MessageProducer<JsonCodec> {
    pub fn new(client: Box<dyn MessageQueueClient>) -> Self {
        Self::with_codec(client, JsonCodec)
    }
}

impl<C: BodyCodec> MessageProducer<C> {
    pub fn with_codec(client: Box<dyn MessageQueueClient>, codec: C) -> Self {
        Self { client, codec }
    }

    /// Publish a body to its type's In queue. Replies go to the type's Out
    /// queue.
    pub fn publish<T: Serialize>(&mut self, body: &T) -> TransportResult<()> {
        let message = self.envelope(body)?;
        self.publish_message(message)
    }

    /// Publish a caller-constructed envelope to its type's In queue. Use
    /// this to set `reply_to`, options, or priority on the envelope.
    pub fn publish_message(&mut self, message: Message) -> TransportResult<()> {
        let queue = QueueNames::new(message.type_name.clone()).in_queue();
        debug!(%queue, msg_id = %message.id, "publishing message");
        self.client.publish(&queue, &message)
    }

    /// Request/reply publish: the response (or terminal failure) lands on
    /// `reply_to` instead of the type's Out queue.
    pub fn publish_with_reply_to<T: Serialize>(
        &mut self,
        body: &T,
        reply_to: &str,
    ) -> TransportResult<()> {
        let message = self.envelope(body)?.with_reply_to(reply_to);
        self.publish_message(message)
    }

    /// Fire-and-forget send to the body type's In queue.
    pub fn send_one_way<T: Serialize>(&mut self, body: &T) -> TransportResult<()> {
        let message = self.envelope(body)?;
        self.publish_message(message)
    }

    /// Fire-and-forget send to an explicit queue.
    pub fn send_one_way_to<T: Serialize>(&mut self, queue: &str, body: &T) -> TransportResult<()> {
        let message = self.envelope(body)?;
        debug!(%queue, msg_id = %message.id, "publishing message");
        self.client.publish(queue, &message)
    }

    /// Batch of one-way sends. Stops at the first transport failure.
    pub fn send_all_one_way<T: Serialize>(&mut self, bodies: &[T]) -> TransportResult<()> {
        for body in bodies {
            self.send_one_way(body)?;
        }
        Ok(())
    }

    /// Build an envelope for `body` with this producer's codec.
    pub fn envelope<T: Serialize>(&self, body: &T) -> TransportResult<Message> {
        Ok(Message::new(
            short_type_name::<T>(),
            self.codec.to_bytes(body)?,
        ))
    }
}
