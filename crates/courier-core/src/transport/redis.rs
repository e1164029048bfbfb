//! Redis-backed transport.
//!
//! Queues are Redis lists (`RPUSH`/`BLPOP`/`LPOP`), topic channels are
//! pub/sub channels. The envelope travels as its `serde_json` encoding.
//! `BLPOP` pops atomically, so a dequeued message is owned by exactly one
//! worker without any extra locking.

use std::time::Duration;

use crossbeam_channel::Receiver;
use redis::{Client, Commands, Connection};
use tracing::{debug, warn};

use crate::error::{TransportError, TransportResult};
use crate::message::{options, Message};
use crate::queue::{is_dlq, is_in_queue, priority_variant, TOPIC_DLQ, TOPIC_IN};

use super::{MessageFactory, MessageQueueClient};

/// Message factory backed by a Redis broker.
///
/// The factory only holds connection parameters; each created client opens
/// its own connection, so dropping the factory never disturbs clients
/// already handed out.
pub struct RedisMessageFactory {
    client: Client,
}

impl RedisMessageFactory {
    /// `url` is a Redis connection string, e.g. `redis://127.0.0.1:6379/0`.
    pub fn new(url: &str) -> TransportResult<Self> {
        let client = Client::open(url).map_err(TransportError::from)?;
        debug!(%url, "created redis message factory");
        Ok(Self { client })
    }
}

impl MessageFactory for RedisMessageFactory {
    fn create_message_queue_client(&self) -> TransportResult<Box<dyn MessageQueueClient>> {
        let conn = self.client.get_connection()?;
        Ok(Box::new(RedisMessageQueueClient {
            client: self.client.clone(),
            conn,
        }))
    }
}

struct RedisMessageQueueClient {
    /// Kept for opening dedicated pub/sub connections.
    client: Client,
    conn: Connection,
}

impl RedisMessageQueueClient {
    /// Priority routing: a `priority > 0` publish aimed at an In queue lands
    /// on the type's priority queue instead, which workers drain first.
    fn resolve_queue(queue: &str, message: &Message) -> String {
        if message.priority > 0 && is_in_queue(queue) {
            priority_variant(queue)
        } else {
            queue.to_string()
        }
    }

    fn decode(bytes: &[u8]) -> TransportResult<Message> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl MessageQueueClient for RedisMessageQueueClient {
    fn publish(&mut self, queue: &str, message: &Message) -> TransportResult<()> {
        let bytes = serde_json::to_vec(message)?;
        let target = Self::resolve_queue(queue, message);
        let () = self.conn.rpush(&target, bytes)?;

        if is_in_queue(queue) {
            let () = self.conn.publish(TOPIC_IN, &target)?;
        } else if is_dlq(queue) && message.has_option(options::NOTIFY_ON_DLQ) {
            let () = self.conn.publish(TOPIC_DLQ, &target)?;
        }
        Ok(())
    }

    fn get(&mut self, queue: &str, timeout: Duration) -> TransportResult<Option<Message>> {
        // For an In queue, BLPOP watches the priority sibling first — Redis
        // serves listed keys in order.
        let keys: Vec<String> = if is_in_queue(queue) {
            vec![priority_variant(queue), queue.to_string()]
        } else {
            vec![queue.to_string()]
        };
        // BLPOP treats 0 as "block forever"; clamp so a zero timeout stays a poll.
        let secs = timeout.as_secs_f64().max(0.001);

        let reply: Option<(String, Vec<u8>)> = self.conn.blpop(keys.as_slice(), secs)?;
        match reply {
            Some((_, bytes)) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn try_get(&mut self, queue: &str) -> TransportResult<Option<Message>> {
        if is_in_queue(queue) {
            let bytes: Option<Vec<u8>> = self.conn.lpop(priority_variant(queue), None)?;
            if let Some(bytes) = bytes {
                return Ok(Some(Self::decode(&bytes)?));
            }
        }
        let bytes: Option<Vec<u8>> = self.conn.lpop(queue, None)?;
        match bytes {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn depth(&mut self, queue: &str) -> TransportResult<u64> {
        Ok(self.conn.llen(queue)?)
    }

    /// Spawns a pump thread holding a dedicated pub/sub connection. The
    /// thread exits when the broker closes the connection or when a
    /// notification arrives after the receiver has been dropped.
    fn subscribe_topic(&mut self, topic: &str) -> TransportResult<Receiver<String>> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut conn = self.client.get_connection()?;
        let topic = topic.to_string();

        std::thread::Builder::new()
            .name(format!("courier-topic-{topic}"))
            .spawn(move || {
                let mut pubsub = conn.as_pubsub();
                if let Err(e) = pubsub.subscribe(&topic) {
                    warn!(%topic, error = %e, "topic subscription failed");
                    return;
                }
                loop {
                    let msg = match pubsub.get_message() {
                        Ok(msg) => msg,
                        Err(e) => {
                            warn!(%topic, error = %e, "topic connection lost");
                            break;
                        }
                    };
                    let queue: String = match msg.get_payload() {
                        Ok(payload) => payload,
                        Err(_) => continue,
                    };
                    if tx.send(queue).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        Ok(rx)
    }
}
