use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope option flags. Stored as a bitmask so transports can define
/// behavior without envelope schema changes.
pub mod options {
    /// No options set.
    pub const NONE: u32 = 0;
    /// Signal the dead-letter topic channel when this message is dead-lettered.
    pub const NOTIFY_ON_DLQ: u32 = 1 << 0;
}

/// Structured error recorded into an envelope on a failed processing attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageError {
    pub code: String,
    pub message: String,
}

/// The wire-level unit of work: an opaque serialized payload plus delivery
/// metadata. This is what moves through queues — distinct from the typed
/// bodies handlers consume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    /// Epoch milliseconds at creation.
    pub created_at: u64,
    /// Logical type tag of the body, used to derive the queue name set.
    pub type_name: String,
    pub body: Vec<u8>,
    /// Completed failed attempts. Incremented only by the worker pool.
    pub retry_attempts: u32,
    pub error: Option<MessageError>,
    /// When set, replies (and terminal-failure notifications) go here
    /// instead of the type's Out queue.
    pub reply_to: Option<String>,
    /// Bitmask of [`options`] flags.
    pub options: u32,
    /// Ordering hint. The Redis transport routes `priority > 0` publishes to
    /// the type's priority queue; the in-memory transport ignores it.
    pub priority: i64,
}

impl Message {
    /// Build a fresh envelope with a UUIDv7 id and a zeroed retry counter.
    pub fn new(type_name: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: epoch_millis(),
            type_name: type_name.into(),
            body,
            retry_attempts: 0,
            error: None,
            reply_to: None,
            options: options::NONE,
            priority: 0,
        }
    }

    pub fn with_reply_to(mut self, queue: impl Into<String>) -> Self {
        self.reply_to = Some(queue.into());
        self
    }

    pub fn with_options(mut self, options: u32) -> Self {
        self.options = options;
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn has_option(&self, flag: u32) -> bool {
        self.options & flag != 0
    }
}

pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_message_has_fresh_metadata() {
        let msg = Message::new("Greet", vec![1, 2, 3]);
        assert_eq!(msg.type_name, "Greet");
        assert_eq!(msg.body, vec![1, 2, 3]);
        assert_eq!(msg.retry_attempts, 0);
        assert!(msg.error.is_none());
        assert!(msg.reply_to.is_none());
        assert_eq!(msg.options, options::NONE);
        assert_eq!(msg.priority, 0);
        assert!(msg.created_at > 0);
    }

    #[test]
    fn ids_are_unique() {
        let a = Message::new("Greet", vec![]);
        let b = Message::new("Greet", vec![]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn builders_set_fields() {
        let msg = Message::new("Greet", vec![])
            .with_reply_to("mq:custom.reply")
            .with_options(options::NOTIFY_ON_DLQ)
            .with_priority(5);
        assert_eq!(msg.reply_to.as_deref(), Some("mq:custom.reply"));
        assert!(msg.has_option(options::NOTIFY_ON_DLQ));
        assert_eq!(msg.priority, 5);
    }

    #[test]
    fn envelope_round_trips_through_json() {
        let mut msg = Message::new("Incr", b"{\"value\":1}".to_vec());
        msg.retry_attempts = 2;
        msg.error = Some(MessageError {
            code: "Transient".to_string(),
            message: "boom".to_string(),
        });
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: Message = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }
}
