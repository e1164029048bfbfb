//! Queue name derivation.
//!
//! Every queue the core touches follows a fixed, non-configurable template
//! derived from a message type's logical name. Admin tools rely on the
//! convention to locate dead-lettered work, so the template is part of the
//! external contract.

/// Prefix shared by every queue name the core derives.
pub const QUEUE_PREFIX: &str = "mq:";

/// Broadcast channel signalled when new work lands on any In queue.
/// Carries the name of the queue that received work — never payloads.
pub const TOPIC_IN: &str = "mq:topic:in";

/// Broadcast channel signalled when a message carrying
/// [`options::NOTIFY_ON_DLQ`](crate::message::options::NOTIFY_ON_DLQ)
/// is dead-lettered.
pub const TOPIC_DLQ: &str = "mq:topic:dlq";

const IN_SUFFIX: &str = ".in";
const OUT_SUFFIX: &str = ".out";
const DLQ_SUFFIX: &str = ".dlq";
const PRIORITY_SUFFIX: &str = ".priority";

/// The conventional queue names for one logical message type.
///
/// Pure derivation: constructing this twice for the same type yields
/// identical names, and distinct type names never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueNames {
    type_name: String,
}

impl QueueNames {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }

    /// Derive the name set for a Rust type via [`short_type_name`].
    pub fn for_type<T>() -> Self {
        Self::new(short_type_name::<T>())
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Inbound work queue: `mq:{T}.in`.
    pub fn in_queue(&self) -> String {
        format!("{QUEUE_PREFIX}{}{IN_SUFFIX}", self.type_name)
    }

    /// Reply/outbound queue: `mq:{T}.out`.
    pub fn out_queue(&self) -> String {
        format!("{QUEUE_PREFIX}{}{OUT_SUFFIX}", self.type_name)
    }

    /// Dead-letter queue: `mq:{T}.dlq`.
    pub fn dlq(&self) -> String {
        format!("{QUEUE_PREFIX}{}{DLQ_SUFFIX}", self.type_name)
    }

    /// Priority queue: `mq:{T}.priority`. Drained before the In queue by
    /// transports that honor the priority hint.
    pub fn priority_queue(&self) -> String {
        format!("{QUEUE_PREFIX}{}{PRIORITY_SUFFIX}", self.type_name)
    }
}

/// True when `queue` is some type's In queue.
pub fn is_in_queue(queue: &str) -> bool {
    queue.starts_with(QUEUE_PREFIX) && queue.ends_with(IN_SUFFIX)
}

/// True when `queue` is some type's dead-letter queue.
pub fn is_dlq(queue: &str) -> bool {
    queue.starts_with(QUEUE_PREFIX) && queue.ends_with(DLQ_SUFFIX)
}

/// The priority-queue sibling of an In queue name. Names that are not In
/// queues are returned unchanged.
pub fn priority_variant(in_queue: &str) -> String {
    match in_queue.strip_suffix(IN_SUFFIX) {
        Some(base) if in_queue.starts_with(QUEUE_PREFIX) => {
            format!("{base}{PRIORITY_SUFFIX}")
        }
        _ => in_queue.to_string(),
    }
}

/// Logical name of a Rust type: the final path segment of
/// `std::any::type_name`.
pub fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
