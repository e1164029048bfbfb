use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use tracing::debug;

use crate::error::TransportResult;
use crate::message::{options, Message};
use crate::queue::{is_dlq, is_in_queue, TOPIC_DLQ, TOPIC_IN};

use super::{MessageFactory, MessageQueueClient};

/// One named queue: its own lock and condvar, so contention stays scoped
/// per queue — workers for different types never block on each other.
#[derive(Default)]
struct QueueCell {
    deque: Mutex<VecDeque<Message>>,
    available: Condvar,
}

impl QueueCell {
    fn push(&self, message: Message) {
        let mut deque = self.deque.lock().expect("queue mutex poisoned");
        deque.push_back(message);
        drop(deque);
        self.available.notify_one();
    }

    fn pop(&self) -> Option<Message> {
        let mut deque = self.deque.lock().expect("queue mutex poisoned");
        deque.pop_front()
    }

    fn pop_blocking(&self, timeout: Duration) -> Option<Message> {
        let deadline = Instant::now() + timeout;
        let mut deque = self.deque.lock().expect("queue mutex poisoned");
        loop {
            if let Some(message) = deque.pop_front() {
                return Some(message);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .available
                .wait_timeout(deque, deadline - now)
                .expect("queue mutex poisoned");
            deque = guard;
        }
    }

    fn len(&self) -> usize {
        self.deque.lock().expect("queue mutex poisoned").len()
    }
}

/// In-memory transport core: a map of named queues, created on first use.
/// Shared by every client and producer from one factory; queues survive
/// client drops.
///
/// Durability is whatever the process gives you — a worker that dies after
/// popping loses that in-flight message. That trade-off is accepted for
/// this transport. The priority hint is ignored: everything rides the
/// queue it was published to, in FIFO order.
#[derive(Default)]
pub struct InMemoryTransport {
    queues: Mutex<HashMap<String, Arc<QueueCell>>>,
    topics: Mutex<HashMap<String, Vec<Sender<String>>>>,
}

impl InMemoryTransport {
    /// Look up or create the cell for a queue. The map lock is held only for
    /// the lookup, never across a queue operation.
    fn cell(&self, queue: &str) -> Arc<QueueCell> {
        let mut queues = self.queues.lock().expect("queue map mutex poisoned");
        Arc::clone(queues.entry(queue.to_string()).or_default())
    }

    fn publish(&self, queue: &str, message: &Message) {
        self.cell(queue).push(message.clone());

        if is_in_queue(queue) {
            self.signal_topic(TOPIC_IN, queue);
        } else if is_dlq(queue) && message.has_option(options::NOTIFY_ON_DLQ) {
            self.signal_topic(TOPIC_DLQ, queue);
        }
    }

    fn subscribe(&self, topic: &str) -> Receiver<String> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut topics = self.topics.lock().expect("topic map mutex poisoned");
        topics.entry(topic.to_string()).or_default().push(tx);
        rx
    }

    /// Fan a queue-name notification out to topic subscribers, pruning any
    /// whose receiver has been dropped.
    fn signal_topic(&self, topic: &str, queue: &str) {
        let mut topics = self.topics.lock().expect("topic map mutex poisoned");
        if let Some(subscribers) = topics.get_mut(topic) {
            subscribers.retain(|tx| tx.send(queue.to_string()).is_ok());
            if subscribers.is_empty() {
                topics.remove(topic);
            }
        }
    }
}

/// Message factory bound to an in-memory transport instance.
#[derive(Default)]
pub struct InMemoryMessageFactory {
    transport: Arc<InMemoryTransport>,
}

impl InMemoryMessageFactory {
    pub fn new() -> Self {
        debug!("created in-memory message factory");
        Self::default()
    }
}

impl MessageFactory for InMemoryMessageFactory {
    fn create_message_queue_client(&self) -> TransportResult<Box<dyn MessageQueueClient>> {
        Ok(Box::new(InMemoryMessageQueueClient {
            transport: Arc::clone(&self.transport),
        }))
    }
}

struct InMemoryMessageQueueClient {
    transport: Arc<InMemoryTransport>,
}

impl MessageQueueClient for InMemoryMessageQueueClient {
    fn publish(&mut self, queue: &str, message: &Message) -> TransportResult<()> {
        self.transport.publish(queue, message);
        Ok(())
    }

    fn get(&mut self, queue: &str, timeout: Duration) -> TransportResult<Option<Message>> {
        Ok(self.transport.cell(queue).pop_blocking(timeout))
    }

    fn try_get(&mut self, queue: &str) -> TransportResult<Option<Message>> {
        Ok(self.transport.cell(queue).pop())
    }

    fn depth(&mut self, queue: &str) -> TransportResult<u64> {
        Ok(self.transport.cell(queue).len() as u64)
    }

    fn subscribe_topic(&mut self, topic: &str) -> TransportResult<Receiver<String>> {
        Ok(self.transport.subscribe(topic))
    }
}
