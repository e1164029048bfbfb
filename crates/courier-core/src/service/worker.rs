use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::ServiceConfig;
use crate::error::HandlerError;
use crate::message::{Message, MessageError};
use crate::policy::{decide, Decision};
use crate::registry::HandlerEntry;
use crate::transport::MessageQueueClient;

use super::stats::ServiceStats;

/// One worker slot: a blocking receive loop against its type's priority and
/// In queues. Owns its transport client exclusively; the dead-letter queue
/// is never read here — only published to.
pub(super) struct Worker {
    pub(super) entry: Arc<HandlerEntry>,
    pub(super) slot: usize,
    pub(super) client: Box<dyn MessageQueueClient>,
    pub(super) running: Arc<AtomicBool>,
    pub(super) config: ServiceConfig,
    pub(super) stats: Arc<ServiceStats>,
}

impl Worker {
    /// Receive loop. Exits when the shared run flag clears; an in-flight
    /// handler invocation always finishes first. Blocked receives wake at
    /// the configured receive timeout and re-check the flag, so `stop()` is
    /// a bounded wait rather than transport-level cancellation.
    pub(super) fn run(mut self) {
        let in_queue = self.entry.queues.in_queue();
        let priority_queue = self.entry.queues.priority_queue();
        let timeout = self.config.receive_timeout();
        debug!(type_name = %self.entry.type_name, slot = self.slot, "worker started");

        while self.running.load(Ordering::Acquire) {
            let received = match self.client.try_get(&priority_queue) {
                Ok(Some(message)) => Ok(Some(message)),
                Ok(None) => self.client.get(&in_queue, timeout),
                Err(e) => Err(e),
            };
            match received {
                Ok(Some(message)) => self.process(message),
                Ok(None) => {}
                Err(e) => {
                    // The loop must survive a flapping broker: log, back
                    // off, keep the slot alive.
                    error!(
                        type_name = %self.entry.type_name,
                        slot = self.slot,
                        error = %e,
                        "receive failed"
                    );
                    std::thread::sleep(self.config.error_backoff());
                }
            }
        }

        debug!(type_name = %self.entry.type_name, slot = self.slot, "worker stopped");
    }

    /// Drive one envelope through Received → Processing → terminal state.
    fn process(&mut self, message: Message) {
        self.stats.record_received();
        debug!(
            msg_id = %message.id,
            type_name = %message.type_name,
            attempts = message.retry_attempts,
            "processing message"
        );

        match (self.entry.handler)(&message) {
            Ok(response) => self.succeed(message, response),
            Err(err) => self.fail(message, err),
        }
    }

    /// Publish the response to `reply_to` if set, else the type's Out queue.
    /// One-way handlers return no response and publish nothing; either way
    /// the consumed envelope is discarded.
    fn succeed(&mut self, message: Message, response: Option<Vec<u8>>) {
        self.stats.record_succeeded();
        let Some(body) = response else {
            return;
        };

        let reply_queue = message
            .reply_to
            .clone()
            .unwrap_or_else(|| self.entry.queues.out_queue());
        let reply = Message::new(self.entry.response_type_name.clone(), body);
        if let Err(e) = self.client.publish(&reply_queue, &reply) {
            error!(msg_id = %message.id, queue = %reply_queue, error = %e, "failed to publish reply");
        }
    }

    /// Record the failure into the envelope, then retry or dead-letter per
    /// the policy. Nothing here may escape — a crashed worker permanently
    /// stops the slot.
    fn fail(&mut self, mut message: Message, err: HandlerError) {
        message.retry_attempts += 1;
        message.error = Some(MessageError::from(&err));
        let retry_limit = self.entry.retry_limit.unwrap_or(self.config.retry_limit);

        match decide(message.retry_attempts, retry_limit, err.kind()) {
            Decision::Retry => {
                warn!(
                    msg_id = %message.id,
                    attempts = message.retry_attempts,
                    retry_limit,
                    error = %err,
                    "retrying message"
                );
                self.stats.record_retried();
                // Self-requeue: back of the same In queue, so newer messages
                // may overtake the retry
                let in_queue = self.entry.queues.in_queue();
                if let Err(e) = self.client.publish(&in_queue, &message) {
                    error!(msg_id = %message.id, error = %e, "retry republish failed, dead-lettering");
                    self.dead_letter(message);
                }
            }
            Decision::DeadLetter => {
                warn!(
                    msg_id = %message.id,
                    attempts = message.retry_attempts,
                    error = %err,
                    "dead-lettering message"
                );
                self.dead_letter(message);
            }
        }
    }

    fn dead_letter(&mut self, message: Message) {
        self.stats.record_dead_lettered();
        let dlq = self.entry.queues.dlq();
        if let Err(e) = self.client.publish(&dlq, &message) {
            error!(msg_id = %message.id, queue = %dlq, error = %e, "failed to publish to dead-letter queue");
            return;
        }
        // Request/reply callers get the terminal failure on their reply
        // queue; the Out queue never sees failures.
        if let Some(reply_to) = message.reply_to.clone() {
            if let Err(e) = self.client.publish(&reply_to, &message) {
                warn!(msg_id = %message.id, queue = %reply_to, error = %e, "failed to publish failure reply");
            }
        }
    }
}
