mod stats;
mod worker;

pub use stats::{ServiceStats, StatsSnapshot};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::codec::{BodyCodec, JsonCodec};
use crate::config::ServiceConfig;
use crate::error::{HandlerError, ServiceError, ServiceResult, TransportResult};
use crate::message::Message;
use crate::registry::HandlerRegistry;
use crate::transport::{MessageFactory, MessageProducer, MessageQueueClient};

use worker::Worker;

/// The worker pool. Owns the handler registry and a transport factory,
/// spawns one thread per (type, slot) on `start()`, and joins every one of
/// them on `stop()`.
///
/// Per message the state machine is `Received → Processing → {Succeeded,
/// Failed-Retryable, Failed-Terminal}`: responses go to `reply_to` or the
/// Out queue, transient failures self-requeue until the retry limit, and
/// terminal failures land on the dead-letter queue (see
/// [`policy::decide`](crate::policy::decide)).
pub struct MessageService {
    factory: Arc<dyn MessageFactory>,
    registry: HandlerRegistry,
    config: ServiceConfig,
    running: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<ServiceStats>,
}

impl MessageService {
    pub fn new(factory: Arc<dyn MessageFactory>) -> Self {
        Self::with_config(factory, ServiceConfig::default())
    }

    pub fn with_config(factory: Arc<dyn MessageFactory>, config: ServiceConfig) -> Self {
        Self::with_registry(factory, HandlerRegistry::new(), config)
    }

    /// Construct around a pre-populated registry. The registry is owned by
    /// the service — its lifecycle is the service's, not the process's.
    pub fn with_registry(
        factory: Arc<dyn MessageFactory>,
        registry: HandlerRegistry,
        config: ServiceConfig,
    ) -> Self {
        Self {
            factory,
            registry,
            config,
            running: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
            stats: Arc::new(ServiceStats::default()),
        }
    }

    /// Register a typed handler with one worker slot and the default JSON
    /// codec. Startup-only: rejected once the service is running.
    pub fn register_handler<Req, Res, F>(&mut self, handler: F) -> ServiceResult<()>
    where
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + Send + 'static,
        F: Fn(&Message, Req) -> Result<Option<Res>, HandlerError> + Send + Sync + 'static,
    {
        self.register_handler_with(1, None, handler)
    }

    /// Register a typed handler with an explicit worker-slot count and an
    /// optional per-type retry-limit override.
    pub fn register_handler_with<Req, Res, F>(
        &mut self,
        workers: usize,
        retry_limit: Option<u32>,
        handler: F,
    ) -> ServiceResult<()>
    where
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + Send + 'static,
        F: Fn(&Message, Req) -> Result<Option<Res>, HandlerError> + Send + Sync + 'static,
    {
        self.register_handler_with_codec(workers, retry_limit, JsonCodec, handler)
    }

    /// Register a typed handler with a custom body codec. The same codec
    /// must be used by whoever publishes this type.
    pub fn register_handler_with_codec<Req, Res, F, C>(
        &mut self,
        workers: usize,
        retry_limit: Option<u32>,
        codec: C,
        handler: F,
    ) -> ServiceResult<()>
    where
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + Send + 'static,
        F: Fn(&Message, Req) -> Result<Option<Res>, HandlerError> + Send + Sync + 'static,
        C: BodyCodec,
    {
        if self.running.load(Ordering::Acquire) {
            return Err(ServiceError::AlreadyStarted);
        }
        self.registry.register(workers, retry_limit, codec, handler)
    }

    /// Spawn the configured worker slots for every registered type.
    ///
    /// All worker clients are created up front, so a dead transport aborts
    /// the start with no workers left running instead of spawning a pool
    /// that cannot function. Calling `start()` on a running service is an
    /// error — workers are never double-spawned. Messages published before
    /// this call have been accumulating on their In queues and are picked
    /// up now.
    pub fn start(&mut self) -> ServiceResult<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(ServiceError::AlreadyStarted);
        }

        let mut pending = Vec::new();
        for entry in self.registry.entries() {
            for slot in 0..entry.workers {
                match self.factory.create_message_queue_client() {
                    Ok(client) => pending.push((Arc::clone(entry), slot, client)),
                    Err(e) => {
                        self.running.store(false, Ordering::Release);
                        return Err(e.into());
                    }
                }
            }
        }

        for (entry, slot, client) in pending {
            let name = format!("courier-{}-{slot}", entry.type_name);
            let worker = Worker {
                entry,
                slot,
                client,
                running: Arc::clone(&self.running),
                config: self.config.clone(),
                stats: Arc::clone(&self.stats),
            };
            match thread::Builder::new().name(name).spawn(move || worker.run()) {
                Ok(handle) => self.workers.push(handle),
                Err(e) => {
                    // Roll back the slots already spawned before reporting
                    self.stop();
                    return Err(ServiceError::WorkerSpawn(e.to_string()));
                }
            }
        }

        info!(
            types = self.registry.len(),
            workers = self.workers.len(),
            "message service started"
        );
        Ok(())
    }

    /// Cooperative shutdown: clear the run flag and join every worker.
    /// In-flight handler invocations finish; blocked receives wake within
    /// the receive timeout. A true barrier — when this returns, no worker
    /// thread remains. Idempotent.
    pub fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        if !was_running && self.workers.is_empty() {
            return;
        }
        info!("stopping message service");
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked during shutdown");
            }
        }
        info!("message service stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// A producer bound to this service's transport.
    pub fn create_message_producer(&self) -> TransportResult<MessageProducer> {
        self.factory.create_message_producer()
    }

    /// A raw client bound to this service's transport — the administrative
    /// surface for dead-letter inspection (`try_get`/`depth` on a DLQ).
    pub fn create_message_queue_client(&self) -> TransportResult<Box<dyn MessageQueueClient>> {
        self.factory.create_message_queue_client()
    }
}

impl Drop for MessageService {
    fn drop(&mut self) {
        // If stop() wasn't called explicitly, join the workers here
        self.stop();
    }
}

#[cfg(test)]
mod tests;
