use super::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(super) struct Greet {
    pub(super) name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(super) struct GreetResponse {
    pub(super) result: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub(super) struct Incr {
    pub(super) value: i64,
}

/// Service over a fresh in-memory transport with snappy test timings.
pub(super) fn test_service() -> (MessageService, Arc<InMemoryMessageFactory>) {
    let factory = Arc::new(InMemoryMessageFactory::new());
    let config = ServiceConfig {
        retry_limit: 3,
        receive_timeout_ms: 20,
        error_backoff_ms: 20,
    };
    let service = MessageService::with_config(
        Arc::clone(&factory) as Arc<dyn MessageFactory>,
        config,
    );
    (service, factory)
}

/// Poll `predicate` until it holds or `timeout` elapses.
pub(super) fn wait_until(timeout: Duration, predicate: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}

/// Blocking receive with a test-friendly timeout, panicking on transport
/// errors (the in-memory transport has none).
pub(super) fn recv(
    client: &mut Box<dyn MessageQueueClient>,
    queue: &str,
    timeout: Duration,
) -> Option<Message> {
    client.get(queue, timeout).expect("in-memory get failed")
}
