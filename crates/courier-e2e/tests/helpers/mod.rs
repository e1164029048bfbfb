#![allow(dead_code)]

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use courier_core::ServiceConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Greet {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GreetResponse {
    pub result: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Incr {
    pub value: i64,
}

/// Service config with test-friendly timings: short receive timeout so
/// `stop()` is fast, short backoff so a flapping transport doesn't stall a
/// test. Also wires up tracing so worker logs surface under
/// `RUST_LOG=debug`.
pub fn fast_config() -> ServiceConfig {
    courier_core::telemetry::init_tracing();
    ServiceConfig {
        receive_timeout_ms: 20,
        error_backoff_ms: 20,
        ..Default::default()
    }
}

/// Poll `predicate` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, predicate: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}

/// Connection string for the live-Redis tests (`#[ignore]`d by default).
pub fn redis_url() -> String {
    std::env::var("COURIER_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string())
}
