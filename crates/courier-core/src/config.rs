use std::time::Duration;

use serde::Deserialize;

/// Message service configuration, deserializable from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Total processing attempts before a transiently-failing message is
    /// dead-lettered. Handler registrations may override this per type.
    pub retry_limit: u32,
    /// How long a worker blocks on an empty In queue before re-checking the
    /// run flag. Bounds `stop()` latency.
    pub receive_timeout_ms: u64,
    /// Pause after a transport error in the receive loop, so a down broker
    /// is not busy-polled.
    pub error_backoff_ms: u64,
}

impl ServiceConfig {
    /// Default retry limit: 3 total attempts.
    pub const DEFAULT_RETRY_LIMIT: u32 = 3;

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            retry_limit: Self::DEFAULT_RETRY_LIMIT,
            receive_timeout_ms: 250,
            error_backoff_ms: 1_000,
        }
    }
}
