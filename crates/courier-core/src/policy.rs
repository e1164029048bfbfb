//! Retry/dead-letter decision logic.
//!
//! Deliberately pure: the worker pool feeds it attempt counts and a failure
//! classification, and it answers retry-or-dead-letter. No transport, no
//! clock, no state — so it unit-tests in isolation.

/// Classification of a failed processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retrying might succeed (the default for unclassified failures).
    Transient,
    /// Retrying cannot fix it — validation failures, poison payloads,
    /// undecodable bodies.
    Unretryable,
}

/// Outcome of the retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Republish to the In queue for another attempt.
    Retry,
    /// Route to the dead-letter queue; never retried automatically.
    DeadLetter,
}

/// Decide whether a failed message is retried or dead-lettered.
///
/// `attempts_so_far` counts completed processing attempts including the one
/// that just failed. With `retry_limit` N, a transiently-failing message is
/// processed exactly N times before dead-lettering; an unretryable failure
/// dead-letters unconditionally.
pub fn decide(attempts_so_far: u32, retry_limit: u32, kind: ErrorKind) -> Decision {
    match kind {
        ErrorKind::Unretryable => Decision::DeadLetter,
        ErrorKind::Transient if attempts_so_far < retry_limit => Decision::Retry,
        ErrorKind::Transient => Decision::DeadLetter,
    }
}
