//! End-to-end tests for the courier workspace live in `tests/`.
//! This crate intentionally exports nothing.
