use super::*;
use crate::message::MessageError;
use crate::transport::InMemoryMessageFactory;
use std::sync::atomic::AtomicU32;
use std::time::{Duration, Instant};

mod common;
use common::*;

mod retry;
