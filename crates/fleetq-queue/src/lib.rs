//! Leased job queue.
//!
//! This crate provides:
//! - The `QueueClient` contract: send, long-poll receive with a lease, acknowledge
//! - An SQS backend
//! - An in-process backend with the same lease semantics

pub mod error;
pub mod memory;
pub mod queue;
pub mod sqs;

pub use error::{QueueError, QueueResult};
pub use memory::MemoryQueue;
pub use queue::{Lease, LeaseToken, QueueClient, QueueConfig, MAX_VISIBILITY_TIMEOUT, MAX_WAIT_TIME};
pub use sqs::SqsQueue;
