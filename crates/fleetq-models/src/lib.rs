//! Shared data models for the fleetq worker pool.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs as they travel through the queue
//! - Object-store locations (`s3://bucket/key`)
//! - Per-job processing outcomes
//! - Fleet lifecycle states and hooks
//! - Object-created events used to derive jobs

pub mod error;
pub mod event;
pub mod job;
pub mod lifecycle;
pub mod object_url;
pub mod outcome;

pub use error::{ModelError, ModelResult};
pub use event::S3Event;
pub use job::{Job, Location};
pub use lifecycle::{LifecycleActionResult, LifecycleHook, LifecycleState};
pub use object_url::ObjectUrl;
pub use outcome::JobOutcome;
