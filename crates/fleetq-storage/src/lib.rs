//! S3 object store client.
//!
//! This crate provides:
//! - The `ObjectStore` contract used to write artifacts beside job outputs
//! - An S3 implementation

pub mod client;
pub mod error;

pub use client::{content_type_for, ObjectStore, S3Client, S3Config};
pub use error::{StorageError, StorageResult};
