//! Self-scaling queue worker pool.
//!
//! This crate provides:
//! - The per-job processor and result reporter
//! - The worker loop with cooperative draining
//! - The pool supervisor and its lifecycle handshakes
//! - Signal handling, metrics and structured job logging

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod reporter;
pub mod retry;
pub mod shutdown;
pub mod supervisor;
pub mod worker;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use processor::JobProcessor;
pub use reporter::ResultReporter;
pub use retry::RetryConfig;
pub use shutdown::install_shutdown_handler;
pub use supervisor::{PoolReport, WorkerPool};
pub use worker::{DrainReason, StopSignal, Worker, WorkerContext, WorkerState, WorkerSummary};
