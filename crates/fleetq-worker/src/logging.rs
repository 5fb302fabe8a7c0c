//! Structured job logging utilities.
//!
//! Every line carries the worker index and the job's output location, which
//! is the only stable identifier a job has.

use tracing::{error, info, warn, Span};

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    worker: usize,
    output: String,
}

impl JobLogger {
    pub fn new(worker: usize, output: &str) -> Self {
        Self {
            worker,
            output: output.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            worker = self.worker,
            output = %self.output,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            worker = self.worker,
            output = %self.output,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            worker = self.worker,
            output = %self.output,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            worker = self.worker,
            output = %self.output,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            worker = self.worker,
            output = %self.output,
            "Job completed: {}", message
        );
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", worker = self.worker, output = %self.output)
    }
}
