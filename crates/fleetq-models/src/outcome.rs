//! Per-job processing outcomes.

use crate::job::Job;

/// Classified result of processing one job.
///
/// Every variant is terminal: the message is acknowledged after the outcome
/// has been reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Command exited 0
    Success { output: Vec<u8> },
    /// Command exited non-zero, was killed, or could not be started
    CommandFailure {
        exit_code: Option<i32>,
        output: Vec<u8>,
    },
    /// No transformation is registered for the output extension
    UnsupportedFormat { extension: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success { .. })
    }

    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Success { .. } => "success",
            JobOutcome::CommandFailure { .. } => "command_failure",
            JobOutcome::UnsupportedFormat { .. } => "unsupported_format",
        }
    }

    /// Human-readable notification text for this outcome.
    pub fn message(&self, job: &Job) -> String {
        let output = job.output_url();
        match self {
            JobOutcome::Success { .. } => format!("Processing job for {output} succeeded"),
            JobOutcome::CommandFailure {
                exit_code: Some(code),
                ..
            } => format!(
                "Processing job for {output} failed. Reason: transformation command exited with status {code}"
            ),
            JobOutcome::CommandFailure { exit_code: None, .. } => format!(
                "Processing job for {output} failed. Reason: transformation command did not complete"
            ),
            JobOutcome::UnsupportedFormat { extension } => format!(
                "Processing job for {output} failed. Reason: Input format {extension} not supported"
            ),
        }
    }

    /// Body of the error artifact written beside the output, if any.
    ///
    /// Command failures carry the captured output verbatim; unsupported
    /// formats carry the constructed message.
    pub fn error_artifact(&self, job: &Job) -> Option<Vec<u8>> {
        match self {
            JobOutcome::Success { .. } => None,
            JobOutcome::CommandFailure { output, .. } => Some(output.clone()),
            JobOutcome::UnsupportedFormat { .. } => Some(self.message(job).into_bytes()),
        }
    }
}
