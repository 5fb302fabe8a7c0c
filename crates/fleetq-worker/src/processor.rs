//! Per-job processing: choose a transformation and classify what happened.

use fleetq_media::{TransformRegistry, TransformRunner};
use fleetq_models::{Job, JobOutcome};
use tracing::{debug, warn};

/// Runs the transformation registered for a job's output extension.
#[derive(Debug, Clone)]
pub struct JobProcessor {
    registry: TransformRegistry,
    runner: TransformRunner,
}

impl JobProcessor {
    pub fn new(registry: TransformRegistry, runner: TransformRunner) -> Self {
        Self { registry, runner }
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// Process one job. Every failure is folded into the outcome.
    pub async fn process(&self, job: &Job) -> JobOutcome {
        let extension = job.output_extension();

        let Some(command) = self.registry.get(extension) else {
            debug!(extension = %extension, "No transformation registered");
            return JobOutcome::UnsupportedFormat {
                extension: extension.to_string(),
            };
        };

        match self.runner.run(command, job.input_url(), job.output_url()).await {
            Ok(result) if result.success() => JobOutcome::Success {
                output: result.output,
            },
            Ok(result) => JobOutcome::CommandFailure {
                exit_code: result.exit_code,
                output: result.output,
            },
            Err(e) => {
                warn!(command = %command, error = %e, "Transformation did not run to completion");
                JobOutcome::CommandFailure {
                    exit_code: None,
                    output: e.to_string().into_bytes(),
                }
            }
        }
    }
}
