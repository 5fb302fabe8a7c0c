//! A single worker loop.
//!
//! ```text
//! Running --(signal | Terminating:Wait)--> Draining --> Stopped
//! ```
//!
//! Stop conditions are checked between jobs only. A job that has been leased
//! is always processed, reported and acknowledged before the worker stops.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fleetq_fleet::FleetMonitor;
use fleetq_models::JobOutcome;
use fleetq_queue::{Lease, QueueClient};
use tokio::sync::watch;
use tracing::{info, warn, Instrument};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::processor::JobProcessor;
use crate::reporter::ResultReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Draining,
    Stopped,
}

/// Why a worker stopped taking new jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainReason {
    /// SIGTERM or SIGINT
    Signal,
    /// The fleet controller is terminating this instance
    FleetTermination,
}

/// Stop conditions each worker polls on its own.
#[derive(Debug, Clone)]
pub struct StopSignal {
    shutdown: watch::Receiver<bool>,
    fleet: FleetMonitor,
}

impl StopSignal {
    pub fn new(shutdown: watch::Receiver<bool>, fleet: FleetMonitor) -> Self {
        Self { shutdown, fleet }
    }

    /// The reason to drain now, if any.
    pub async fn check(&self) -> Option<DrainReason> {
        if *self.shutdown.borrow() {
            return Some(DrainReason::Signal);
        }
        if self.fleet.should_drain().await {
            return Some(DrainReason::FleetTermination);
        }
        None
    }
}

/// Shared collaborators handed to every worker.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<dyn QueueClient>,
    pub processor: Arc<JobProcessor>,
    pub reporter: Arc<ResultReporter>,
    /// Lease length requested per receive
    pub visibility_timeout: Duration,
    /// Long-poll wait per receive
    pub wait_time: Duration,
}

/// What a worker did before it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    pub index: usize,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub drain_reason: Option<DrainReason>,
}

impl WorkerSummary {
    pub fn jobs_processed(&self) -> u64 {
        self.jobs_succeeded + self.jobs_failed
    }
}

pub struct Worker {
    index: usize,
    context: WorkerContext,
    stop: StopSignal,
    state: WorkerState,
    summary: WorkerSummary,
}

impl Worker {
    pub fn new(index: usize, context: WorkerContext, stop: StopSignal) -> Self {
        Self {
            index,
            context,
            stop,
            state: WorkerState::Running,
            summary: WorkerSummary {
                index,
                jobs_succeeded: 0,
                jobs_failed: 0,
                drain_reason: None,
            },
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Run until drained. An error ends this worker only.
    pub async fn run(mut self) -> WorkerResult<WorkerSummary> {
        info!(worker = self.index, "Worker started");

        while self.state == WorkerState::Running {
            if let Some(reason) = self.stop.check().await {
                self.drain(reason);
                break;
            }

            let Some(lease) = self
                .context
                .queue
                .receive_one(self.context.visibility_timeout, self.context.wait_time)
                .await
            else {
                continue;
            };

            let outcome = self.handle(lease).await?;
            if outcome.is_success() {
                self.summary.jobs_succeeded += 1;
            } else {
                self.summary.jobs_failed += 1;
            }
        }

        self.state = WorkerState::Stopped;
        info!(
            worker = self.index,
            succeeded = self.summary.jobs_succeeded,
            failed = self.summary.jobs_failed,
            "Worker stopped"
        );
        Ok(self.summary)
    }

    fn drain(&mut self, reason: DrainReason) {
        info!(worker = self.index, reason = ?reason, "Draining");
        self.state = WorkerState::Draining;
        self.summary.drain_reason = Some(reason);
    }

    /// Process, report, then acknowledge one leased job.
    async fn handle(&self, lease: Lease) -> WorkerResult<JobOutcome> {
        let Lease { job, token } = lease;
        let logger = JobLogger::new(self.index, job.output_url());

        async {
            logger.log_start(job.input_url());
            let started = Instant::now();

            let outcome = self.context.processor.process(&job).await;
            match &outcome {
                JobOutcome::Success { output } => {
                    logger.log_progress(String::from_utf8_lossy(output).trim_end())
                }
                JobOutcome::CommandFailure { output, .. } => {
                    logger.log_error(String::from_utf8_lossy(output).trim_end())
                }
                JobOutcome::UnsupportedFormat { extension } => {
                    logger.log_warning(&format!("unsupported format {extension}"))
                }
            }

            self.context.reporter.report(self.index, &job, &outcome).await?;

            if let Err(e) = self.context.queue.acknowledge(&token).await {
                // The lease will expire and the job will run again.
                warn!(worker = self.index, lease = %token, error = %e, "Acknowledge failed");
                metrics::record_ack_failure();
            }

            metrics::record_job(outcome.label(), started.elapsed().as_secs_f64());
            logger.log_completion(outcome.label());
            Ok::<_, WorkerError>(outcome)
        }
        .instrument(logger.create_span())
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fleetq_media::{TransformCommand, TransformRegistry, TransformRunner};
    use fleetq_models::{Job, ObjectUrl};
    use fleetq_notify::{Notifier, NotifyResult};
    use fleetq_queue::MemoryQueue;
    use fleetq_storage::{ObjectStore, StorageResult};
    use std::path::Path;

    struct Silent;

    #[async_trait]
    impl Notifier for Silent {
        async fn publish(&self, _topic: &str, _message: &str) -> NotifyResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl ObjectStore for Silent {
        async fn upload_file(&self, _path: &Path, _object: &ObjectUrl, _content_type: &str) -> StorageResult<()> {
            Ok(())
        }
    }

    fn context(queue: Arc<MemoryQueue>, dir: &Path) -> WorkerContext {
        let mut registry = TransformRegistry::new();
        registry.register("wav", TransformCommand::new("sh").arg("-c").arg("exit 0"));

        WorkerContext {
            queue,
            processor: Arc::new(JobProcessor::new(registry, TransformRunner::new())),
            reporter: Arc::new(ResultReporter::new(Arc::new(Silent), Arc::new(Silent), dir)),
            visibility_timeout: Duration::from_secs(60),
            wait_time: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_signal_before_start_leases_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let queue = Arc::new(MemoryQueue::new());
        queue
            .send(&Job::new("s3://b/input/a.wav", "s3://b/output/a.wav"))
            .await
            .unwrap();

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let worker = Worker::new(
            0,
            context(queue.clone(), dir.path()),
            StopSignal::new(rx, FleetMonitor::standalone()),
        );
        assert_eq!(worker.state(), WorkerState::Running);

        let summary = worker.run().await.unwrap();
        assert_eq!(summary.drain_reason, Some(DrainReason::Signal));
        assert_eq!(summary.jobs_processed(), 0);
        assert_eq!(queue.receive_count(), 0);
    }

    #[tokio::test]
    async fn test_processes_until_signalled() {
        let dir = tempfile::tempdir().unwrap();
        let queue = Arc::new(MemoryQueue::new());
        queue
            .send(&Job::new("s3://b/input/a.wav", "s3://b/output/a.wav"))
            .await
            .unwrap();
        queue
            .send(&Job::new("s3://b/input/a.ogg", "s3://b/output/a.ogg"))
            .await
            .unwrap();

        let (tx, rx) = watch::channel(false);
        let worker = Worker::new(
            1,
            context(queue.clone(), dir.path()),
            StopSignal::new(rx, FleetMonitor::standalone()),
        );
        let handle = tokio::spawn(worker.run());

        while !queue.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tx.send(true).unwrap();

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.index, 1);
        assert_eq!(summary.jobs_succeeded, 1);
        assert_eq!(summary.jobs_failed, 1);
        assert_eq!(queue.deleted_count(), 2);
    }
}
