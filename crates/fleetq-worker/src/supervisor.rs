//! Worker pool supervisor.
//!
//! Spawns the workers, completes the startup hook while they run, joins
//! them, then completes the termination hook.

use fleetq_fleet::FleetMonitor;
use fleetq_models::LifecycleHook;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::metrics;
use crate::retry::{retry_async, RetryConfig, RetryResult};
use crate::worker::{StopSignal, Worker, WorkerContext, WorkerSummary};

/// How the pool ended.
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    /// Workers started
    pub workers: usize,
    /// Workers that drained normally
    pub completed: Vec<WorkerSummary>,
    /// Workers that ended with an error or panicked
    pub failed: usize,
    pub startup_handshake: bool,
    pub termination_handshake: bool,
}

impl PoolReport {
    /// True when no worker drained normally.
    pub fn all_failed(&self) -> bool {
        self.workers > 0 && self.failed == self.workers
    }

    pub fn jobs_processed(&self) -> u64 {
        self.completed.iter().map(WorkerSummary::jobs_processed).sum()
    }
}

pub struct WorkerPool {
    concurrency: usize,
    context: WorkerContext,
    fleet: FleetMonitor,
    handshake_retry: RetryConfig,
}

impl WorkerPool {
    pub fn new(concurrency: usize, context: WorkerContext, fleet: FleetMonitor) -> Self {
        Self {
            concurrency: concurrency.max(1),
            context,
            fleet,
            handshake_retry: RetryConfig::new("lifecycle_handshake"),
        }
    }

    /// Override the backoff used for lifecycle actions.
    pub fn with_handshake_retry(mut self, retry: RetryConfig) -> Self {
        self.handshake_retry = retry;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run the pool until every worker has stopped.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> PoolReport {
        let mut report = PoolReport {
            workers: self.concurrency,
            ..Default::default()
        };

        let mut workers = JoinSet::new();
        for index in 0..self.concurrency {
            let stop = StopSignal::new(shutdown.clone(), self.fleet.clone());
            let worker = Worker::new(index, self.context.clone(), stop);
            workers.spawn(async move { (index, worker.run().await) });
        }
        metrics::set_active_workers(self.concurrency);
        info!(
            workers = self.concurrency,
            managed = self.fleet.is_managed(),
            "Worker pool started"
        );

        // Workers are already polling; the hook only tells the controller so.
        report.startup_handshake = self.handshake(LifecycleHook::Startup).await;

        let mut live = self.concurrency;
        while let Some(joined) = workers.join_next().await {
            live -= 1;
            metrics::set_active_workers(live);

            match joined {
                Ok((_, Ok(summary))) => report.completed.push(summary),
                Ok((index, Err(e))) => {
                    report.failed += 1;
                    error!(
                        worker = index,
                        remaining = live,
                        error = ?e,
                        "Worker failed: {}", e
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!(remaining = live, error = %e, "Worker task aborted");
                }
            }
        }

        if report.failed > 0 {
            warn!(
                failed = report.failed,
                workers = report.workers,
                "Pool ran below capacity"
            );
        }

        report.termination_handshake = self.handshake(LifecycleHook::Termination).await;

        info!(
            jobs = report.jobs_processed(),
            failed_workers = report.failed,
            "Worker pool stopped"
        );
        report
    }

    /// Complete a lifecycle hook if it is pending. Never fails the pool.
    async fn handshake(&self, hook: LifecycleHook) -> bool {
        if !self.fleet.is_managed() {
            return false;
        }

        let retry = self
            .handshake_retry
            .clone()
            .with_operation_name(format!("{hook}_handshake"));

        let fleet = &self.fleet;
        let result = retry_async(&retry, || async move {
            match hook {
                LifecycleHook::Startup => fleet.complete_startup().await,
                LifecycleHook::Termination => fleet.complete_termination().await,
            }
        })
        .await;

        match result {
            RetryResult::Success(sent) => {
                if sent {
                    metrics::record_handshake(hook.as_str());
                }
                sent
            }
            RetryResult::Failed { error, attempts } => {
                error!(hook = %hook, attempts, error = %error, "Lifecycle handshake failed");
                false
            }
        }
    }
}
