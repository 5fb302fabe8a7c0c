//! Worker metrics.
//!
//! Provides standardized metrics for monitoring the pool:
//! - Job counters by outcome and duration histograms
//! - Acknowledgment, notification and artifact upload failures
//! - Active worker gauge
//! - Lifecycle handshakes sent

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

/// Metric name constants for consistency.
pub mod names {
    /// Jobs processed, by outcome.
    pub const JOBS_TOTAL: &str = "fleetq_jobs_total";

    /// Job processing time in seconds, by outcome.
    pub const JOB_DURATION_SECONDS: &str = "fleetq_job_duration_seconds";

    /// Failed acknowledgments.
    pub const ACK_FAILURES_TOTAL: &str = "fleetq_ack_failures_total";

    /// Failed notification publishes.
    pub const NOTIFY_FAILURES_TOTAL: &str = "fleetq_notify_failures_total";

    /// Failed error artifact uploads.
    pub const ARTIFACT_UPLOAD_FAILURES_TOTAL: &str = "fleetq_artifact_upload_failures_total";

    /// Workers still running.
    pub const ACTIVE_WORKERS: &str = "fleetq_active_workers";

    /// Lifecycle actions completed, by hook.
    pub const HANDSHAKES_TOTAL: &str = "fleetq_lifecycle_handshakes_total";
}

/// Install the Prometheus exporter when a port is configured.
pub fn init_metrics(port: Option<u16>) -> WorkerResult<()> {
    let Some(port) = port else {
        return Ok(());
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("metrics exporter: {e}")))?;

    info!("Prometheus metrics listening on {}", addr);
    Ok(())
}

pub fn record_job(outcome: &'static str, duration_secs: f64) {
    counter!(names::JOBS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "outcome" => outcome).record(duration_secs);
}

pub fn record_ack_failure() {
    counter!(names::ACK_FAILURES_TOTAL).increment(1);
}

pub fn record_notify_failure() {
    counter!(names::NOTIFY_FAILURES_TOTAL).increment(1);
}

pub fn record_artifact_upload_failure() {
    counter!(names::ARTIFACT_UPLOAD_FAILURES_TOTAL).increment(1);
}

pub fn set_active_workers(count: usize) {
    gauge!(names::ACTIVE_WORKERS).set(count as f64);
}

pub fn record_handshake(hook: &'static str) {
    counter!(names::HANDSHAKES_TOTAL, "hook" => hook).increment(1);
}
