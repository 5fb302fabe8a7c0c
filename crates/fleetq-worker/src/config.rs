//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use fleetq_media::TransformRegistry;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of workers in the pool
    pub concurrency: usize,
    /// Directory for temporary error artifacts
    pub work_dir: PathBuf,
    /// Kill a transformation after this long; defaults to the queue
    /// visibility timeout when unset
    pub command_timeout: Option<Duration>,
    /// Output extension to transformation command
    pub transforms: TransformRegistry,
    /// Prometheus listener port
    pub metrics_port: Option<u16>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: available_parallelism(),
            work_dir: PathBuf::from("/tmp/fleetq"),
            command_timeout: None,
            transforms: TransformRegistry::voice_focus_defaults(),
            metrics_port: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let transforms = match std::env::var("WORKER_TRANSFORMS") {
            Ok(spec) if !spec.trim().is_empty() => TransformRegistry::parse_spec(&spec)?,
            _ => TransformRegistry::voice_focus_defaults(),
        };

        let concurrency = match std::env::var("WORKER_CONCURRENCY") {
            Ok(value) => match value.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(WorkerError::config_error(format!(
                        "WORKER_CONCURRENCY must be a positive integer, got '{value}'"
                    )))
                }
            },
            Err(_) => available_parallelism(),
        };

        Ok(Self {
            concurrency,
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/fleetq")),
            command_timeout: std::env::var("WORKER_COMMAND_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            transforms,
            metrics_port: std::env::var("METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
        })
    }

    /// Command timeout, falling back to the lease length.
    pub fn command_timeout_or(&self, visibility_timeout: Duration) -> Duration {
        self.command_timeout.unwrap_or(visibility_timeout)
    }
}

/// Available compute units, at least one.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
