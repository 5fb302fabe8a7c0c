//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors that end a worker loop or abort startup.
///
/// Per-job failures are not errors; they are classified as a `JobOutcome`.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Queue error: {0}")]
    Queue(#[from] fleetq_queue::QueueError),

    #[error("Storage error: {0}")]
    Storage(#[from] fleetq_storage::StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] fleetq_notify::NotifyError),

    #[error("Fleet error: {0}")]
    Fleet(#[from] fleetq_fleet::FleetError),

    #[error("Media error: {0}")]
    Media(#[from] fleetq_media::MediaError),

    #[error("Model error: {0}")]
    Model(#[from] fleetq_models::ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
