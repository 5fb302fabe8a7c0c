//! Queue error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Enqueue failed: {0}")]
    EnqueueFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Acknowledge failed: {0}")]
    AcknowledgeFailed(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Model error: {0}")]
    Model(#[from] fleetq_models::ModelError),
}

impl QueueError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn enqueue_failed(msg: impl Into<String>) -> Self {
        Self::EnqueueFailed(msg.into())
    }

    pub fn receive_failed(msg: impl Into<String>) -> Self {
        Self::ReceiveFailed(msg.into())
    }

    pub fn acknowledge_failed(msg: impl Into<String>) -> Self {
        Self::AcknowledgeFailed(msg.into())
    }

    pub fn malformed_message(msg: impl Into<String>) -> Self {
        Self::MalformedMessage(msg.into())
    }
}
