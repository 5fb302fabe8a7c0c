//! Fleet error types.

use thiserror::Error;

pub type FleetResult<T> = Result<T, FleetError>;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Instance identity unavailable: {0}")]
    InstanceIdentity(String),

    #[error("Describe lifecycle state failed: {0}")]
    DescribeFailed(String),

    #[error("Complete lifecycle action failed: {0}")]
    CompleteActionFailed(String),
}

impl FleetError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn instance_identity(msg: impl Into<String>) -> Self {
        Self::InstanceIdentity(msg.into())
    }

    pub fn describe_failed(msg: impl Into<String>) -> Self {
        Self::DescribeFailed(msg.into())
    }

    pub fn complete_action_failed(msg: impl Into<String>) -> Self {
        Self::CompleteActionFailed(msg.into())
    }
}
