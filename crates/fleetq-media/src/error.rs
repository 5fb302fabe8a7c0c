//! Error types for transformation commands.

use std::time::Duration;

use thiserror::Error;

/// Result type for transformation operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while running a transformation.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Program not found in PATH: {0}")]
    ProgramNotFound(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid transform definition: {0}")]
    InvalidTransform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    pub fn invalid_transform(message: impl Into<String>) -> Self {
        Self::InvalidTransform(message.into())
    }
}
