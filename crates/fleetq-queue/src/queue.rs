//! Queue contract shared by all backends.

use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use fleetq_models::Job;

use crate::error::{QueueError, QueueResult};

/// Longest long-poll wait SQS accepts.
pub const MAX_WAIT_TIME: Duration = Duration::from_secs(20);

/// Longest visibility timeout SQS accepts (12 hours).
pub const MAX_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(43_200);

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue URL
    pub queue_url: String,
    /// AWS region
    pub region: String,
    /// Endpoint override (local emulators)
    pub endpoint_url: Option<String>,
    /// How long a received job stays invisible to other workers.
    /// Must exceed the worst-case processing time.
    pub visibility_timeout: Duration,
    /// Long-poll wait per receive call
    pub wait_time: Duration,
    /// Pause after a failed receive call
    pub error_backoff: Duration,
}

impl QueueConfig {
    /// Create a config with default timeouts.
    pub fn new(queue_url: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            region: region.into(),
            endpoint_url: None,
            visibility_timeout: Duration::from_secs(3600), // 1 hour
            wait_time: Duration::from_secs(5),
            error_backoff: Duration::from_millis(1000),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        let queue_url = std::env::var("SQS_URL")
            .map_err(|_| QueueError::config_error("SQS_URL not set"))?;
        let region = std::env::var("AWS_REGION")
            .map_err(|_| QueueError::config_error("AWS_REGION not set"))?;

        Ok(Self {
            queue_url,
            region,
            endpoint_url: std::env::var("AWS_ENDPOINT_URL").ok().filter(|s| !s.is_empty()),
            visibility_timeout: Duration::from_secs(env_number(
                "QUEUE_VISIBILITY_TIMEOUT_SECS",
                3600,
                0..=MAX_VISIBILITY_TIMEOUT.as_secs(),
            )?),
            wait_time: Duration::from_secs(env_number(
                "QUEUE_WAIT_TIME_SECS",
                5,
                1..=MAX_WAIT_TIME.as_secs(),
            )?),
            error_backoff: Duration::from_millis(env_number(
                "QUEUE_ERROR_BACKOFF_MS",
                1000,
                0..=u64::MAX,
            )?),
        })
    }
}

fn env_number(name: &str, default: u64, range: RangeInclusive<u64>) -> QueueResult<u64> {
    parse_number(name, std::env::var(name).ok().as_deref(), default, range)
}

/// Parse an optional numeric setting, rejecting garbage and out-of-range values.
fn parse_number(
    name: &str,
    raw: Option<&str>,
    default: u64,
    range: RangeInclusive<u64>,
) -> QueueResult<u64> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    let value: u64 = raw
        .parse()
        .map_err(|_| QueueError::config_error(format!("{name} must be a number, got {raw:?}")))?;
    if !range.contains(&value) {
        return Err(QueueError::config_error(format!(
            "{name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )));
    }
    Ok(value)
}

/// Opaque handle proving ownership of a leased message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseToken(String);

impl LeaseToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Receipt handles are long; the prefix is enough to correlate logs.
        let prefix: String = self.0.chars().take(16).collect();
        write!(f, "{prefix}")
    }
}

/// A job together with the lease granted for it.
#[derive(Debug, Clone)]
pub struct Lease {
    pub job: Job,
    pub token: LeaseToken,
}

/// Leased job queue.
///
/// Implementations are shared by every worker without client-side locking;
/// exclusivity of a job is provided by the lease, not by this process.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Serialize and enqueue a job. Returns the message id.
    async fn send(&self, job: &Job) -> QueueResult<String>;

    /// Wait up to `wait_time` for one job and lease it for `visibility_timeout`.
    ///
    /// Transport failures are logged and reported as "no job"; callers
    /// simply poll again.
    async fn receive_one(&self, visibility_timeout: Duration, wait_time: Duration) -> Option<Lease>;

    /// Permanently remove a leased job. Acknowledging the same token twice
    /// is a no-op.
    async fn acknowledge(&self, token: &LeaseToken) -> QueueResult<()>;
}

/// Decode a message body into a job.
pub(crate) fn decode_body(body: &str) -> QueueResult<Job> {
    Job::from_message_body(body).map_err(|e| QueueError::malformed_message(e.to_string()))
}
