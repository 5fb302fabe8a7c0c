//! Job completion notifications.
//!
//! Publishing is fire-and-forget from the worker's point of view: callers
//! log failures and move on.

pub mod error;
pub mod sns;

use async_trait::async_trait;

pub use error::{NotifyError, NotifyResult};
pub use sns::SnsNotifier;

/// Notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish `message` to `topic`.
    async fn publish(&self, topic: &str, message: &str) -> NotifyResult<()>;
}
