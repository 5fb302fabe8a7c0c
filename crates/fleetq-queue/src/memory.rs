//! In-process queue with SQS-like lease semantics.
//!
//! Messages are handed out in enqueue order. A received message is hidden
//! for the visibility timeout; if it is not acknowledged in time it becomes
//! visible again under a new lease token, and the old token stops working.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use fleetq_models::Job;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::QueueResult;
use crate::queue::{decode_body, Lease, LeaseToken, QueueClient};

/// How often a waiting receive re-checks for visible messages.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct StoredMessage {
    id: String,
    body: String,
    receipt: Option<String>,
    invisible_until: Option<Instant>,
    receive_count: u32,
}

impl StoredMessage {
    fn is_visible(&self, now: Instant) -> bool {
        self.invisible_until.map_or(true, |until| until <= now)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    messages: Vec<StoredMessage>,
    deleted: u64,
}

/// In-process leased queue.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    state: Mutex<MemoryState>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a raw body, bypassing job serialization.
    pub fn send_raw(&self, body: impl Into<String>) -> String {
        let id = Uuid::new_v4().to_string();
        self.lock().messages.push(StoredMessage {
            id: id.clone(),
            body: body.into(),
            receipt: None,
            invisible_until: None,
            receive_count: 0,
        });
        id
    }

    /// Messages not yet deleted (visible or leased).
    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages that a receive call could lease right now.
    pub fn visible_len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .messages
            .iter()
            .filter(|m| m.is_visible(now))
            .count()
    }

    /// Messages currently under an unexpired lease.
    pub fn in_flight_len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .messages
            .iter()
            .filter(|m| !m.is_visible(now))
            .count()
    }

    /// Number of messages removed by acknowledgment.
    pub fn deleted_count(&self) -> u64 {
        self.lock().deleted
    }

    /// Total receives across all messages still in the queue.
    pub fn receive_count(&self) -> u32 {
        self.lock().messages.iter().map(|m| m.receive_count).sum()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means another thread panicked mid-update of
        // plain counters; the data is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Lease the first visible message, if any. Returns its body too.
    fn try_lease(&self, visibility_timeout: Duration) -> Option<(String, LeaseToken)> {
        let now = Instant::now();
        let mut state = self.lock();
        let message = state.messages.iter_mut().find(|m| m.is_visible(now))?;

        let receipt = Uuid::new_v4().to_string();
        message.receipt = Some(receipt.clone());
        message.invisible_until = Some(now + visibility_timeout);
        message.receive_count += 1;

        debug!(message_id = %message.id, receive_count = message.receive_count, "Leased message");
        Some((message.body.clone(), LeaseToken::new(receipt)))
    }

    fn remove(&self, token: &LeaseToken) -> bool {
        let mut state = self.lock();
        let position = state
            .messages
            .iter()
            .position(|m| m.receipt.as_deref() == Some(token.as_str()));

        match position {
            Some(index) => {
                state.messages.remove(index);
                state.deleted += 1;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl QueueClient for MemoryQueue {
    async fn send(&self, job: &Job) -> QueueResult<String> {
        Ok(self.send_raw(job.to_message_body()?))
    }

    async fn receive_one(&self, visibility_timeout: Duration, wait_time: Duration) -> Option<Lease> {
        let deadline = Instant::now() + wait_time;

        loop {
            if let Some((body, token)) = self.try_lease(visibility_timeout) {
                match decode_body(&body) {
                    Ok(job) => return Some(Lease { job, token }),
                    Err(e) => {
                        warn!(error = %e, "Deleting malformed message");
                        self.remove(&token);
                        continue;
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn acknowledge(&self, token: &LeaseToken) -> QueueResult<()> {
        if self.remove(token) {
            debug!(lease = %token, "Acknowledged message");
        } else {
            debug!(lease = %token, "Lease unknown or already acknowledged");
        }
        Ok(())
    }
}
