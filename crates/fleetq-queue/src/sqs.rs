//! SQS queue backend.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client;
use fleetq_models::Job;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::queue::{decode_body, Lease, LeaseToken, QueueClient, QueueConfig, MAX_VISIBILITY_TIMEOUT, MAX_WAIT_TIME};

/// Job queue backed by an SQS queue.
#[derive(Clone, Debug)]
pub struct SqsQueue {
    client: Client,
    config: QueueConfig,
}

impl SqsQueue {
    /// Create a new SQS queue client from a loaded AWS configuration.
    pub fn new(aws_config: &SdkConfig, config: QueueConfig) -> Self {
        let mut builder = aws_sdk_sqs::config::Builder::from(aws_config);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        let client = Client::from_conf(builder.build());

        Self { client, config }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

}

/// Seconds for an SQS request field, capped at what SQS accepts.
fn whole_seconds(duration: Duration, cap: Duration) -> i32 {
    i32::try_from(duration.min(cap).as_secs()).unwrap_or(i32::MAX)
}

#[async_trait]
impl QueueClient for SqsQueue {
    async fn send(&self, job: &Job) -> QueueResult<String> {
        let body = job.to_message_body()?;

        let response = self
            .client
            .send_message()
            .queue_url(&self.config.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::enqueue_failed(DisplayErrorContext(&e).to_string()))?;

        let message_id = response.message_id().unwrap_or_default().to_string();
        info!(
            message_id = %message_id,
            output = %job.output_url(),
            "Enqueued job"
        );
        Ok(message_id)
    }

    async fn receive_one(&self, visibility_timeout: Duration, wait_time: Duration) -> Option<Lease> {
        let response = match self
            .client
            .receive_message()
            .queue_url(&self.config.queue_url)
            .max_number_of_messages(1)
            .visibility_timeout(whole_seconds(visibility_timeout, MAX_VISIBILITY_TIMEOUT))
            .wait_time_seconds(whole_seconds(wait_time, MAX_WAIT_TIME))
            .message_attribute_names("All")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    error = %DisplayErrorContext(&e),
                    "Receive failed, treating as empty poll"
                );
                // An immediate failure would otherwise skip the long-poll wait.
                tokio::time::sleep(self.config.error_backoff).await;
                return None;
            }
        };

        let message = response.messages.unwrap_or_default().into_iter().next()?;

        let Some(token) = message.receipt_handle().map(LeaseToken::new) else {
            warn!(message_id = ?message.message_id(), "Received message without receipt handle");
            return None;
        };

        match decode_body(message.body().unwrap_or_default()) {
            Ok(job) => {
                debug!(message_id = ?message.message_id(), lease = %token, "Leased job");
                Some(Lease { job, token })
            }
            Err(e) => {
                // Nothing can make this body processable; drop it instead of
                // letting it cycle through every worker forever.
                warn!(
                    message_id = ?message.message_id(),
                    error = %e,
                    "Deleting malformed message"
                );
                if let Err(ack_err) = self.acknowledge(&token).await {
                    warn!(error = %ack_err, "Failed to delete malformed message");
                }
                None
            }
        }
    }

    async fn acknowledge(&self, token: &LeaseToken) -> QueueResult<()> {
        match self
            .client
            .delete_message()
            .queue_url(&self.config.queue_url)
            .receipt_handle(token.as_str())
            .send()
            .await
        {
            Ok(_) => {
                debug!(lease = %token, "Acknowledged job");
                Ok(())
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|err| err.is_receipt_handle_is_invalid()) =>
            {
                debug!(lease = %token, "Lease already acknowledged");
                Ok(())
            }
            Err(e) => Err(QueueError::acknowledge_failed(
                DisplayErrorContext(&e).to_string(),
            )),
        }
    }
}
