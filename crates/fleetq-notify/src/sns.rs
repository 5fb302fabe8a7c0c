//! SNS notification publisher.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::Client;
use tracing::debug;

use crate::error::{NotifyError, NotifyResult};
use crate::Notifier;

/// Publishes notifications to SNS topics by ARN.
#[derive(Clone, Debug)]
pub struct SnsNotifier {
    client: Arc<Client>,
}

impl SnsNotifier {
    /// Create a new SNS publisher from a loaded AWS configuration.
    pub fn new(aws_config: &SdkConfig) -> Self {
        Self {
            client: Arc::new(Client::new(aws_config)),
        }
    }
}

/// Message body for `MessageStructure=json`: the same text for every protocol.
pub fn message_payload(message: &str) -> NotifyResult<String> {
    Ok(serde_json::to_string(&serde_json::json!({ "default": message }))?)
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, topic: &str, message: &str) -> NotifyResult<()> {
        self.client
            .publish()
            .target_arn(topic)
            .message(message_payload(message)?)
            .message_structure("json")
            .send()
            .await
            .map_err(|e| NotifyError::publish_failed(topic, DisplayErrorContext(&e).to_string()))?;

        debug!(topic = %topic, "Published notification");
        Ok(())
    }
}
