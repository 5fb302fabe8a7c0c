//! Job definitions for queue processing.

use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::object_url::{extension_of, ObjectUrl};

/// A single object locator inside a job message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub url: String,
}

impl Location {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// One unit of work read from the queue.
///
/// Wire format:
/// `{"input": {"url": ...}, "output": {"url": ...}, "SNS_ARN": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Source object
    pub input: Location,
    /// Destination object; its extension selects the transformation
    pub output: Location,
    /// Topic notified on completion or failure
    #[serde(
        rename = "SNS_ARN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_target: Option<String>,
}

impl Job {
    /// Create a job without a notification target.
    pub fn new(input_url: impl Into<String>, output_url: impl Into<String>) -> Self {
        Self {
            input: Location::new(input_url),
            output: Location::new(output_url),
            notification_target: None,
        }
    }

    /// Set the notification target. Empty targets are ignored.
    pub fn with_notification_target(mut self, target: impl Into<String>) -> Self {
        let target = target.into();
        self.notification_target = if target.is_empty() { None } else { Some(target) };
        self
    }

    /// Derive a job from an "object created" notification.
    ///
    /// The output key replaces the first `input` in the key with `output`,
    /// so `in/input/a.wav` becomes `in/output/a.wav`.
    pub fn from_object_created(bucket: &str, key: &str, notification_target: Option<&str>) -> Self {
        let output_key = key.replacen("input", "output", 1);
        let job = Self::new(
            ObjectUrl::new(bucket, key).to_string(),
            ObjectUrl::new(bucket, output_key).to_string(),
        );
        match notification_target {
            Some(target) => job.with_notification_target(target),
            None => job,
        }
    }

    pub fn input_url(&self) -> &str {
        &self.input.url
    }

    pub fn output_url(&self) -> &str {
        &self.output.url
    }

    /// Parsed output location.
    pub fn output_object(&self) -> ModelResult<ObjectUrl> {
        ObjectUrl::parse(&self.output.url)
    }

    /// Extension of the output location, which selects the transformation.
    pub fn output_extension(&self) -> &str {
        extension_of(&self.output.url)
    }

    /// Serialize to the queue message body.
    pub fn to_message_body(&self) -> ModelResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a queue message body.
    pub fn from_message_body(body: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(body)?)
    }
}
