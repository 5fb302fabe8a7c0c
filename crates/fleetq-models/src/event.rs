//! Object-created event documents.
//!
//! Only the fields needed to derive jobs are modelled; everything else in
//! the notification is ignored.

use serde::Deserialize;

use crate::error::{ModelError, ModelResult};
use crate::job::Job;

#[derive(Debug, Clone, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
}

impl S3Event {
    /// Parse an event document.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// One job per record, with bucket and key form-decoded.
    pub fn jobs(&self, notification_target: Option<&str>) -> ModelResult<Vec<Job>> {
        if self.records.is_empty() {
            return Err(ModelError::invalid_event("event has no records"));
        }

        self.records
            .iter()
            .map(|record| {
                let bucket = decode_form_component(&record.s3.bucket.name)?;
                let key = decode_form_component(&record.s3.object.key)?;
                Ok(Job::from_object_created(&bucket, &key, notification_target))
            })
            .collect()
    }
}

/// Decode an `application/x-www-form-urlencoded` component (`+` is a space).
fn decode_form_component(value: &str) -> ModelResult<String> {
    let spaced = value.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ModelError::invalid_event(format!("cannot decode {value}: {e}")))
}
