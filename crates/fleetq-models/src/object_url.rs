//! Object-store locations.

use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

const S3_SCHEME: &str = "s3://";

/// A parsed `s3://bucket/key` locator.
///
/// The key is kept exactly as written in the URL (no percent-decoding), so
/// that a job's output location and its `.error` sibling round-trip to the
/// same object names the producer wrote.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl {
    bucket: String,
    key: String,
}

impl ObjectUrl {
    /// Create from a bucket and key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse an `s3://bucket/key` URL.
    pub fn parse(url: &str) -> ModelResult<Self> {
        let rest = url
            .strip_prefix(S3_SCHEME)
            .ok_or_else(|| ModelError::invalid_object_url(format!("{url}: expected s3:// scheme")))?;

        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| ModelError::invalid_object_url(format!("{url}: missing object key")))?;

        if bucket.is_empty() {
            return Err(ModelError::invalid_object_url(format!("{url}: empty bucket")));
        }
        if key.is_empty() {
            return Err(ModelError::invalid_object_url(format!("{url}: empty object key")));
        }

        Ok(Self::new(bucket, key))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Extension of the object's file name, without the dot.
    ///
    /// Returns an empty string when the last path segment has no dot.
    pub fn extension(&self) -> &str {
        extension_of(&self.key)
    }

    /// Sibling object whose key is this key plus `suffix`.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self::new(self.bucket.clone(), format!("{}{}", self.key, suffix))
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", S3_SCHEME, self.bucket, self.key)
    }
}

impl FromStr for ObjectUrl {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Extension of the last path segment of a URL or key.
pub(crate) fn extension_of(path: &str) -> &str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}
