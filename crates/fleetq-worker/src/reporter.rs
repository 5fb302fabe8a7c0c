//! Outcome reporting: notifications and error artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fleetq_models::{Job, JobOutcome};
use fleetq_notify::Notifier;
use fleetq_storage::{content_type_for, ObjectStore};
use tracing::{debug, info, warn};

use crate::error::WorkerResult;
use crate::metrics;

/// Suffix appended to the output location for error artifacts.
pub const ERROR_SUFFIX: &str = ".error";

/// Publishes the result of a job.
///
/// Notification and upload failures are logged and swallowed. Only a failure
/// to stage the artifact locally is returned.
#[derive(Clone)]
pub struct ResultReporter {
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn ObjectStore>,
    work_dir: PathBuf,
}

impl ResultReporter {
    pub fn new(notifier: Arc<dyn Notifier>, store: Arc<dyn ObjectStore>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            notifier,
            store,
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Local staging file for a worker's error artifact.
    pub fn temp_path(&self, worker_index: usize) -> PathBuf {
        self.work_dir.join(format!("{worker_index}_tmpError"))
    }

    pub async fn report(&self, worker_index: usize, job: &Job, outcome: &JobOutcome) -> WorkerResult<()> {
        let message = outcome.message(job);
        if outcome.is_success() {
            info!(worker = worker_index, "{}", message);
        } else {
            warn!(worker = worker_index, "{}", message);
        }

        self.notify(job, &message).await;

        if let Some(artifact) = outcome.error_artifact(job) {
            self.write_error_artifact(worker_index, job, &artifact).await?;
        }

        Ok(())
    }

    async fn notify(&self, job: &Job, message: &str) {
        let Some(target) = job.notification_target.as_deref().filter(|t| !t.is_empty()) else {
            return;
        };

        if let Err(e) = self.notifier.publish(target, message).await {
            warn!(topic = %target, error = %e, "Failed to publish notification");
            metrics::record_notify_failure();
        }
    }

    async fn write_error_artifact(&self, worker_index: usize, job: &Job, body: &[u8]) -> WorkerResult<()> {
        let object = match job.output_object() {
            Ok(output) => output.with_suffix(ERROR_SUFFIX),
            Err(e) => {
                warn!(output = %job.output_url(), error = %e, "Cannot place error artifact");
                return Ok(());
            }
        };

        let path = self.temp_path(worker_index);
        tokio::fs::write(&path, body).await?;

        let upload = self
            .store
            .upload_file(&path, &object, content_type_for(&object))
            .await;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove temp file");
        }

        match upload {
            Ok(()) => debug!(artifact = %object, "Wrote error artifact"),
            Err(e) => {
                warn!(artifact = %object, error = %e, "Failed to upload error artifact");
                metrics::record_artifact_upload_failure();
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ResultReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultReporter")
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fleetq_models::ObjectUrl;
    use fleetq_notify::{NotifyError, NotifyResult};
    use fleetq_storage::{StorageError, StorageResult};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Notifications {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for Notifications {
        async fn publish(&self, topic: &str, message: &str) -> NotifyResult<()> {
            if self.fail {
                return Err(NotifyError::publish_failed(topic, "unavailable"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((topic.to_string(), message.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct Uploads {
        objects: Mutex<Vec<(String, Vec<u8>)>>,
        fail: bool,
    }

    #[async_trait]
    impl ObjectStore for Uploads {
        async fn upload_file(&self, path: &Path, object: &ObjectUrl, _content_type: &str) -> StorageResult<()> {
            let body = tokio::fs::read(path).await?;
            if self.fail {
                return Err(StorageError::upload_failed("denied"));
            }
            self.objects.lock().unwrap().push((object.to_string(), body));
            Ok(())
        }
    }

    fn reporter(notifier: Arc<Notifications>, store: Arc<Uploads>, dir: &Path) -> ResultReporter {
        ResultReporter::new(notifier, store, dir)
    }

    #[tokio::test]
    async fn test_success_notifies_without_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(Notifications::default());
        let store = Arc::new(Uploads::default());
        let reporter = reporter(notifier.clone(), store.clone(), dir.path());

        let job = Job::new("s3://b/input/a.wav", "s3://b/output/a.wav").with_notification_target("arn:topic");
        let outcome = JobOutcome::Success { output: Vec::new() };
        reporter.report(0, &job, &outcome).await.unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "arn:topic");
        assert!(sent[0].1.contains("s3://b/output/a.wav"));
        assert!(store.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_without_target_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(Notifications::default());
        let store = Arc::new(Uploads::default());
        let reporter = reporter(notifier.clone(), store.clone(), dir.path());

        let job = Job::new("s3://b/input/a.wav", "s3://b/output/a.wav");
        let outcome = JobOutcome::CommandFailure {
            exit_code: Some(1),
            output: b"line one\nline two".to_vec(),
        };
        reporter.report(2, &job, &outcome).await.unwrap();

        assert!(notifier.sent.lock().unwrap().is_empty());
        let objects = store.objects.lock().unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].0, "s3://b/output/a.wav.error");
        assert_eq!(objects[0].1, b"line one\nline two".to_vec());
        assert!(!reporter.temp_path(2).exists());
    }

    #[tokio::test]
    async fn test_delivery_failures_are_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(Notifications {
            fail: true,
            ..Default::default()
        });
        let store = Arc::new(Uploads {
            fail: true,
            ..Default::default()
        });
        let reporter = reporter(notifier, store, dir.path());

        let job = Job::new("s3://b/input/a.xyz", "s3://b/output/a.xyz").with_notification_target("arn:topic");
        let outcome = JobOutcome::UnsupportedFormat {
            extension: "xyz".to_string(),
        };

        assert!(reporter.report(1, &job, &outcome).await.is_ok());
        assert!(!reporter.temp_path(1).exists());
    }

    #[tokio::test]
    async fn test_unwritable_work_dir_is_fatal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let reporter = reporter(
            Arc::new(Notifications::default()),
            Arc::new(Uploads::default()),
            file.path(),
        );

        let job = Job::new("s3://b/input/a.xyz", "s3://b/output/a.xyz");
        let outcome = JobOutcome::UnsupportedFormat {
            extension: "xyz".to_string(),
        };

        assert!(matches!(
            reporter.report(0, &job, &outcome).await,
            Err(crate::error::WorkerError::Io(_))
        ));
    }
}
