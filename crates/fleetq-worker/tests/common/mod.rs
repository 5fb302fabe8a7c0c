//! Shared in-memory collaborators for worker integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fleetq_fleet::{FleetResult, LifecycleController};
use fleetq_media::{TransformCommand, TransformRegistry, TransformRunner};
use fleetq_models::{LifecycleActionResult, LifecycleHook, LifecycleState, ObjectUrl};
use fleetq_notify::{Notifier, NotifyResult};
use fleetq_queue::MemoryQueue;
use fleetq_storage::{ObjectStore, StorageResult};
use fleetq_worker::{JobProcessor, ResultReporter, RetryConfig, WorkerContext};
use tempfile::TempDir;

mockall::mock! {
    pub Lifecycle {}

    #[async_trait]
    impl LifecycleController for Lifecycle {
        async fn describe_state(&self) -> FleetResult<Option<LifecycleState>>;
        async fn complete_action(
            &self,
            hook: LifecycleHook,
            result: LifecycleActionResult,
        ) -> FleetResult<()>;
    }
}

/// Records every published notification.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, topic: &str, message: &str) -> NotifyResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((topic.to_string(), message.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub object: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Records uploads, reading staged files at upload time.
#[derive(Default)]
pub struct RecordingStore {
    uploads: Mutex<Vec<Upload>>,
}

impl RecordingStore {
    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn upload_file(&self, path: &Path, object: &ObjectUrl, content_type: &str) -> StorageResult<()> {
        let body = tokio::fs::read(path).await?;
        self.uploads.lock().unwrap().push(Upload {
            object: object.to_string(),
            content_type: content_type.to_string(),
            body,
        });
        Ok(())
    }
}

/// Snapshot of the queue when the termination hook was completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub in_flight: usize,
    pub deleted: u64,
}

/// Lifecycle controller whose state the test drives.
///
/// Completing the startup hook moves the instance to `InService`, as the
/// real controller does.
pub struct ScriptedLifecycle {
    state: Mutex<Option<LifecycleState>>,
    actions: Mutex<Vec<LifecycleHook>>,
    queue: Arc<MemoryQueue>,
    at_termination: Mutex<Option<QueueSnapshot>>,
}

impl ScriptedLifecycle {
    pub fn new(state: LifecycleState, queue: Arc<MemoryQueue>) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            actions: Mutex::new(Vec::new()),
            queue,
            at_termination: Mutex::new(None),
        }
    }

    pub fn set_state(&self, state: LifecycleState) {
        *self.state.lock().unwrap() = Some(state);
    }

    pub fn actions(&self) -> Vec<LifecycleHook> {
        self.actions.lock().unwrap().clone()
    }

    pub fn at_termination(&self) -> Option<QueueSnapshot> {
        *self.at_termination.lock().unwrap()
    }
}

#[async_trait]
impl LifecycleController for ScriptedLifecycle {
    async fn describe_state(&self) -> FleetResult<Option<LifecycleState>> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn complete_action(&self, hook: LifecycleHook, _result: LifecycleActionResult) -> FleetResult<()> {
        self.actions.lock().unwrap().push(hook);
        match hook {
            LifecycleHook::Startup => self.set_state(LifecycleState::InService),
            LifecycleHook::Termination => {
                *self.at_termination.lock().unwrap() = Some(QueueSnapshot {
                    in_flight: self.queue.in_flight_len(),
                    deleted: self.queue.deleted_count(),
                });
                self.set_state(LifecycleState::Terminated);
            }
        }
        Ok(())
    }
}

/// A fixture command: `sh -c <script> <input> <output>`.
pub fn shell(script: &str) -> TransformCommand {
    TransformCommand::new("sh").arg("-c").arg(script)
}

/// Queue, sinks and scratch space for one test.
pub struct Harness {
    pub queue: Arc<MemoryQueue>,
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<RecordingStore>,
    pub work_dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(MemoryQueue::new()),
            notifier: Arc::new(RecordingNotifier::default()),
            store: Arc::new(RecordingStore::default()),
            work_dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Worker context with `command` registered for `.wav` and `.mp4`.
    pub fn context(&self, command: TransformCommand) -> WorkerContext {
        let mut registry = TransformRegistry::new();
        registry.register("wav", command.clone());
        registry.register("mp4", command);
        self.context_with(registry)
    }

    pub fn context_with(&self, registry: TransformRegistry) -> WorkerContext {
        WorkerContext {
            queue: self.queue.clone(),
            processor: Arc::new(JobProcessor::new(
                registry,
                TransformRunner::new().with_timeout(Duration::from_secs(30)),
            )),
            reporter: Arc::new(ResultReporter::new(
                self.notifier.clone(),
                self.store.clone(),
                self.work_dir.path(),
            )),
            visibility_timeout: Duration::from_secs(60),
            wait_time: Duration::from_millis(20),
        }
    }

    /// Wait until the queue holds nothing, visible or leased.
    pub async fn wait_until_empty(&self) {
        wait_for(|| self.queue.is_empty()).await;
    }
}

/// Poll `condition` every 10ms, failing the test after 10 seconds.
pub async fn wait_for(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Handshake retries without real backoff.
pub fn fast_retry() -> RetryConfig {
    RetryConfig::new("test_handshake").with_base_delay(Duration::from_millis(1))
}
