//! Daily group snapshot.
//!
//! Fetches the group listing, writes it to a folder only administrators may
//! view and re-arms itself for the next day. A run that gets no groups
//! writes nothing and does not re-arm.

use crate::error::{JobError, JobResult};
use crate::job::{Job, JobContext, JobId};
use crate::queue::JobQueue;
use crate::recurring::{RecurringRunner, RecurringTask, RunOutcome};
use crate::storage::SecureStorage;
use crate::worker::JobWorker;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use workplace_config::SnapshotConfig;
use workplace_service::snapshot::encode_snapshot;
use workplace_service::WorkplaceService;

/// Queued run of the group snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshotJob;

impl Job for GroupSnapshotJob {
    const NAME: &'static str = "workplace_group_snapshot";
    const QUEUE: &'static str = "workplace";

    fn title(&self) -> String {
        "Get Workplace groups".to_string()
    }
}

/// Fetch and persist the group listing.
pub struct GroupSnapshotTask {
    service: Arc<WorkplaceService>,
    storage: Arc<dyn SecureStorage>,
    config: SnapshotConfig,
    queue: String,
}

impl GroupSnapshotTask {
    pub fn new(
        service: Arc<WorkplaceService>,
        storage: Arc<dyn SecureStorage>,
        config: SnapshotConfig,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            service,
            storage,
            config,
            queue: queue.into(),
        }
    }
}

#[async_trait]
impl RecurringTask for GroupSnapshotTask {
    type Job = GroupSnapshotJob;

    fn next_job(&self) -> GroupSnapshotJob {
        GroupSnapshotJob
    }

    fn interval(&self) -> Duration {
        self.config.reschedule_delay()
    }

    fn queue(&self) -> &str {
        &self.queue
    }

    async fn run(&self, ctx: &JobContext) -> JobResult<RunOutcome> {
        let groups = match self.service.all_groups().await {
            Some(groups) if !groups.is_empty() => groups,
            _ => {
                warn!(job_id = %ctx.job_id, "No groups returned; snapshot not written");
                return Ok(RunOutcome::Stalled);
            }
        };

        let bytes = encode_snapshot(&groups)?;

        self.storage
            .ensure_restricted_folder(&self.config.secure_folder, &self.config.admin_group)
            .await?;
        let path = self
            .storage
            .write_file(&self.config.secure_folder, &self.config.group_filename, &bytes)
            .await?;

        info!(
            job_id = %ctx.job_id,
            path = %path.display(),
            groups = groups.len(),
            "Wrote group snapshot"
        );

        Ok(RunOutcome::Completed)
    }
}

/// Lifecycle of the most recent snapshot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotRunState {
    /// Waiting on the queue.
    Scheduled,
    Running,
    /// Snapshot written and the next run enqueued.
    CompletedRearmed,
    /// Nothing written or enqueued; the chain has stopped.
    FailedNoRearm,
}

/// What one run did.
#[derive(Debug)]
pub struct SnapshotRunReport {
    pub state: SnapshotRunState,
    pub next_job: Option<JobId>,
    pub error: Option<JobError>,
}

/// Drives [`GroupSnapshotTask`] through a job queue.
pub struct GroupSnapshotScheduler<Q: JobQueue> {
    runner: RecurringRunner<Q, GroupSnapshotTask>,
    state: Mutex<Option<SnapshotRunState>>,
}

impl<Q: JobQueue + 'static> GroupSnapshotScheduler<Q> {
    pub fn new(queue: Arc<Q>, task: GroupSnapshotTask) -> Self {
        Self {
            runner: RecurringRunner::new(queue, Arc::new(task)),
            state: Mutex::new(None),
        }
    }

    /// State of the latest run, `None` before anything was scheduled.
    pub fn state(&self) -> Option<SnapshotRunState> {
        *self.state.lock()
    }

    /// Queue a first run unless one is already waiting.
    pub async fn seed(&self) -> JobResult<Option<JobId>> {
        let seeded = self.runner.seed().await?;
        self.set_state(SnapshotRunState::Scheduled);
        Ok(seeded)
    }

    pub async fn run(&self, ctx: &JobContext) -> SnapshotRunReport {
        self.set_state(SnapshotRunState::Running);

        let report = match self.runner.run_once(ctx).await {
            Ok(Some(next)) => SnapshotRunReport {
                state: SnapshotRunState::CompletedRearmed,
                next_job: Some(next),
                error: None,
            },
            Ok(None) => SnapshotRunReport {
                state: SnapshotRunState::FailedNoRearm,
                next_job: None,
                error: None,
            },
            Err(e) => SnapshotRunReport {
                state: SnapshotRunState::FailedNoRearm,
                next_job: None,
                error: Some(e),
            },
        };

        self.set_state(report.state);
        report
    }

    /// Register the snapshot handler on `worker`.
    ///
    /// A stalled run completes its job; an erroring run fails it.
    pub fn register(self: &Arc<Self>, worker: &JobWorker<Q>) {
        let scheduler = Arc::clone(self);
        worker.register::<GroupSnapshotJob, _>(move |_job, ctx| {
            let scheduler = Arc::clone(&scheduler);
            Box::pin(async move {
                match scheduler.run(&ctx).await.error {
                    Some(e) => Err(e),
                    None => Ok(()),
                }
            })
        });
    }

    fn set_state(&self, state: SnapshotRunState) {
        *self.state.lock() = Some(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobData;
    use crate::memory::InMemoryJobQueue;
    use crate::storage::FsSecureStorage;
    use crate::worker::WorkerConfig;
    use chrono::Utc;
    use mockall::mock;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use workplace_config::CacheConfig;
    use workplace_core::{CommentOrder, GroupRecord};
    use workplace_gateway::WorkplaceGateway;
    use workplace_service::snapshot::decode_snapshot;
    use workplace_service::InMemoryCache;

    struct GroupsGateway {
        body: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WorkplaceGateway for GroupsGateway {
        async fn posts_from_group(&self, _: &str, _: Option<u32>) -> Option<String> {
            None
        }

        async fn all_groups(&self) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body.clone()
        }

        async fn post_comments(
            &self,
            _: &str,
            _: Option<u32>,
            _: Option<CommentOrder>,
        ) -> Option<String> {
            None
        }

        async fn profile_info(&self, _: &[String]) -> Option<String> {
            None
        }
    }

    mock! {
        pub Storage {}

        #[async_trait]
        impl SecureStorage for Storage {
            async fn ensure_restricted_folder(&self, folder: &str, admin_group: &str) -> JobResult<()>;
            async fn write_file(&self, folder: &str, filename: &str, bytes: &[u8]) -> JobResult<PathBuf>;
        }
    }

    const GROUPS: &str = r#"{"data":[{"id":"1234533","name":"Group One"},{"id":"3456673","name":"Group Two"},{"id":"5667854","name":"Group Three"}]}"#;

    fn service(body: Option<&str>, storage_root: &std::path::Path) -> Arc<WorkplaceService> {
        let gateway = GroupsGateway {
            body: body.map(str::to_string),
            calls: AtomicUsize::new(0),
        };
        Arc::new(WorkplaceService::new(
            Arc::new(gateway),
            Arc::new(InMemoryCache::new()),
            CacheConfig::default(),
            snapshot_config(storage_root),
        ))
    }

    fn snapshot_config(root: &std::path::Path) -> SnapshotConfig {
        SnapshotConfig {
            storage_root: root.to_path_buf(),
            ..SnapshotConfig::default()
        }
    }

    fn scheduler(
        queue: &Arc<InMemoryJobQueue>,
        service: Arc<WorkplaceService>,
        storage: Arc<dyn SecureStorage>,
        root: &std::path::Path,
    ) -> Arc<GroupSnapshotScheduler<InMemoryJobQueue>> {
        let task = GroupSnapshotTask::new(service, storage, snapshot_config(root), "workplace");
        Arc::new(GroupSnapshotScheduler::new(Arc::clone(queue), task))
    }

    fn context() -> JobContext {
        JobData::new(&GroupSnapshotJob).unwrap().to_context("test")
    }

    #[test]
    fn test_job_identity() {
        assert_eq!(GroupSnapshotJob.title(), "Get Workplace groups");
        let data = JobData::new(&GroupSnapshotJob).unwrap();
        assert_eq!(data.queue, "workplace");
        assert_eq!(data.max_attempts, 1);
        assert_eq!(data.deserialize::<GroupSnapshotJob>().unwrap(), GroupSnapshotJob);
    }

    #[tokio::test]
    async fn test_successful_run_writes_and_rearms() {
        let dir = TempDir::new().unwrap();
        let queue = Arc::new(InMemoryJobQueue::new());
        let service = service(Some(GROUPS), dir.path());
        let storage = Arc::new(FsSecureStorage::new(dir.path()));
        let scheduler = scheduler(&queue, Arc::clone(&service), storage.clone(), dir.path());

        let report = scheduler.run(&context()).await;

        assert_eq!(report.state, SnapshotRunState::CompletedRearmed);
        assert!(report.error.is_none());
        assert_eq!(scheduler.state(), Some(SnapshotRunState::CompletedRearmed));

        let bytes = std::fs::read(service.group_snapshot_path()).unwrap();
        let groups: GroupRecord = decode_snapshot(&bytes).unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups["3456673"], "Group Two");
        assert_eq!(service.read_group_snapshot().await, groups);

        let policy = storage.access_policy("Workplace").await.unwrap().unwrap();
        assert_eq!(policy.viewer_groups, vec!["administrators".to_string()]);

        let delayed = queue.delayed_jobs("workplace");
        assert_eq!(delayed.len(), 1);
        assert_eq!(Some(delayed[0].id.clone()), report.next_job);
        assert_eq!(delayed[0].title, "Get Workplace groups");
        let wait = delayed[0].scheduled_at - Utc::now();
        assert!(wait.num_seconds() > 86_390 && wait.num_seconds() <= 86_400);
    }

    #[tokio::test]
    async fn test_no_groups_stalls_without_writing() {
        for body in [None, Some(r#"{"data":[]}"#), Some(r#"{"error":{}}"#)] {
            let dir = TempDir::new().unwrap();
            let queue = Arc::new(InMemoryJobQueue::new());
            let service = service(body, dir.path());
            let storage = Arc::new(MockStorage::new());
            let scheduler = scheduler(&queue, Arc::clone(&service), storage, dir.path());

            let report = scheduler.run(&context()).await;

            assert_eq!(report.state, SnapshotRunState::FailedNoRearm);
            assert!(report.error.is_none());
            assert!(report.next_job.is_none());
            assert!(!service.group_snapshot_path().exists());
            assert_eq!(queue.queue_length("workplace").await.unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn test_storage_failure_does_not_rearm() {
        let dir = TempDir::new().unwrap();
        let queue = Arc::new(InMemoryJobQueue::new());
        let mut storage = MockStorage::new();
        storage
            .expect_ensure_restricted_folder()
            .times(1)
            .returning(|_, _| Err(JobError::Storage("read-only".into())));
        storage.expect_write_file().never();

        let scheduler = scheduler(
            &queue,
            service(Some(GROUPS), dir.path()),
            Arc::new(storage),
            dir.path(),
        );

        let report = scheduler.run(&context()).await;
        assert_eq!(report.state, SnapshotRunState::FailedNoRearm);
        assert!(matches!(report.error, Some(JobError::Storage(_))));
        assert_eq!(queue.queue_length("workplace").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seeded_run_through_worker() {
        let dir = TempDir::new().unwrap();
        let queue = Arc::new(InMemoryJobQueue::new());
        let service = service(Some(GROUPS), dir.path());
        let storage = Arc::new(FsSecureStorage::new(dir.path()));
        let scheduler = scheduler(&queue, Arc::clone(&service), storage, dir.path());
        let worker = JobWorker::new(
            Arc::clone(&queue),
            WorkerConfig {
                queues: vec!["workplace".to_string()],
                ..WorkerConfig::default()
            },
        );
        scheduler.register(&worker);

        assert!(scheduler.seed().await.unwrap().is_some());
        assert!(scheduler.seed().await.unwrap().is_none());
        assert_eq!(scheduler.state(), Some(SnapshotRunState::Scheduled));

        assert!(worker.run_once().await.unwrap());
        assert_eq!(worker.jobs_processed(), 1);
        assert!(service.group_snapshot_path().exists());
        assert_eq!(queue.delayed_jobs("workplace").len(), 1);
        assert!(!worker.run_once().await.unwrap());
    }
}
