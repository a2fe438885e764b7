//! Application assembly and job runtime.

use crate::di::build_cache;
use std::future::Future;
use std::sync::Arc;
use tracing::info;
use workplace_config::AppConfig;
use workplace_core::WorkplaceResult;
use workplace_gateway::GatewayClient;
use workplace_jobs::{
    FsSecureStorage, GroupSnapshotScheduler, GroupSnapshotTask, JobError, JobQueue, JobResult,
    JobWorker, WorkerConfig,
};
use workplace_service::WorkplaceService;

/// Collaborators built from the configuration.
pub struct App {
    config: AppConfig,
    service: Arc<WorkplaceService>,
    storage: Arc<FsSecureStorage>,
}

impl App {
    /// Build the gateway, cache, service and snapshot storage.
    pub fn build(config: AppConfig) -> WorkplaceResult<Self> {
        let gateway = Arc::new(GatewayClient::new(&config.gateway)?);
        let cache = build_cache(&config.cache)?;
        let service = Arc::new(WorkplaceService::new(
            gateway,
            cache,
            config.cache.clone(),
            config.snapshot.clone(),
        ));
        let storage = Arc::new(FsSecureStorage::new(config.snapshot.storage_root.clone()));

        Ok(Self {
            config,
            service,
            storage,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn service(&self) -> &Arc<WorkplaceService> {
        &self.service
    }

    /// Create a worker on `queue` with the snapshot handler registered and
    /// a first snapshot run queued if none is waiting.
    pub async fn prepare<Q: JobQueue + 'static>(
        &self,
        queue: Arc<Q>,
    ) -> JobResult<(JobWorker<Q>, Arc<GroupSnapshotScheduler<Q>>)> {
        let task = GroupSnapshotTask::new(
            Arc::clone(&self.service),
            self.storage.clone(),
            self.config.snapshot.clone(),
            self.config.jobs.queue.clone(),
        );
        let scheduler = Arc::new(GroupSnapshotScheduler::new(Arc::clone(&queue), task));
        let worker = JobWorker::new(queue, WorkerConfig::from(&self.config.jobs));

        scheduler.register(&worker);
        if let Some(job_id) = scheduler.seed().await? {
            info!(job_id = %job_id, "Queued initial group snapshot");
        }

        Ok((worker, scheduler))
    }

    /// Process jobs until `shutdown` resolves.
    pub async fn run<Q, S>(&self, queue: Arc<Q>, shutdown: S) -> JobResult<()>
    where
        Q: JobQueue + 'static,
        S: Future<Output = ()>,
    {
        queue.health_check().await?;

        let (worker, _scheduler) = self.prepare(queue).await?;
        let worker = Arc::new(worker);

        let running = Arc::clone(&worker);
        let handle = tokio::spawn(async move { running.run().await });

        shutdown.await;
        worker.stop();

        handle
            .await
            .map_err(|e| JobError::Internal(format!("Worker task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use workplace_jobs::{InMemoryJobQueue, SnapshotRunState};

    fn config(base_url: &str, root: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.gateway.base_url = base_url.to_string();
        config.gateway.bearer_token = "token".to_string();
        config.gateway.community_id = "987".to_string();
        config.snapshot.storage_root = root.to_path_buf();
        config.jobs.poll_interval_ms = 10;
        config
    }

    async fn groups_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/987/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"id": "1234533", "name": "Group One"},
                    {"id": "3456673", "name": "Group Two"}
                ]
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_prepared_worker_writes_snapshot() {
        let server = groups_server().await;
        let dir = TempDir::new().unwrap();
        let app = App::build(config(&server.uri(), dir.path())).unwrap();
        let queue = Arc::new(InMemoryJobQueue::new());

        let (worker, scheduler) = app.prepare(Arc::clone(&queue)).await.unwrap();
        assert_eq!(queue.queue_length("workplace").await.unwrap(), 1);

        assert!(worker.run_once().await.unwrap());
        assert_eq!(scheduler.state(), Some(SnapshotRunState::CompletedRearmed));

        let groups = app.service().read_group_snapshot().await;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["1234533"], "Group One");
        assert_eq!(queue.delayed_jobs("workplace").len(), 1);
    }

    #[tokio::test]
    async fn test_prepare_does_not_double_seed() {
        let server = groups_server().await;
        let dir = TempDir::new().unwrap();
        let app = App::build(config(&server.uri(), dir.path())).unwrap();
        let queue = Arc::new(InMemoryJobQueue::new());

        app.prepare(Arc::clone(&queue)).await.unwrap();
        app.prepare(Arc::clone(&queue)).await.unwrap();
        assert_eq!(queue.queue_length("workplace").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let server = groups_server().await;
        let dir = TempDir::new().unwrap();
        let app = App::build(config(&server.uri(), dir.path())).unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            app.run(
                Arc::new(InMemoryJobQueue::new()),
                tokio::time::sleep(Duration::from_millis(200)),
            ),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
        assert!(app.service().group_snapshot_path().exists());
    }

    #[tokio::test]
    async fn test_run_with_immediate_shutdown_returns() {
        let server = groups_server().await;
        let dir = TempDir::new().unwrap();
        let app = App::build(config(&server.uri(), dir.path())).unwrap();
        let queue = Arc::new(InMemoryJobQueue::new());

        let result = tokio::time::timeout(
            Duration::from_secs(3),
            app.run(Arc::clone(&queue), async {}),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
        assert_eq!(queue.queue_length("workplace").await.unwrap(), 1);
    }
}
