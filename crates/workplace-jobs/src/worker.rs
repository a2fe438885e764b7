//! Job worker that polls a queue and dispatches to registered handlers.

use crate::error::{JobError, JobResult};
use crate::job::{Job, JobContext, JobData};
use crate::queue::JobQueue;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;
use workplace_config::JobsConfig;

/// Job handler function type.
pub type JobHandler =
    Arc<dyn Fn(JobData, JobContext) -> BoxFuture<'static, JobResult<()>> + Send + Sync>;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Queues to process, in priority order.
    pub queues: Vec<String>,

    /// Delay between polls of an empty queue.
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queues: vec!["default".to_string()],
            poll_interval: Duration::from_millis(1000),
        }
    }
}

impl From<&JobsConfig> for WorkerConfig {
    fn from(config: &JobsConfig) -> Self {
        Self {
            queues: vec![config.queue.clone()],
            poll_interval: config.poll_interval(),
        }
    }
}

/// Processes one job at a time from a queue.
pub struct JobWorker<Q: JobQueue> {
    id: String,
    queue: Arc<Q>,
    config: WorkerConfig,
    handlers: RwLock<HashMap<String, JobHandler>>,
    shutdown_tx: watch::Sender<bool>,
    jobs_processed: AtomicU64,
    jobs_failed: AtomicU64,
}

impl<Q: JobQueue + 'static> JobWorker<Q> {
    pub fn new(queue: Arc<Q>, config: WorkerConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            id: format!("worker-{}", Uuid::new_v4()),
            queue,
            config,
            handlers: RwLock::new(HashMap::new()),
            shutdown_tx,
            jobs_processed: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
        }
    }

    /// Register the handler for jobs of type `J`.
    pub fn register<J, F>(&self, handler: F)
    where
        J: Job,
        F: Fn(J, JobContext) -> BoxFuture<'static, JobResult<()>> + Send + Sync + 'static,
    {
        let handler_fn: JobHandler = Arc::new(
            move |job_data: JobData, ctx: JobContext| -> BoxFuture<'static, JobResult<()>> {
                match job_data.deserialize::<J>() {
                    Ok(job) => handler(job, ctx),
                    Err(e) => Box::pin(async move { Err(e) }),
                }
            },
        );

        self.handlers.write().insert(J::NAME.to_string(), handler_fn);
        info!(job_type = J::NAME, "Registered job handler");
    }

    /// Dequeue and process at most one job. Returns whether a job ran.
    pub async fn run_once(&self) -> JobResult<bool> {
        let queues: Vec<&str> = self.config.queues.iter().map(String::as_str).collect();

        let Some(job_data) = self.queue.dequeue(&queues, &self.id).await? else {
            return Ok(false);
        };

        let job_id = job_data.id.clone();
        let span = tracing::info_span!("job", job_id = %job_id, job_name = %job_data.name);

        async {
            debug!(title = %job_data.title, attempt = job_data.attempt, "Processing job");

            let handler = self.handlers.read().get(&job_data.name).cloned();
            let result = match handler {
                Some(handler) => {
                    let ctx = job_data.to_context(&self.id);
                    handler(job_data.clone(), ctx).await
                }
                None => {
                    error!("No handler registered for job type");
                    Err(JobError::UnknownJob(job_data.name.clone()))
                }
            };

            match result {
                Ok(()) => {
                    self.queue.complete(&job_id).await?;
                    self.jobs_processed.fetch_add(1, Ordering::Relaxed);
                    debug!("Job completed");
                }
                Err(e) => {
                    warn!(error = %e, "Job execution failed");
                    self.queue.fail(&job_id, &e).await?;
                    self.jobs_failed.fetch_add(1, Ordering::Relaxed);
                }
            }

            Ok::<_, JobError>(true)
        }
        .instrument(span)
        .await
    }

    /// Poll until [`JobWorker::stop`] is called.
    pub async fn run(&self) -> JobResult<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!(
            worker_id = %self.id,
            queues = ?self.config.queues,
            "Starting job worker"
        );

        loop {
            if *shutdown_rx.borrow_and_update() {
                info!(worker_id = %self.id, "Received shutdown signal");
                break;
            }

            let ran = match self.run_once().await {
                Ok(ran) => ran,
                Err(e) => {
                    error!(worker_id = %self.id, error = %e, "Failed to process job");
                    false
                }
            };

            if ran {
                continue;
            }

            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(
            worker_id = %self.id,
            processed = self.jobs_processed(),
            failed = self.jobs_failed(),
            "Job worker stopped"
        );

        Ok(())
    }

    /// Ask the worker to stop after its current job.
    ///
    /// The request is kept, so a worker that has not started polling yet
    /// stops as soon as it does.
    pub fn stop(&self) {
        info!(worker_id = %self.id, "Stopping job worker...");
        self.shutdown_tx.send_replace(true);
    }

    pub fn jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    pub fn jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}
