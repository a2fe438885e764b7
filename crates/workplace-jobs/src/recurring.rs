//! Recurring tasks driven through the job queue.
//!
//! A run that completes enqueues the next run after the task's interval.
//! A run that stalls or errors enqueues nothing, so the chain stops until
//! something seeds it again.

use crate::error::JobResult;
use crate::job::{Job, JobContext, JobId};
use crate::queue::{JobQueue, QueuedJob};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of one run of a recurring task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run did its work; schedule the next one.
    Completed,
    /// Nothing to do this time; do not schedule again.
    Stalled,
}

#[async_trait]
pub trait RecurringTask: Send + Sync + 'static {
    /// Job that carries a run through the queue.
    type Job: Job;

    /// Payload for the next run.
    fn next_job(&self) -> Self::Job;

    /// Delay between a completed run and the next.
    fn interval(&self) -> Duration;

    /// Queue the runs travel on.
    fn queue(&self) -> &str {
        <Self::Job as Job>::QUEUE
    }

    async fn run(&self, ctx: &JobContext) -> JobResult<RunOutcome>;
}

/// Runs a [`RecurringTask`] and re-arms it on completion.
pub struct RecurringRunner<Q: JobQueue, T: RecurringTask> {
    queue: Arc<Q>,
    task: Arc<T>,
}

impl<Q: JobQueue + 'static, T: RecurringTask> RecurringRunner<Q, T> {
    pub fn new(queue: Arc<Q>, task: Arc<T>) -> Self {
        Self { queue, task }
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    /// Enqueue a first run unless one is already waiting.
    pub async fn seed(&self) -> JobResult<Option<JobId>> {
        let pending = self.queue.queue_length(self.task.queue()).await?;
        if pending > 0 {
            debug!(queue = %self.task.queue(), pending, "Recurring task already queued");
            return Ok(None);
        }

        let job = self.task.next_job();
        let title = job.title();
        let job_id = self
            .queue
            .enqueue_with(QueuedJob::new(job).queue(self.task.queue()))
            .await?;

        info!(job_id = %job_id, title = %title, "Seeded recurring task");
        Ok(Some(job_id))
    }

    /// Run the task once. Returns the id of the next run when one was enqueued.
    pub async fn run_once(&self, ctx: &JobContext) -> JobResult<Option<JobId>> {
        match self.task.run(ctx).await? {
            RunOutcome::Completed => {
                let next = QueuedJob::new(self.task.next_job())
                    .queue(self.task.queue())
                    .delay(self.task.interval())
                    .correlation_id(ctx.job_id.as_str());
                let job_id = self.queue.enqueue_with(next).await?;

                info!(
                    job_id = %ctx.job_id,
                    next_job_id = %job_id,
                    delay_secs = self.task.interval().as_secs(),
                    "Recurring task re-armed"
                );
                Ok(Some(job_id))
            }
            RunOutcome::Stalled => {
                warn!(job_id = %ctx.job_id, "Recurring task stalled; not re-armed");
                Ok(None)
            }
        }
    }
}
