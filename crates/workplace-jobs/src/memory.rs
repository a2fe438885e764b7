//! In-process job queue.

use crate::error::{JobError, JobResult};
use crate::job::{Job, JobData, JobId};
use crate::queue::{retry_delay, JobQueue, QueuedJob};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct State {
    ready: HashMap<String, VecDeque<JobData>>,
    delayed: Vec<JobData>,
    active: HashMap<JobId, JobData>,
    dead: Vec<JobData>,
}

impl State {
    fn promote_due(&mut self) {
        let now = Utc::now();
        let (due, pending): (Vec<_>, Vec<_>) =
            self.delayed.drain(..).partition(|job| job.is_due(now));
        self.delayed = pending;

        let mut due = due;
        due.sort_by_key(|job| job.scheduled_at);
        for job in due {
            self.ready.entry(job.queue.clone()).or_default().push_back(job);
        }
    }

    fn push(&mut self, job: JobData) {
        if job.is_due(Utc::now()) {
            self.ready.entry(job.queue.clone()).or_default().push_back(job);
        } else {
            self.delayed.push(job);
        }
    }
}

/// Job queue held in memory, for single-process runs and tests.
///
/// Jobs do not survive a restart.
#[derive(Debug, Default)]
pub struct InMemoryJobQueue {
    state: Mutex<State>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delayed jobs of a queue, soonest first.
    pub fn delayed_jobs(&self, queue: &str) -> Vec<JobData> {
        let mut jobs: Vec<JobData> = self
            .state
            .lock()
            .delayed
            .iter()
            .filter(|job| job.queue == queue)
            .cloned()
            .collect();
        jobs.sort_by_key(|job| job.scheduled_at);
        jobs
    }

    /// Jobs that failed for good.
    pub fn dead_jobs(&self) -> Vec<JobData> {
        self.state.lock().dead.clone()
    }

    /// Number of dequeued, unfinished jobs.
    pub fn active_count(&self) -> usize {
        self.state.lock().active.len()
    }

    /// Makes every delayed job due immediately.
    pub fn release_delayed(&self) {
        let mut state = self.state.lock();
        let now = Utc::now();
        for job in &mut state.delayed {
            job.scheduled_at = now;
        }
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue_with<J: Job>(&self, queued: QueuedJob<J>) -> JobResult<JobId> {
        let job = queued.build()?;
        let job_id = job.id.clone();

        debug!(
            job_id = %job_id,
            queue = %job.queue,
            scheduled_at = %job.scheduled_at,
            "Enqueued job"
        );
        self.state.lock().push(job);

        Ok(job_id)
    }

    async fn dequeue(&self, queues: &[&str], worker_id: &str) -> JobResult<Option<JobData>> {
        let mut state = self.state.lock();
        state.promote_due();

        for queue in queues {
            let Some(mut job) = state.ready.get_mut(*queue).and_then(VecDeque::pop_front) else {
                continue;
            };

            job.increment_attempt();
            state.active.insert(job.id.clone(), job.clone());

            debug!(
                job_id = %job.id,
                queue = %job.queue,
                attempt = job.attempt,
                worker_id = %worker_id,
                "Dequeued job"
            );
            return Ok(Some(job));
        }

        Ok(None)
    }

    async fn complete(&self, job_id: &JobId) -> JobResult<()> {
        self.state
            .lock()
            .active
            .remove(job_id)
            .map(|_| debug!(job_id = %job_id, "Completed job"))
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))
    }

    async fn fail(&self, job_id: &JobId, error: &JobError) -> JobResult<()> {
        let mut state = self.state.lock();
        let mut job = state
            .active
            .remove(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;
        job.last_error = Some(error.to_string());

        if error.is_retryable() && !job.is_exhausted() {
            let delay = ChronoDuration::from_std(retry_delay(job.attempt)).unwrap_or_default();
            job.scheduled_at = Utc::now() + delay;
            debug!(job_id = %job_id, attempt = job.attempt, retry_at = %job.scheduled_at, "Scheduled job retry");
            state.delayed.push(job);
        } else {
            warn!(job_id = %job_id, error = %error, attempts = job.attempt, "Job failed permanently");
            state.dead.push(job);
        }

        Ok(())
    }

    async fn queue_length(&self, queue: &str) -> JobResult<u64> {
        let state = self.state.lock();
        let ready = state.ready.get(queue).map_or(0, VecDeque::len);
        let delayed = state.delayed.iter().filter(|job| job.queue == queue).count();
        Ok((ready + delayed) as u64)
    }

    async fn health_check(&self) -> JobResult<()> {
        Ok(())
    }
}
