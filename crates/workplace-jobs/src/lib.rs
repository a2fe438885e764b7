//! # Workplace Jobs
//!
//! Queue-driven background work for the Workplace integration:
//! - Typed jobs carried as JSON envelopes
//! - Redis and in-memory queues with delayed delivery and a dead letter queue
//! - A single-job worker dispatching by job name
//! - Recurring tasks that re-arm themselves only after a completed run
//! - The daily group snapshot, written to restricted storage
//!
//! ```text
//!   seed ──► queue ──► JobWorker ──► GroupSnapshotScheduler
//!              ▲                         │ all_groups()
//!              │                         ▼
//!              └── delayed next run ◄── SecureStorage.write_file
//! ```

pub mod error;
pub mod job;
pub mod memory;
pub mod queue;
pub mod recurring;
pub mod redis;
pub mod snapshot_job;
pub mod storage;
pub mod worker;

pub use error::{JobError, JobResult};
pub use job::{Job, JobContext, JobData, JobId};
pub use memory::InMemoryJobQueue;
pub use queue::{JobQueue, QueuedJob};
pub use recurring::{RecurringRunner, RecurringTask, RunOutcome};
pub use self::redis::{create_pool, RedisJobQueue, RedisKeys};
pub use snapshot_job::{
    GroupSnapshotJob, GroupSnapshotScheduler, GroupSnapshotTask, SnapshotRunReport,
    SnapshotRunState,
};
pub use storage::{AccessPolicy, FsSecureStorage, SecureStorage};
pub use worker::{JobWorker, WorkerConfig};
