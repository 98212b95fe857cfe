//! Deferred background jobs.
//!
//! Rebalancing a warehouse can touch thousands of on-hand records, so it never
//! runs in the caller's thread: the service enqueues a [`Job`] and a worker
//! executes it later. The subsystem is split into:
//!
//! - [`types`] — job lifecycle data (`Job`, `JobKind`, `JobStatus`, `JobResult`)
//! - [`store`] — the queue contract and the in-memory implementation
//! - [`executor`] — the polling worker that dispatches claimed jobs to handlers

pub mod executor;
pub mod store;
pub mod types;

pub use executor::{ExecutorStats, JobExecutor, JobExecutorConfig, JobExecutorHandle, JobHandler};
pub use store::{InMemoryJobStore, JobStats, JobStore, JobStoreError};
pub use types::{Job, JobId, JobKind, JobResult, JobStatus};
