//! `stockrecon-infra` — infrastructure around the reconciliation core.
//!
//! The reconcile crate defines the algorithms and their storage ports; this
//! crate supplies everything that makes them operational:
//!
//! - [`jobs`] — at-most-once background jobs with an in-memory queue and a
//!   polling executor
//! - [`notify`] — the user notification channel (info/success/error)
//! - [`service`] — the entry point wiring reports, job queueing and
//!   notifications together
//! - [`pg`] — the Postgres implementation of the storage ports

pub mod jobs;
pub mod notify;
pub mod pg;
pub mod service;

pub use jobs::{
    ExecutorStats, InMemoryJobStore, Job, JobExecutor, JobExecutorConfig, JobExecutorHandle,
    JobHandler, JobId, JobKind, JobResult, JobStats, JobStatus, JobStore, JobStoreError,
};
pub use notify::{InMemoryNotifier, Notification, NotificationKind, Notifier, TracingNotifier};
pub use pg::PgStockStore;
pub use service::{RebalancePayload, ReconciliationService, ServiceError};
