//! Background job types.
//!
//! Reconciliation fixes run outside the request path: the caller queues a job
//! and gets an acknowledgement immediately, a worker picks the job up later.
//! Jobs here are deliberately **at-most-once**: a claimed job either completes
//! or fails, it is never retried automatically. A failed fix leaves the
//! on-hand ledger in a state the operator must look at before running again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockrecon_core::UserId;

/// Unique identifier for a background job.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Create a new time-ordered job identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for JobId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// What kind of work a job performs.
///
/// The `type_name` doubles as the handler-registry key, so keep the dotted
/// `area.verb` shape when adding kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Zero and replay on-hand records for a set of flagged products.
    Rebalance,
    /// Escape hatch for callers that bring their own handler.
    Custom { kind: String },
}

impl JobKind {
    pub fn custom(kind: impl Into<String>) -> Self {
        Self::Custom { kind: kind.into() }
    }

    /// Stable string key used for handler dispatch and logging.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Rebalance => "stock.rebalance",
            Self::Custom { kind } => kind,
        }
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Queued, waiting for a worker to claim it.
    Pending,
    /// Claimed by a worker and currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error. Terminal: failed jobs are not re-queued.
    Failed { error: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}

/// A unit of deferred work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    /// Handler-specific arguments, e.g. the product ids a rebalance covers.
    pub payload: serde_json::Value,
    pub status: JobStatus,
    /// The user who queued the job; notifications go back to them.
    pub requested_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(requested_by: UserId, kind: JobKind, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            kind,
            payload,
            status: JobStatus::Pending,
            requested_by,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transition to `Running`, stamping the start time.
    pub fn mark_running(&mut self) {
        let now = Utc::now();
        self.status = JobStatus::Running;
        self.started_at = Some(now);
        self.updated_at = now;
    }

    /// Transition to `Completed`, stamping the finish time.
    pub fn mark_completed(&mut self) {
        let now = Utc::now();
        self.status = JobStatus::Completed;
        self.finished_at = Some(now);
        self.updated_at = now;
    }

    /// Transition to `Failed` with the handler's error message.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        let now = Utc::now();
        self.status = JobStatus::Failed {
            error: error.into(),
        };
        self.finished_at = Some(now);
        self.updated_at = now;
    }
}

/// Outcome reported by a job handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Success,
    Failure(String),
}
