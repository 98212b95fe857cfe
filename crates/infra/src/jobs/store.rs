//! Job persistence.
//!
//! The [`JobStore`] trait is the queue contract: enqueue new jobs, let workers
//! claim the oldest pending one, and record terminal outcomes. The in-memory
//! implementation backs tests and single-process deployments.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use super::types::{Job, JobId, JobStatus};

/// Errors surfaced by job storage.
#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),

    #[error("job already exists: {0}")]
    AlreadyExists(JobId),

    #[error("job storage error: {0}")]
    Storage(String),
}

impl JobStoreError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// Queue counters, one bucket per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobStats {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Contract for queueing and tracking background jobs.
///
/// Claim semantics are at-most-once: `claim_next` atomically flips the oldest
/// pending job to `Running`, so two workers polling the same store never
/// execute the same job twice.
pub trait JobStore: Send + Sync {
    /// Add a new job to the queue. Fails if the id is already taken.
    fn enqueue(&self, job: Job) -> Result<(), JobStoreError>;

    /// Fetch a job by id.
    fn get(&self, id: JobId) -> Result<Job, JobStoreError>;

    /// Persist an updated job (status transitions, timestamps).
    fn update(&self, job: &Job) -> Result<(), JobStoreError>;

    /// Claim the oldest pending job, marking it `Running`.
    ///
    /// Returns `None` when the queue has no pending work.
    fn claim_next(&self) -> Result<Option<Job>, JobStoreError>;

    /// All jobs currently in the given state, oldest first.
    fn list_by_status(&self, status: &JobStatus) -> Result<Vec<Job>, JobStoreError>;

    /// Counters across the whole queue.
    fn stats(&self) -> Result<JobStats, JobStoreError>;
}

impl<S> JobStore for Arc<S>
where
    S: JobStore + ?Sized,
{
    fn enqueue(&self, job: Job) -> Result<(), JobStoreError> {
        (**self).enqueue(job)
    }

    fn get(&self, id: JobId) -> Result<Job, JobStoreError> {
        (**self).get(id)
    }

    fn update(&self, job: &Job) -> Result<(), JobStoreError> {
        (**self).update(job)
    }

    fn claim_next(&self) -> Result<Option<Job>, JobStoreError> {
        (**self).claim_next()
    }

    fn list_by_status(&self, status: &JobStatus) -> Result<Vec<Job>, JobStoreError> {
        (**self).list_by_status(status)
    }

    fn stats(&self) -> Result<JobStats, JobStoreError> {
        (**self).stats()
    }
}

/// In-memory job store.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for shared use.
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<JobId, Job>>, JobStoreError> {
        self.jobs
            .read()
            .map_err(|_| JobStoreError::storage("job store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<JobId, Job>>, JobStoreError> {
        self.jobs
            .write()
            .map_err(|_| JobStoreError::storage("job store lock poisoned"))
    }
}

impl JobStore for InMemoryJobStore {
    fn enqueue(&self, job: Job) -> Result<(), JobStoreError> {
        let mut jobs = self.write()?;
        if jobs.contains_key(&job.id) {
            return Err(JobStoreError::AlreadyExists(job.id));
        }
        jobs.insert(job.id, job);
        Ok(())
    }

    fn get(&self, id: JobId) -> Result<Job, JobStoreError> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or(JobStoreError::NotFound(id))
    }

    fn update(&self, job: &Job) -> Result<(), JobStoreError> {
        let mut jobs = self.write()?;
        if !jobs.contains_key(&job.id) {
            return Err(JobStoreError::NotFound(job.id));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    fn claim_next(&self) -> Result<Option<Job>, JobStoreError> {
        let mut jobs = self.write()?;

        // FIFO: oldest pending job wins.
        let next_id = jobs
            .values()
            .filter(|job| job.status == JobStatus::Pending)
            .min_by_key(|job| (job.created_at, job.id))
            .map(|job| job.id);

        let Some(id) = next_id else {
            return Ok(None);
        };

        let job = jobs
            .get_mut(&id)
            .ok_or(JobStoreError::NotFound(id))?;
        job.mark_running();
        Ok(Some(job.clone()))
    }

    fn list_by_status(&self, status: &JobStatus) -> Result<Vec<Job>, JobStoreError> {
        let jobs = self.read()?;
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|job| {
                // Failed jobs match regardless of the error message.
                std::mem::discriminant(&job.status) == std::mem::discriminant(status)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|job| (job.created_at, job.id));
        Ok(matching)
    }

    fn stats(&self) -> Result<JobStats, JobStoreError> {
        let jobs = self.read()?;
        let mut stats = JobStats::default();
        for job in jobs.values() {
            match &job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed { .. } => stats.failed += 1,
            }
        }
        Ok(stats)
    }
}
