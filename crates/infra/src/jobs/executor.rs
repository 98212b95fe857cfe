//! Job executor.
//!
//! Polls a [`JobStore`] for pending work on a dedicated worker thread and
//! dispatches each claimed job to a registered handler. Handlers are plain
//! closures keyed by the job kind's `type_name`; `"*"` registers a fallback
//! used when no exact key matches.
//!
//! For deterministic tests, [`JobExecutor::execute_one`] runs a single claim
//! cycle on the caller's thread instead of spawning the worker.

use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::store::{JobStore, JobStoreError};
use super::types::{Job, JobResult};

/// Handler invoked for a claimed job.
pub type JobHandler = Box<dyn Fn(&Job) -> JobResult + Send + Sync>;

/// Tuning for the worker loop.
#[derive(Debug, Clone)]
pub struct JobExecutorConfig {
    /// How long to sleep when a claim finds no pending work.
    pub poll_interval: Duration,
    /// Worker thread name, surfaced in logs and stack traces.
    pub name: String,
}

impl Default for JobExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            name: "stockrecon-jobs".to_string(),
        }
    }
}

/// Counters maintained by the worker loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    pub jobs_processed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub uptime_secs: u64,
}

/// Control handle for a spawned executor.
pub struct JobExecutorHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<ExecutorStats>>,
}

impl JobExecutorHandle {
    /// Snapshot of the worker's counters.
    pub fn stats(&self) -> ExecutorStats {
        self.stats.lock().map(|s| *s).unwrap_or_default()
    }

    /// Stop the worker after its current job and wait for the thread to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Dispatches claimed jobs to handlers.
pub struct JobExecutor<S> {
    store: S,
    handlers: HashMap<String, JobHandler>,
    config: JobExecutorConfig,
}

impl<S> JobExecutor<S>
where
    S: JobStore + Send + 'static,
{
    pub fn new(store: S, config: JobExecutorConfig) -> Self {
        Self {
            store,
            handlers: HashMap::new(),
            config,
        }
    }

    /// Register a handler for a job type. `"*"` catches everything without an
    /// exact match.
    pub fn register_handler(&mut self, type_name: impl Into<String>, handler: JobHandler) {
        self.handlers.insert(type_name.into(), handler);
    }

    fn handler_for(&self, type_name: &str) -> Option<&JobHandler> {
        self.handlers
            .get(type_name)
            .or_else(|| self.handlers.get("*"))
    }

    /// Run one claim cycle synchronously.
    ///
    /// Returns the job's outcome, or `None` when the queue had no pending work.
    pub fn execute_one(&self) -> Result<Option<JobResult>, JobStoreError> {
        let Some(mut job) = self.store.claim_next()? else {
            return Ok(None);
        };
        let result = self.run_claimed(&mut job)?;
        Ok(Some(result))
    }

    /// Execute a job that has already been claimed and persist its outcome.
    fn run_claimed(&self, job: &mut Job) -> Result<JobResult, JobStoreError> {
        let type_name = job.kind.type_name().to_string();

        let result = match self.handler_for(&type_name) {
            Some(handler) => handler(job),
            None => JobResult::Failure(format!("no handler registered for '{type_name}'")),
        };

        match &result {
            JobResult::Success => {
                job.mark_completed();
                info!(job_id = %job.id, kind = %type_name, "job completed");
            }
            JobResult::Failure(error) => {
                job.mark_failed(error.clone());
                warn!(job_id = %job.id, kind = %type_name, error = %error, "job failed");
            }
        }

        self.store.update(job)?;
        Ok(result)
    }

    /// Spawn the worker thread and return its control handle.
    pub fn spawn(self) -> JobExecutorHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(ExecutorStats::default()));
        let loop_stats = Arc::clone(&stats);
        let name = self.config.name.clone();

        let join = thread::Builder::new()
            .name(name)
            .spawn(move || executor_loop(self, shutdown_rx, loop_stats))
            .expect("failed to spawn job executor thread");

        JobExecutorHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        }
    }
}

fn executor_loop<S>(
    executor: JobExecutor<S>,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<ExecutorStats>>,
) where
    S: JobStore + Send + 'static,
{
    let started = Instant::now();
    info!(worker = %executor.config.name, "job executor started");

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let outcome = executor.execute_one();

        if let Ok(mut s) = stats.lock() {
            s.uptime_secs = started.elapsed().as_secs();
            match &outcome {
                Ok(Some(JobResult::Success)) => {
                    s.jobs_processed += 1;
                    s.jobs_succeeded += 1;
                }
                Ok(Some(JobResult::Failure(_))) => {
                    s.jobs_processed += 1;
                    s.jobs_failed += 1;
                }
                Ok(None) | Err(_) => {}
            }
        }

        match outcome {
            Ok(Some(_)) => {
                // More work may be waiting; claim again immediately.
            }
            Ok(None) => thread::sleep(executor.config.poll_interval),
            Err(e) => {
                warn!(worker = %executor.config.name, error = %e, "job claim cycle failed");
                thread::sleep(executor.config.poll_interval);
            }
        }
    }

    info!(worker = %executor.config.name, "job executor stopped");
}
