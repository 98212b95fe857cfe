//! Reconciliation service.
//!
//! Ties the report and rebalance algorithms to the infrastructure: running a
//! difference report is synchronous, while a rebalance is queued as a
//! background job and reported back to the requesting user through the
//! notification channel. The service never talks to a concrete queue or
//! notifier, only to the [`JobStore`] and [`Notifier`] traits.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use stockrecon_core::{ProductId, UserId};
use stockrecon_reconcile::{
    ClassificationPolicy, DifferenceReport, Differ, MoveLedger, OnHandLedger, ProductCatalog,
    Rebalancer, ReconcileError, ReportStore,
};

use crate::jobs::{Job, JobHandler, JobId, JobKind, JobResult, JobStore, JobStoreError};
use crate::notify::Notifier;

/// Errors surfaced by the service entry points.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// `queue_rebalance` was called while the report has no flagged rows.
    #[error("no on-hand records to fix")]
    NothingToFix,

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("job queue error: {0}")]
    Jobs(#[from] JobStoreError),
}

/// Arguments carried by a rebalance job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalancePayload {
    /// Products whose on-hand records get zeroed and replayed.
    pub products: Vec<ProductId>,
}

/// Entry point for running reports and queueing fixes.
pub struct ReconciliationService<S, J, N> {
    store: S,
    jobs: J,
    notifier: N,
}

impl<S, J, N> ReconciliationService<S, J, N>
where
    S: ProductCatalog + MoveLedger + OnHandLedger + ReportStore + Clone,
    J: JobStore,
    N: Notifier,
{
    pub fn new(store: S, jobs: J, notifier: N) -> Self {
        Self {
            store,
            jobs,
            notifier,
        }
    }

    /// Rebuild the difference report under the given policy.
    pub fn run_difference_report(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<DifferenceReport, ServiceError> {
        let differ = Differ::new(self.store.clone());
        Ok(differ.compute_differences(policy)?)
    }

    /// Queue a background rebalance for every product the report flags.
    ///
    /// Refuses to queue when nothing is flagged, so the caller learns
    /// immediately that there is no work instead of waiting on an empty job.
    #[instrument(skip(self), fields(requested_by = %requested_by), err)]
    pub fn queue_rebalance(&self, requested_by: UserId) -> Result<JobId, ServiceError> {
        let flagged = self
            .store
            .flagged_products()
            .map_err(ReconcileError::from)?;
        if flagged.is_empty() {
            return Err(ServiceError::NothingToFix);
        }

        let payload = RebalancePayload { products: flagged };
        let payload_json = serde_json::to_value(&payload)
            .map_err(|e| JobStoreError::storage(format!("failed to encode payload: {e}")))?;
        let job = Job::new(requested_by, JobKind::Rebalance, payload_json);
        let job_id = job.id;

        self.jobs.enqueue(job)?;
        self.notifier
            .info(requested_by, "Stock rebalance queued.", false);
        info!(job_id = %job_id, products = payload.products.len(), "rebalance queued");

        Ok(job_id)
    }

    /// Job body for a queued rebalance.
    ///
    /// Outcomes are reported to the requesting user: a sticky success note
    /// when the fix lands, a sticky error note when it does not. An
    /// interrupted replay leaves on-hand records inconsistent; re-queueing the
    /// same products is the documented recovery, so the error text carries
    /// everything the user needs to decide that.
    pub fn execute_rebalance(&self, job: &Job) -> JobResult {
        let payload: RebalancePayload = match serde_json::from_value(job.payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                let message = format!("invalid rebalance payload: {e}");
                warn!(job_id = %job.id, error = %message, "rebalance not started");
                self.notifier.error(
                    job.requested_by,
                    format!("Stock rebalance failed: {message}"),
                    true,
                );
                return JobResult::Failure(message);
            }
        };

        let rebalancer = Rebalancer::new(self.store.clone());
        match rebalancer.rebalance(&payload.products) {
            Ok(outcome) => {
                info!(
                    job_id = %job.id,
                    products = outcome.products.len(),
                    lines_replayed = outcome.lines_replayed,
                    converged = outcome.converged(),
                    "rebalance finished"
                );
                self.notifier
                    .success(job.requested_by, "Stock rebalance completed.", true);
                JobResult::Success
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "rebalance failed");
                self.notifier
                    .error(job.requested_by, format!("Stock rebalance failed: {e}"), true);
                JobResult::Failure(e.to_string())
            }
        }
    }
}

impl<S, J, N> ReconciliationService<S, J, N>
where
    S: ProductCatalog + MoveLedger + OnHandLedger + ReportStore + Clone + Send + Sync + 'static,
    J: JobStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    /// Handler closure for [`JobKind::Rebalance`], ready to register with a
    /// [`crate::jobs::JobExecutor`].
    pub fn rebalance_handler(self: &std::sync::Arc<Self>) -> JobHandler {
        let service = std::sync::Arc::clone(self);
        Box::new(move |job| service.execute_rebalance(job))
    }
}
