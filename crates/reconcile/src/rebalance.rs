use std::time::Instant;

use tracing::{debug, info};

use stockrecon_core::ProductId;
use stockrecon_ledger::OnHandKey;

use crate::differ::Differ;
use crate::error::ReconcileError;
use crate::policy::ClassificationPolicy;
use crate::report::DifferenceReport;
use crate::store::{MoveLedger, OnHandLedger, ProductCatalog, ReportStore, StoreError};

/// Rebuilds on-hand records from the movement ledger.
///
/// For each requested product the rebalancer zeroes every existing on-hand
/// record, replays every completed line as a `-qty` delta at its source and
/// a `+qty` delta at its destination (per product, location and lot), then
/// re-runs the differ to verify the rewrite converged. The ledger is the
/// system of record; on-hand quantities are treated as a derived cache that
/// can always be rebuilt from it.
pub struct Rebalancer<S> {
    store: S,
    differ: Differ<S>,
}

/// What a completed rebalance did, plus the verification report.
#[derive(Debug, Clone)]
pub struct RebalanceOutcome {
    pub products: Vec<ProductId>,
    /// On-hand records reset to zero before replay.
    pub records_zeroed: usize,
    /// Completed lines replayed; each contributes two deltas.
    pub lines_replayed: usize,
    /// Report computed after the rewrite, under
    /// [`ClassificationPolicy::ByLocationUsage`].
    pub report: DifferenceReport,
}

impl RebalanceOutcome {
    /// Whether every rebalanced product now reads within tolerance.
    /// Products without a report row (nothing trackable in the ledger)
    /// count as converged.
    pub fn converged(&self) -> bool {
        self.products.iter().all(|product| {
            self.report
                .row(*product)
                .map_or(true, |row| row.flag.is_within())
        })
    }
}

impl<S> Rebalancer<S>
where
    S: ProductCatalog + MoveLedger + OnHandLedger + ReportStore,
{
    pub fn new(store: S) -> Self
    where
        S: Clone,
    {
        Self {
            differ: Differ::new(store.clone()),
            store,
        }
    }

    /// Rewrite on-hand records for `products` from the ledger and verify the
    /// result.
    ///
    /// The done lines are fetched before anything is mutated, so a failure
    /// up to that point aborts with nothing changed. Once zeroing has
    /// started, any storage failure surfaces as
    /// [`ReconcileError::PartialReplay`]; re-running the rebalance for the
    /// same products repairs the half-written state, as the rewrite does not
    /// depend on the quantities it overwrites.
    pub fn rebalance(&self, products: &[ProductId]) -> Result<RebalanceOutcome, ReconcileError> {
        if products.is_empty() {
            return Err(ReconcileError::NoWork);
        }
        let started = Instant::now();
        info!(products = products.len(), "starting stock quantity fix");

        let lines = self.store.done_lines_for(products)?;
        debug!(lines = lines.len(), "collected completed lines to replay");

        let total = lines.len() * 2;
        let partial = |applied: usize, source: StoreError| ReconcileError::PartialReplay {
            products: products.to_vec(),
            applied,
            total,
            source,
        };

        let records_zeroed = self
            .store
            .zero_on_hand(products)
            .map_err(|e| partial(0, e))?;
        debug!(records = records_zeroed, "on-hand records zeroed");

        let mut applied = 0;
        for line in &lines {
            self.store
                .apply_delta(
                    OnHandKey::new(line.product, line.source, line.lot),
                    -line.qty_done,
                )
                .map_err(|e| partial(applied, e))?;
            applied += 1;
            self.store
                .apply_delta(
                    OnHandKey::new(line.product, line.dest, line.lot),
                    line.qty_done,
                )
                .map_err(|e| partial(applied, e))?;
            applied += 1;
        }

        let report = self
            .differ
            .compute_differences(ClassificationPolicy::ByLocationUsage)?;

        let outcome = RebalanceOutcome {
            products: products.to_vec(),
            records_zeroed,
            lines_replayed: lines.len(),
            report,
        };
        info!(
            products = outcome.products.len(),
            lines = outcome.lines_replayed,
            converged = outcome.converged(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "stock quantity fix done"
        );
        Ok(outcome)
    }
}
