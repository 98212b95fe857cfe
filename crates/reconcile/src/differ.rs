use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use stockrecon_core::rounding;

use crate::error::ReconcileError;
use crate::policy::ClassificationPolicy;
use crate::report::{DifferenceReport, ToleranceFlag};
use crate::store::{MoveLedger, OnHandLedger, ProductCatalog, ReportStore};

/// Computes the stock quantity difference report.
///
/// A run rebuilds the report table phase by phase: seed one row per
/// trackable product in the ledger, fill the incoming and outgoing totals
/// under the chosen policy, derive `supposed_stock`, fill the recorded
/// on-hand totals, derive the exact `difference`, then give every row with a
/// nonzero difference a rounding-aware verdict. Each phase overwrites
/// whatever the previous run wrote, so running the differ again (including
/// after a crash) converges on the same rows.
pub struct Differ<S> {
    store: S,
}

impl<S> Differ<S>
where
    S: ProductCatalog + MoveLedger + OnHandLedger + ReportStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn compute_differences(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<DifferenceReport, ReconcileError> {
        let started = Instant::now();
        info!(policy = ?policy, "computing stock quantity differences");

        let products = self.store.trackable_products_in_ledger()?;
        self.store.seed_rows(&products, Utc::now())?;

        let incoming = self.store.sum_incoming(policy)?;
        self.store.fill_incoming(&incoming)?;
        let outgoing = self.store.sum_outgoing(policy)?;
        self.store.fill_outgoing(&outgoing)?;
        self.store.derive_supposed_stock()?;

        let on_hand = self.store.internal_on_hand_by_product()?;
        self.store.fill_on_hand(&on_hand)?;
        self.store.derive_difference()?;

        for row in self.store.rows_with_nonzero_difference()? {
            let Some(precision) = self.store.uom_rounding(row.product)? else {
                warn!(product = %row.product, "no rounding precision on file, leaving flag unset");
                continue;
            };
            let verdict = rounding::compare(row.supposed_stock, row.on_hand, precision);
            self.store
                .set_flag(row.product, ToleranceFlag::from_ordering(verdict), Utc::now())?;
        }

        let report = DifferenceReport {
            policy,
            display_name: policy.display_name().to_string(),
            rows: self.store.rows()?,
            elapsed: started.elapsed(),
        };
        info!(
            policy = ?policy,
            rows = report.rows.len(),
            flagged = report.flagged_count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "stock quantity differences computed"
        );
        Ok(report)
    }
}
