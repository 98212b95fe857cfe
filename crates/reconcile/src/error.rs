use thiserror::Error;

use stockrecon_core::ProductId;

use crate::store::StoreError;

/// Reconciliation pipeline error.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A fix was requested with an empty product set.
    #[error("no on-hand records to fix")]
    NoWork,

    /// A storage call failed outside the destructive replay window. On-hand
    /// records are either untouched or fully rewritten; the report table is
    /// repaired by the next differ run.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Storage failed while the rebalancer was rewriting on-hand records:
    /// quantities for `products` sit part-way between zeroed and replayed.
    /// Re-running the rebalance for the same products repairs them.
    #[error("replay interrupted after {applied} of {total} deltas, on-hand records left inconsistent: {source}")]
    PartialReplay {
        products: Vec<ProductId>,
        applied: usize,
        total: usize,
        source: StoreError,
    },
}

impl ReconcileError {
    /// Whether on-hand records may have been left mid-rewrite.
    pub fn left_inconsistent(&self) -> bool {
        matches!(self, ReconcileError::PartialReplay { .. })
    }
}
