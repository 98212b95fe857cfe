//! Storage ports the differ and rebalancer run against.
//!
//! The reconciliation core never talks to a database directly; it drives the
//! four traits below. `stockrecon-infra` provides a Postgres adapter, and
//! [`crate::memory::InMemoryStockStore`] implements all four for tests and
//! single-process use.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use stockrecon_core::ProductId;
use stockrecon_ledger::{MoveLine, OnHandKey, ProductRecord};

use crate::policy::ClassificationPolicy;
use crate::report::{DifferenceRow, ToleranceFlag};

/// Storage adapter error.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("no report row for product {0}")]
    RowMissing(ProductId),
    #[error("storage lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }
}

/// Product catalog lookups.
pub trait ProductCatalog: Send + Sync {
    /// Distinct products that appear in the movement ledger (in any line
    /// state) and are active and stockable, ordered by product id.
    ///
    /// Line state is deliberately ignored here: a product whose only
    /// movements are still draft gets a report row with zero totals rather
    /// than no row at all.
    fn trackable_products_in_ledger(&self) -> Result<Vec<ProductRecord>, StoreError>;

    /// Rounding precision of the product's stock unit of measure, or `None`
    /// for an unknown product.
    fn uom_rounding(&self, product: ProductId) -> Result<Option<f64>, StoreError>;
}

/// Aggregate queries over the movement ledger. Read-only.
pub trait MoveLedger: Send + Sync {
    /// Sum of done quantities classified as incoming under `policy`, per
    /// product. Products with no matching lines are absent from the map.
    ///
    /// No trackability filter applies: totals cover every product with
    /// matching done lines, so rows left over from earlier runs (for
    /// products since archived) keep getting refreshed.
    fn sum_incoming(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<HashMap<ProductId, f64>, StoreError>;

    /// Mirror of [`MoveLedger::sum_incoming`] for the outgoing side.
    fn sum_outgoing(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<HashMap<ProductId, f64>, StoreError>;

    /// Every done line touching one of `products`, in implementation-defined
    /// order. Replay applies each line's deltas independently, so callers
    /// must not rely on any particular ordering.
    fn done_lines_for(&self, products: &[ProductId]) -> Result<Vec<MoveLine>, StoreError>;
}

/// Reads and writes over the on-hand quantity table.
pub trait OnHandLedger: Send + Sync {
    /// Sum of on-hand quantities per product across internal locations.
    /// Records at non-internal locations do not contribute.
    fn internal_on_hand_by_product(&self) -> Result<HashMap<ProductId, f64>, StoreError>;

    /// Set every on-hand record of the given products to zero, at every
    /// location. Records are kept (at quantity zero), not deleted. Returns
    /// the number of records touched.
    fn zero_on_hand(&self, products: &[ProductId]) -> Result<usize, StoreError>;

    /// Add `delta` to the record at `key`, creating the record with quantity
    /// `delta` when none exists.
    fn apply_delta(&self, key: OnHandKey, delta: f64) -> Result<(), StoreError>;

    /// Current quantity at `key`; `None` when no record exists.
    fn on_hand(&self, key: OnHandKey) -> Result<Option<f64>, StoreError>;
}

/// Phase writes over the difference report table.
///
/// The differ drives these strictly in order: `seed_rows`, `fill_incoming`,
/// `fill_outgoing`, `derive_supposed_stock`, `fill_on_hand`,
/// `derive_difference`, then `set_flag` per discrepant row. Each phase
/// overwrites what the previous run left behind, so a crashed run is
/// repaired by the next one.
///
/// `fill_*` phases only touch rows for products present in the given totals;
/// `derive_*` phases recompute their column for every row in the table,
/// including rows seeded by earlier runs whose product no longer qualifies
/// for seeding.
pub trait ReportStore: Send + Sync {
    /// Insert a zeroed row per product, resetting (not duplicating) rows
    /// that already exist. Returns the number of rows seeded.
    fn seed_rows(&self, products: &[ProductRecord], at: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Write each product's incoming total onto its row.
    fn fill_incoming(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError>;

    /// Write each product's outgoing total onto its row.
    fn fill_outgoing(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError>;

    /// Recompute `supposed_stock = incoming - outgoing` for every row.
    fn derive_supposed_stock(&self) -> Result<(), StoreError>;

    /// Write each product's internal on-hand total onto its row.
    fn fill_on_hand(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError>;

    /// Recompute `difference = supposed_stock - on_hand` for every row.
    fn derive_difference(&self) -> Result<(), StoreError>;

    /// Rows whose exact difference is nonzero, ordered by product id. Only
    /// these receive a rounding-aware comparison; the rest keep the seeded
    /// within-tolerance flag.
    fn rows_with_nonzero_difference(&self) -> Result<Vec<DifferenceRow>, StoreError>;

    /// Store the comparison verdict on one row, bumping its update stamp.
    fn set_flag(
        &self,
        product: ProductId,
        flag: ToleranceFlag,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Every row in the table, ordered by product id.
    fn rows(&self) -> Result<Vec<DifferenceRow>, StoreError>;

    /// One product's row, if present.
    fn row(&self, product: ProductId) -> Result<Option<DifferenceRow>, StoreError>;

    /// Products whose row is currently flagged outside tolerance, ordered by
    /// product id.
    fn flagged_products(&self) -> Result<Vec<ProductId>, StoreError>;
}

impl<S> ProductCatalog for Arc<S>
where
    S: ProductCatalog + ?Sized,
{
    fn trackable_products_in_ledger(&self) -> Result<Vec<ProductRecord>, StoreError> {
        (**self).trackable_products_in_ledger()
    }

    fn uom_rounding(&self, product: ProductId) -> Result<Option<f64>, StoreError> {
        (**self).uom_rounding(product)
    }
}

impl<S> MoveLedger for Arc<S>
where
    S: MoveLedger + ?Sized,
{
    fn sum_incoming(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<HashMap<ProductId, f64>, StoreError> {
        (**self).sum_incoming(policy)
    }

    fn sum_outgoing(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<HashMap<ProductId, f64>, StoreError> {
        (**self).sum_outgoing(policy)
    }

    fn done_lines_for(&self, products: &[ProductId]) -> Result<Vec<MoveLine>, StoreError> {
        (**self).done_lines_for(products)
    }
}

impl<S> OnHandLedger for Arc<S>
where
    S: OnHandLedger + ?Sized,
{
    fn internal_on_hand_by_product(&self) -> Result<HashMap<ProductId, f64>, StoreError> {
        (**self).internal_on_hand_by_product()
    }

    fn zero_on_hand(&self, products: &[ProductId]) -> Result<usize, StoreError> {
        (**self).zero_on_hand(products)
    }

    fn apply_delta(&self, key: OnHandKey, delta: f64) -> Result<(), StoreError> {
        (**self).apply_delta(key, delta)
    }

    fn on_hand(&self, key: OnHandKey) -> Result<Option<f64>, StoreError> {
        (**self).on_hand(key)
    }
}

impl<S> ReportStore for Arc<S>
where
    S: ReportStore + ?Sized,
{
    fn seed_rows(&self, products: &[ProductRecord], at: DateTime<Utc>) -> Result<usize, StoreError> {
        (**self).seed_rows(products, at)
    }

    fn fill_incoming(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError> {
        (**self).fill_incoming(totals)
    }

    fn fill_outgoing(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError> {
        (**self).fill_outgoing(totals)
    }

    fn derive_supposed_stock(&self) -> Result<(), StoreError> {
        (**self).derive_supposed_stock()
    }

    fn fill_on_hand(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError> {
        (**self).fill_on_hand(totals)
    }

    fn derive_difference(&self) -> Result<(), StoreError> {
        (**self).derive_difference()
    }

    fn rows_with_nonzero_difference(&self) -> Result<Vec<DifferenceRow>, StoreError> {
        (**self).rows_with_nonzero_difference()
    }

    fn set_flag(
        &self,
        product: ProductId,
        flag: ToleranceFlag,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        (**self).set_flag(product, flag, at)
    }

    fn rows(&self) -> Result<Vec<DifferenceRow>, StoreError> {
        (**self).rows()
    }

    fn row(&self, product: ProductId) -> Result<Option<DifferenceRow>, StoreError> {
        (**self).row(product)
    }

    fn flagged_products(&self) -> Result<Vec<ProductId>, StoreError> {
        (**self).flagged_products()
    }
}
