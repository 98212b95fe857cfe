//! `stockrecon-reconcile` — the reconciliation core.
//!
//! Two engines operate on the stock ledger through storage ports:
//!
//! - [`Differ`] aggregates completed movement lines into incoming/outgoing
//!   totals per product under a [`ClassificationPolicy`], derives the stock
//!   the ledger implies, compares it against recorded on-hand quantities
//!   with a rounding-aware tolerance, and persists one report row per
//!   product.
//! - [`Rebalancer`] rebuilds the on-hand records of flagged products by
//!   zeroing them and replaying every completed line, then re-runs the
//!   differ to verify convergence.
//!
//! Storage is abstracted behind the traits in [`store`];
//! [`InMemoryStockStore`] backs tests and single-process use, and
//! `stockrecon-infra` provides the Postgres adapter plus job dispatch.

pub mod differ;
pub mod error;
pub mod memory;
pub mod policy;
pub mod rebalance;
pub mod report;
pub mod store;

pub use differ::Differ;
pub use error::ReconcileError;
pub use memory::InMemoryStockStore;
pub use policy::ClassificationPolicy;
pub use rebalance::{RebalanceOutcome, Rebalancer};
pub use report::{DifferenceReport, DifferenceRow, ToleranceFlag};
pub use store::{MoveLedger, OnHandLedger, ProductCatalog, ReportStore, StoreError};
