//! Stock ledger record model.
//!
//! This crate mirrors the host ERP's system of record as plain, deterministic
//! domain types (no IO, no storage): movement lines, locations with a usage
//! classification, products with their unit-of-measure rounding, and the
//! on-hand records the reconciler rewrites. The reconciliation core reads and
//! writes these records exclusively through its storage ports.

pub mod location;
pub mod move_line;
pub mod on_hand;
pub mod product;

pub use location::{Location, LocationUsage};
pub use move_line::{MoveLine, MoveState, OperationKind};
pub use on_hand::{OnHandKey, OnHandRecord};
pub use product::{ProductKind, ProductRecord};
