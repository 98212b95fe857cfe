//! `stockrecon-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the domain error model, and the precision-aware
//! quantity rounding used for tolerance comparisons.

pub mod error;
pub mod id;
pub mod rounding;

pub use error::{DomainError, DomainResult};
pub use id::{LocationId, LotId, MoveLineId, ProductId, UserId};
