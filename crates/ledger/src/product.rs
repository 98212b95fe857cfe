use serde::{Deserialize, Serialize};

use stockrecon_core::{DomainError, DomainResult, ProductId};

/// Inventory behavior of a product template.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Quantities are tracked per location; the only kind the differ reports on.
    Stockable,
    Consumable,
    Service,
}

/// A product as the reconciliation core sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub kind: ProductKind,
    pub active: bool,
    /// Rounding precision of the product's unit of measure (e.g. `0.01`).
    /// Drives the tolerance comparison between supposed and recorded stock.
    pub uom_rounding: f64,
}

impl ProductRecord {
    /// Create an active product record.
    ///
    /// `uom_rounding` must be a positive, finite precision; the tolerance
    /// comparison is meaningless otherwise.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        kind: ProductKind,
        uom_rounding: f64,
    ) -> DomainResult<Self> {
        if !(uom_rounding.is_finite() && uom_rounding > 0.0) {
            return Err(DomainError::validation(format!(
                "uom_rounding must be a positive finite precision, got {uom_rounding}"
            )));
        }

        Ok(Self {
            id,
            name: name.into(),
            kind,
            active: true,
            uom_rounding,
        })
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Whether this product participates in stock reconciliation at all.
    pub fn is_trackable(&self) -> bool {
        self.active && self.kind == ProductKind::Stockable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stockable(rounding: f64) -> DomainResult<ProductRecord> {
        ProductRecord::new(ProductId::new(), "Widget", ProductKind::Stockable, rounding)
    }

    #[test]
    fn only_active_stockables_are_trackable() {
        assert!(stockable(0.01).unwrap().is_trackable());
        assert!(!stockable(0.01).unwrap().with_active(false).is_trackable());

        let consumable =
            ProductRecord::new(ProductId::new(), "Glue", ProductKind::Consumable, 0.01).unwrap();
        assert!(!consumable.is_trackable());
    }

    #[test]
    fn rejects_degenerate_rounding_precisions() {
        for bad in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            assert!(matches!(stockable(bad), Err(DomainError::Validation(_))));
        }
    }
}
