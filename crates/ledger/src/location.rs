use serde::{Deserialize, Serialize};

use stockrecon_core::LocationId;

/// What a stock location is used for.
///
/// Locations with usage [`Internal`](LocationUsage::Internal) hold trackable
/// stock; everything else is "external" from the bookkeeping point of view
/// (vendors, customers, inventory-adjustment counterparts, production inputs,
/// transit buffers, or structural view nodes).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationUsage {
    Supplier,
    View,
    Internal,
    Customer,
    Inventory,
    Production,
    Transit,
}

impl LocationUsage {
    /// Whether stock sitting at a location of this usage counts as on hand.
    pub fn is_internal(&self) -> bool {
        matches!(self, LocationUsage::Internal)
    }
}

/// A stock location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub usage: LocationUsage,
}

impl Location {
    pub fn new(name: impl Into<String>, usage: LocationUsage) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            usage,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.usage.is_internal()
    }
}
