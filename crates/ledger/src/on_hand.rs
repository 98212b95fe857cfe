use serde::{Deserialize, Serialize};

use stockrecon_core::{LocationId, LotId, ProductId};

/// Storage key of an on-hand record.
///
/// One record exists per (product, location, lot) triple; `lot: None` is a
/// distinct key from any concrete lot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OnHandKey {
    pub product: ProductId,
    pub location: LocationId,
    pub lot: Option<LotId>,
}

impl OnHandKey {
    pub fn new(product: ProductId, location: LocationId, lot: Option<LotId>) -> Self {
        Self {
            product,
            location,
            lot,
        }
    }
}

/// The system's current belief about how much of a product sits at a
/// location/lot.
///
/// A record with `quantity == 0.0` is semantically equivalent to no record at
/// all; the storage layer tolerates explicit zero rows (the rebalancer leaves
/// them behind on purpose).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnHandRecord {
    pub product: ProductId,
    pub location: LocationId,
    pub lot: Option<LotId>,
    pub quantity: f64,
}

impl OnHandRecord {
    pub fn new(key: OnHandKey, quantity: f64) -> Self {
        Self {
            product: key.product,
            location: key.location,
            lot: key.lot,
            quantity,
        }
    }

    pub fn key(&self) -> OnHandKey {
        OnHandKey::new(self.product, self.location, self.lot)
    }
}
