use serde::{Deserialize, Serialize};

use stockrecon_ledger::{LocationUsage, OperationKind};

/// Rule set deciding whether a completed movement line counts toward a
/// product's incoming or outgoing total.
///
/// Both policies look at the same ledger; they disagree on *which* lines
/// matter. Running the differ once per policy yields two independent reports
/// that can be cross-checked against each other.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationPolicy {
    /// Classify by the usage of the locations a line crosses: a line is
    /// incoming when its destination is an internal location and outgoing
    /// when its source is. A line moving stock between two internal
    /// locations therefore counts on *both* sides, contributing zero net
    /// once incoming and outgoing are subtracted.
    ByLocationUsage,
    /// Classify by the operation type of the containing movement, folding
    /// inventory-adjustment and production counterparts in: incoming when
    /// the operation is a receipt or the source is an inventory/production
    /// location, outgoing when the operation is a delivery or the
    /// destination is one.
    ByPickingType,
}

impl ClassificationPolicy {
    /// Human-facing title of the report this policy produces.
    pub fn display_name(self) -> &'static str {
        match self {
            ClassificationPolicy::ByLocationUsage => "Stock Quantity Difference",
            ClassificationPolicy::ByPickingType => "Stock Qty - Picking Type Discrepancy",
        }
    }

    /// Whether a done line with the given location usages and operation kind
    /// counts toward the incoming total.
    ///
    /// `None` usages denote locations unknown to the warehouse (external
    /// partners, scrapped records); they never classify as internal or as
    /// adjustment locations.
    pub fn is_incoming(
        self,
        source: Option<LocationUsage>,
        dest: Option<LocationUsage>,
        operation: Option<OperationKind>,
    ) -> bool {
        match self {
            ClassificationPolicy::ByLocationUsage => dest.is_some_and(|usage| usage.is_internal()),
            ClassificationPolicy::ByPickingType => {
                operation == Some(OperationKind::Incoming)
                    || source.is_some_and(is_adjustment_usage)
            }
        }
    }

    /// Mirror of [`ClassificationPolicy::is_incoming`] for the outgoing total.
    pub fn is_outgoing(
        self,
        source: Option<LocationUsage>,
        dest: Option<LocationUsage>,
        operation: Option<OperationKind>,
    ) -> bool {
        match self {
            ClassificationPolicy::ByLocationUsage => source.is_some_and(|usage| usage.is_internal()),
            ClassificationPolicy::ByPickingType => {
                operation == Some(OperationKind::Outgoing)
                    || dest.is_some_and(is_adjustment_usage)
            }
        }
    }
}

/// Inventory-loss and production locations stand in for receipts/deliveries
/// that never cross a picking boundary.
fn is_adjustment_usage(usage: LocationUsage) -> bool {
    matches!(usage, LocationUsage::Inventory | LocationUsage::Production)
}
