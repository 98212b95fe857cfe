use serde::{Deserialize, Serialize};

use stockrecon_core::{LocationId, LotId, MoveLineId, ProductId};

/// Completion state of a movement line.
///
/// Only [`Done`](MoveState::Done) lines are authoritative: the differ and the
/// rebalancer ignore everything else.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveState {
    Draft,
    Assigned,
    Done,
    Cancelled,
}

/// Operation type of the movement containing a line (the picking type code).
///
/// `None` on a line means the movement had no picking attached.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Incoming,
    Outgoing,
    Internal,
}

/// One recorded unit of product transfer between two locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveLine {
    pub id: MoveLineId,
    pub product: ProductId,
    pub source: LocationId,
    pub dest: LocationId,
    pub qty_done: f64,
    pub lot: Option<LotId>,
    pub state: MoveState,
    pub operation: Option<OperationKind>,
}

impl MoveLine {
    /// A completed line, the common case throughout the reconciliation core.
    pub fn done(product: ProductId, source: LocationId, dest: LocationId, qty_done: f64) -> Self {
        Self {
            id: MoveLineId::new(),
            product,
            source,
            dest,
            qty_done,
            lot: None,
            state: MoveState::Done,
            operation: None,
        }
    }

    pub fn with_lot(mut self, lot: LotId) -> Self {
        self.lot = Some(lot);
        self
    }

    pub fn with_state(mut self, state: MoveState) -> Self {
        self.state = state;
        self
    }

    pub fn with_operation(mut self, operation: OperationKind) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn is_done(&self) -> bool {
        self.state == MoveState::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_done_lines_are_authoritative() {
        let product = ProductId::new();
        let a = LocationId::new();
        let b = LocationId::new();

        assert!(MoveLine::done(product, a, b, 1.0).is_done());
        for state in [MoveState::Draft, MoveState::Assigned, MoveState::Cancelled] {
            assert!(!MoveLine::done(product, a, b, 1.0).with_state(state).is_done());
        }
    }

    #[test]
    fn builder_helpers_fill_optional_fields() {
        let lot = LotId::new();
        let line = MoveLine::done(ProductId::new(), LocationId::new(), LocationId::new(), 2.5)
            .with_lot(lot)
            .with_operation(OperationKind::Incoming);

        assert_eq!(line.lot, Some(lot));
        assert_eq!(line.operation, Some(OperationKind::Incoming));
        assert_eq!(line.qty_done, 2.5);
    }
}
