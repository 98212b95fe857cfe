use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockrecon_core::ProductId;

use crate::policy::ClassificationPolicy;

/// Tri-state outcome of the rounding-aware comparison between supposed stock
/// and the recorded on-hand quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceFlag {
    /// Supposed stock is below the on-hand quantity by more than the
    /// product's rounding precision.
    Below,
    /// The raw difference is smaller than the precision; the row is not
    /// considered discrepant.
    Within,
    /// Supposed stock is above the on-hand quantity by more than the
    /// product's rounding precision.
    Above,
}

impl ToleranceFlag {
    pub fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => ToleranceFlag::Below,
            Ordering::Equal => ToleranceFlag::Within,
            Ordering::Greater => ToleranceFlag::Above,
        }
    }

    /// Signed representation (-1 / 0 / +1) used by tabular exports.
    pub fn as_sign(self) -> i8 {
        match self {
            ToleranceFlag::Below => -1,
            ToleranceFlag::Within => 0,
            ToleranceFlag::Above => 1,
        }
    }

    pub fn is_within(self) -> bool {
        self == ToleranceFlag::Within
    }
}

/// One persisted report row; at most one exists per product.
///
/// All quantities are expressed in the product's stock unit of measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceRow {
    pub product: ProductId,
    /// Display name of the product at the time the row was seeded.
    pub name: String,
    /// Sum of done quantities classified as incoming.
    pub incoming: f64,
    /// Sum of done quantities classified as outgoing.
    pub outgoing: f64,
    /// `incoming - outgoing`: what the ledger says should be on hand.
    pub supposed_stock: f64,
    /// Sum of on-hand records across internal locations.
    pub on_hand: f64,
    /// `supposed_stock - on_hand`, exact (no rounding applied).
    pub difference: f64,
    /// Rounding-aware verdict; stays [`ToleranceFlag::Within`] for rows whose
    /// exact difference is zero.
    pub flag: ToleranceFlag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DifferenceRow {
    /// A freshly seeded row: every quantity zero, flag within tolerance.
    pub fn seeded(product: ProductId, name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            product,
            name: name.into(),
            incoming: 0.0,
            outgoing: 0.0,
            supposed_stock: 0.0,
            on_hand: 0.0,
            difference: 0.0,
            flag: ToleranceFlag::Within,
            created_at: at,
            updated_at: at,
        }
    }

    /// Reset the derived fields of an existing row in place, keeping its
    /// creation stamp. This is the upsert path taken when a product already
    /// has a row from an earlier run.
    pub fn reset(&mut self, name: impl Into<String>, at: DateTime<Utc>) {
        self.name = name.into();
        self.incoming = 0.0;
        self.outgoing = 0.0;
        self.supposed_stock = 0.0;
        self.on_hand = 0.0;
        self.difference = 0.0;
        self.flag = ToleranceFlag::Within;
        self.updated_at = at;
    }

    /// Whether the arithmetic identities between the stored quantities hold
    /// bit-for-bit. True after every completed differ run by construction.
    pub fn is_consistent(&self) -> bool {
        self.supposed_stock == self.incoming - self.outgoing
            && self.difference == self.supposed_stock - self.on_hand
    }
}

/// Snapshot returned by a differ run: the persisted rows plus the policy and
/// timing that produced them.
#[derive(Debug, Clone)]
pub struct DifferenceReport {
    pub policy: ClassificationPolicy,
    /// Title callers should present alongside the rows.
    pub display_name: String,
    /// Every row currently in the report table, ordered by product id.
    pub rows: Vec<DifferenceRow>,
    pub elapsed: Duration,
}

impl DifferenceReport {
    pub fn row(&self, product: ProductId) -> Option<&DifferenceRow> {
        self.rows.iter().find(|row| row.product == product)
    }

    /// Rows flagged outside tolerance.
    pub fn flagged_rows(&self) -> impl Iterator<Item = &DifferenceRow> {
        self.rows.iter().filter(|row| !row.flag.is_within())
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged_rows().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_follows_ordering() {
        assert_eq!(ToleranceFlag::from_ordering(Ordering::Less), ToleranceFlag::Below);
        assert_eq!(ToleranceFlag::from_ordering(Ordering::Equal), ToleranceFlag::Within);
        assert_eq!(ToleranceFlag::from_ordering(Ordering::Greater), ToleranceFlag::Above);

        assert_eq!(ToleranceFlag::Below.as_sign(), -1);
        assert_eq!(ToleranceFlag::Within.as_sign(), 0);
        assert_eq!(ToleranceFlag::Above.as_sign(), 1);
    }

    #[test]
    fn seeded_row_is_zeroed_and_consistent() {
        let at = Utc::now();
        let row = DifferenceRow::seeded(ProductId::new(), "Bolt M6", at);

        assert_eq!(row.incoming, 0.0);
        assert_eq!(row.outgoing, 0.0);
        assert_eq!(row.difference, 0.0);
        assert!(row.flag.is_within());
        assert_eq!(row.created_at, at);
        assert!(row.is_consistent());
    }

    #[test]
    fn reset_keeps_creation_stamp() {
        let created = Utc::now();
        let mut row = DifferenceRow::seeded(ProductId::new(), "Bolt M6", created);
        row.incoming = 12.0;
        row.supposed_stock = 12.0;
        row.difference = 12.0;
        row.flag = ToleranceFlag::Above;

        let later = created + chrono::Duration::seconds(90);
        row.reset("Bolt M6 (zinc)", later);

        assert_eq!(row.created_at, created);
        assert_eq!(row.updated_at, later);
        assert_eq!(row.name, "Bolt M6 (zinc)");
        assert_eq!(row.incoming, 0.0);
        assert!(row.flag.is_within());
    }

    #[test]
    fn report_lookups_filter_by_flag() {
        let at = Utc::now();
        let healthy = DifferenceRow::seeded(ProductId::new(), "A", at);
        let mut discrepant = DifferenceRow::seeded(ProductId::new(), "B", at);
        discrepant.difference = 3.0;
        discrepant.flag = ToleranceFlag::Above;

        let report = DifferenceReport {
            policy: ClassificationPolicy::ByLocationUsage,
            display_name: ClassificationPolicy::ByLocationUsage.display_name().to_string(),
            rows: vec![healthy.clone(), discrepant.clone()],
            elapsed: Duration::from_millis(5),
        };

        assert_eq!(report.flagged_count(), 1);
        assert_eq!(report.row(discrepant.product).map(|r| r.flag), Some(ToleranceFlag::Above));
        assert_eq!(report.row(healthy.product).map(|r| r.flag), Some(ToleranceFlag::Within));
        assert!(report.row(ProductId::new()).is_none());
    }
}
