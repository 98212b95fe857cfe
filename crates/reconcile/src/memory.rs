use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use stockrecon_core::{LocationId, ProductId};
use stockrecon_ledger::{Location, LocationUsage, MoveLine, OnHandKey, OperationKind, ProductRecord};

use crate::policy::ClassificationPolicy;
use crate::report::{DifferenceRow, ToleranceFlag};
use crate::store::{MoveLedger, OnHandLedger, ProductCatalog, ReportStore, StoreError};

/// In-memory backing store for the whole reconciliation surface: product
/// catalog, location table, movement ledger, on-hand records and the report
/// table.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    products: RwLock<HashMap<ProductId, ProductRecord>>,
    locations: RwLock<HashMap<LocationId, Location>>,
    lines: RwLock<Vec<MoveLine>>,
    on_hand: RwLock<HashMap<OnHandKey, f64>>,
    report: RwLock<HashMap<ProductId, DifferenceRow>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read().map_err(|_| StoreError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write().map_err(|_| StoreError::LockPoisoned)
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn add_product(&self, product: ProductRecord) -> Result<(), StoreError> {
        write(&self.products)?.insert(product.id, product);
        Ok(())
    }

    /// Remove a product from the catalog, cascading to its report row.
    /// Movement lines and on-hand records are history and stay behind.
    pub fn remove_product(&self, product: ProductId) -> Result<(), StoreError> {
        write(&self.products)?.remove(&product);
        write(&self.report)?.remove(&product);
        Ok(())
    }

    pub fn add_location(&self, location: Location) -> Result<(), StoreError> {
        write(&self.locations)?.insert(location.id, location);
        Ok(())
    }

    pub fn record_line(&self, line: MoveLine) -> Result<(), StoreError> {
        write(&self.lines)?.push(line);
        Ok(())
    }

    /// Overwrite the on-hand quantity at `key`, creating the record if
    /// needed. Test and data-load path; the reconciler itself only goes
    /// through [`OnHandLedger::zero_on_hand`] and [`OnHandLedger::apply_delta`].
    pub fn set_on_hand(&self, key: OnHandKey, quantity: f64) -> Result<(), StoreError> {
        write(&self.on_hand)?.insert(key, quantity);
        Ok(())
    }

    /// Snapshot of every on-hand record, keyed by (product, location, lot).
    pub fn on_hand_snapshot(&self) -> Result<HashMap<OnHandKey, f64>, StoreError> {
        Ok(read(&self.on_hand)?.clone())
    }

    fn sum_done_lines(
        &self,
        mut counts: impl FnMut(Option<LocationUsage>, Option<LocationUsage>, Option<OperationKind>) -> bool,
    ) -> Result<HashMap<ProductId, f64>, StoreError> {
        let lines = read(&self.lines)?;
        let locations = read(&self.locations)?;

        let mut totals = HashMap::new();
        for line in lines.iter().filter(|line| line.is_done()) {
            let source = locations.get(&line.source).map(|l| l.usage);
            let dest = locations.get(&line.dest).map(|l| l.usage);
            if counts(source, dest, line.operation) {
                *totals.entry(line.product).or_insert(0.0) += line.qty_done;
            }
        }
        Ok(totals)
    }
}

impl ProductCatalog for InMemoryStockStore {
    fn trackable_products_in_ledger(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let lines = read(&self.lines)?;
        let products = read(&self.products)?;

        let mut seen: Vec<ProductId> = lines.iter().map(|line| line.product).collect();
        seen.sort();
        seen.dedup();

        Ok(seen
            .into_iter()
            .filter_map(|id| products.get(&id))
            .filter(|product| product.is_trackable())
            .cloned()
            .collect())
    }

    fn uom_rounding(&self, product: ProductId) -> Result<Option<f64>, StoreError> {
        Ok(read(&self.products)?.get(&product).map(|p| p.uom_rounding))
    }
}

impl MoveLedger for InMemoryStockStore {
    fn sum_incoming(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<HashMap<ProductId, f64>, StoreError> {
        self.sum_done_lines(|source, dest, operation| policy.is_incoming(source, dest, operation))
    }

    fn sum_outgoing(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<HashMap<ProductId, f64>, StoreError> {
        self.sum_done_lines(|source, dest, operation| policy.is_outgoing(source, dest, operation))
    }

    fn done_lines_for(&self, products: &[ProductId]) -> Result<Vec<MoveLine>, StoreError> {
        let lines = read(&self.lines)?;
        Ok(lines
            .iter()
            .filter(|line| line.is_done() && products.contains(&line.product))
            .cloned()
            .collect())
    }
}

impl OnHandLedger for InMemoryStockStore {
    fn internal_on_hand_by_product(&self) -> Result<HashMap<ProductId, f64>, StoreError> {
        let on_hand = read(&self.on_hand)?;
        let locations = read(&self.locations)?;

        let mut totals = HashMap::new();
        for (key, quantity) in on_hand.iter() {
            let internal = locations
                .get(&key.location)
                .map(|l| l.usage.is_internal())
                .unwrap_or(false);
            if internal {
                *totals.entry(key.product).or_insert(0.0) += quantity;
            }
        }
        Ok(totals)
    }

    fn zero_on_hand(&self, products: &[ProductId]) -> Result<usize, StoreError> {
        let mut on_hand = write(&self.on_hand)?;
        let mut touched = 0;
        for (key, quantity) in on_hand.iter_mut() {
            if products.contains(&key.product) {
                *quantity = 0.0;
                touched += 1;
            }
        }
        Ok(touched)
    }

    fn apply_delta(&self, key: OnHandKey, delta: f64) -> Result<(), StoreError> {
        let mut on_hand = write(&self.on_hand)?;
        *on_hand.entry(key).or_insert(0.0) += delta;
        Ok(())
    }

    fn on_hand(&self, key: OnHandKey) -> Result<Option<f64>, StoreError> {
        Ok(read(&self.on_hand)?.get(&key).copied())
    }
}

impl ReportStore for InMemoryStockStore {
    fn seed_rows(&self, products: &[ProductRecord], at: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut report = write(&self.report)?;
        for product in products {
            match report.get_mut(&product.id) {
                Some(row) => row.reset(product.name.clone(), at),
                None => {
                    report.insert(
                        product.id,
                        DifferenceRow::seeded(product.id, product.name.clone(), at),
                    );
                }
            }
        }
        Ok(products.len())
    }

    fn fill_incoming(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError> {
        let mut report = write(&self.report)?;
        for (product, total) in totals {
            if let Some(row) = report.get_mut(product) {
                row.incoming = *total;
            }
        }
        Ok(())
    }

    fn fill_outgoing(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError> {
        let mut report = write(&self.report)?;
        for (product, total) in totals {
            if let Some(row) = report.get_mut(product) {
                row.outgoing = *total;
            }
        }
        Ok(())
    }

    fn derive_supposed_stock(&self) -> Result<(), StoreError> {
        let mut report = write(&self.report)?;
        for row in report.values_mut() {
            row.supposed_stock = row.incoming - row.outgoing;
        }
        Ok(())
    }

    fn fill_on_hand(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError> {
        let mut report = write(&self.report)?;
        for (product, total) in totals {
            if let Some(row) = report.get_mut(product) {
                row.on_hand = *total;
            }
        }
        Ok(())
    }

    fn derive_difference(&self) -> Result<(), StoreError> {
        let mut report = write(&self.report)?;
        for row in report.values_mut() {
            row.difference = row.supposed_stock - row.on_hand;
        }
        Ok(())
    }

    fn rows_with_nonzero_difference(&self) -> Result<Vec<DifferenceRow>, StoreError> {
        let report = read(&self.report)?;
        let mut rows: Vec<_> = report
            .values()
            .filter(|row| row.difference != 0.0)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.product);
        Ok(rows)
    }

    fn set_flag(
        &self,
        product: ProductId,
        flag: ToleranceFlag,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut report = write(&self.report)?;
        let row = report
            .get_mut(&product)
            .ok_or(StoreError::RowMissing(product))?;
        row.flag = flag;
        row.updated_at = at;
        Ok(())
    }

    fn rows(&self) -> Result<Vec<DifferenceRow>, StoreError> {
        let report = read(&self.report)?;
        let mut rows: Vec<_> = report.values().cloned().collect();
        rows.sort_by_key(|row| row.product);
        Ok(rows)
    }

    fn row(&self, product: ProductId) -> Result<Option<DifferenceRow>, StoreError> {
        Ok(read(&self.report)?.get(&product).cloned())
    }

    fn flagged_products(&self) -> Result<Vec<ProductId>, StoreError> {
        let report = read(&self.report)?;
        let mut products: Vec<_> = report
            .values()
            .filter(|row| !row.flag.is_within())
            .map(|row| row.product)
            .collect();
        products.sort();
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use stockrecon_ledger::ProductKind;

    fn product(name: &str) -> ProductRecord {
        ProductRecord::new(ProductId::new(), name, ProductKind::Stockable, 0.01).unwrap()
    }

    #[test]
    fn trackable_products_come_from_the_ledger() {
        let store = InMemoryStockStore::new();
        let shelf = Location::new("WH/Stock", LocationUsage::Internal);
        let suppliers = Location::new("Partners/Vendors", LocationUsage::Supplier);

        let stocked = product("Bolt M6");
        let service =
            ProductRecord::new(ProductId::new(), "Assembly fee", ProductKind::Service, 0.01).unwrap();
        let unmoved = product("Washer M6");
        store.add_product(stocked.clone()).unwrap();
        store.add_product(service.clone()).unwrap();
        store.add_product(unmoved).unwrap();
        store.add_location(shelf.clone()).unwrap();
        store.add_location(suppliers.clone()).unwrap();

        store
            .record_line(MoveLine::done(stocked.id, suppliers.id, shelf.id, 4.0))
            .unwrap();
        store
            .record_line(MoveLine::done(service.id, suppliers.id, shelf.id, 1.0))
            .unwrap();

        let discovered = store.trackable_products_in_ledger().unwrap();
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].id, stocked.id);
    }

    #[test]
    fn draft_lines_count_for_discovery_but_not_totals() {
        let store = InMemoryStockStore::new();
        let shelf = Location::new("WH/Stock", LocationUsage::Internal);
        let suppliers = Location::new("Partners/Vendors", LocationUsage::Supplier);
        let bolt = product("Bolt M6");
        store.add_product(bolt.clone()).unwrap();
        store.add_location(shelf.clone()).unwrap();
        store.add_location(suppliers.clone()).unwrap();

        store
            .record_line(
                MoveLine::done(bolt.id, suppliers.id, shelf.id, 4.0)
                    .with_state(stockrecon_ledger::MoveState::Draft),
            )
            .unwrap();

        assert_eq!(store.trackable_products_in_ledger().unwrap().len(), 1);
        let incoming = store
            .sum_incoming(ClassificationPolicy::ByLocationUsage)
            .unwrap();
        assert!(incoming.is_empty());
    }

    #[test]
    fn on_hand_totals_only_cover_internal_locations() {
        let store = InMemoryStockStore::new();
        let shelf = Location::new("WH/Stock", LocationUsage::Internal);
        let customers = Location::new("Partners/Customers", LocationUsage::Customer);
        let bolt = product("Bolt M6");
        store.add_product(bolt.clone()).unwrap();
        store.add_location(shelf.clone()).unwrap();
        store.add_location(customers.clone()).unwrap();

        store
            .set_on_hand(OnHandKey::new(bolt.id, shelf.id, None), 7.0)
            .unwrap();
        store
            .set_on_hand(OnHandKey::new(bolt.id, customers.id, None), 99.0)
            .unwrap();

        let totals = store.internal_on_hand_by_product().unwrap();
        assert_eq!(totals.get(&bolt.id), Some(&7.0));
    }

    #[test]
    fn zeroing_keeps_records_and_reports_count() {
        let store = InMemoryStockStore::new();
        let shelf = Location::new("WH/Stock", LocationUsage::Internal);
        let bin = Location::new("WH/Stock/Bin-07", LocationUsage::Internal);
        let bolt = product("Bolt M6");
        let washer = product("Washer M6");
        store.add_location(shelf.clone()).unwrap();
        store.add_location(bin.clone()).unwrap();

        let k1 = OnHandKey::new(bolt.id, shelf.id, None);
        let k2 = OnHandKey::new(bolt.id, bin.id, None);
        let k3 = OnHandKey::new(washer.id, shelf.id, None);
        store.set_on_hand(k1, 5.0).unwrap();
        store.set_on_hand(k2, -2.0).unwrap();
        store.set_on_hand(k3, 9.0).unwrap();

        let touched = store.zero_on_hand(&[bolt.id]).unwrap();
        assert_eq!(touched, 2);
        assert_eq!(store.on_hand(k1).unwrap(), Some(0.0));
        assert_eq!(store.on_hand(k2).unwrap(), Some(0.0));
        // Other products untouched.
        assert_eq!(store.on_hand(k3).unwrap(), Some(9.0));
    }

    #[test]
    fn apply_delta_creates_missing_records() {
        let store = InMemoryStockStore::new();
        let key = OnHandKey::new(ProductId::new(), LocationId::new(), None);

        store.apply_delta(key, -3.5).unwrap();
        assert_eq!(store.on_hand(key).unwrap(), Some(-3.5));

        store.apply_delta(key, 5.0).unwrap();
        assert_eq!(store.on_hand(key).unwrap(), Some(1.5));
    }

    #[test]
    fn seeding_resets_existing_rows_in_place() {
        let store = InMemoryStockStore::new();
        let bolt = product("Bolt M6");

        let first = Utc::now();
        store.seed_rows(&[bolt.clone()], first).unwrap();
        store
            .fill_incoming(&HashMap::from([(bolt.id, 12.0)]))
            .unwrap();
        store.derive_supposed_stock().unwrap();
        store.derive_difference().unwrap();

        let second = first + chrono::Duration::seconds(30);
        let seeded = store.seed_rows(&[bolt.clone()], second).unwrap();
        assert_eq!(seeded, 1);

        let row = store.row(bolt.id).unwrap().unwrap();
        assert_eq!(row.incoming, 0.0);
        assert_eq!(row.difference, 0.0);
        assert_eq!(row.created_at, first);
        assert_eq!(row.updated_at, second);
    }

    #[test]
    fn derive_phases_cover_rows_missing_from_totals() {
        let store = InMemoryStockStore::new();
        let bolt = product("Bolt M6");
        let washer = product("Washer M6");
        store
            .seed_rows(&[bolt.clone(), washer.clone()], Utc::now())
            .unwrap();

        store
            .fill_incoming(&HashMap::from([(bolt.id, 3.0)]))
            .unwrap();
        store
            .fill_on_hand(&HashMap::from([(washer.id, 4.0)]))
            .unwrap();
        store.derive_supposed_stock().unwrap();
        store.derive_difference().unwrap();

        let bolt_row = store.row(bolt.id).unwrap().unwrap();
        let washer_row = store.row(washer.id).unwrap().unwrap();
        assert_eq!(bolt_row.supposed_stock, 3.0);
        assert_eq!(bolt_row.difference, 3.0);
        assert_eq!(washer_row.supposed_stock, 0.0);
        assert_eq!(washer_row.difference, -4.0);
        assert!(bolt_row.is_consistent() && washer_row.is_consistent());
    }

    #[test]
    fn flag_updates_bump_the_update_stamp() {
        let store = InMemoryStockStore::new();
        let bolt = product("Bolt M6");
        let seeded_at = Utc::now();
        store.seed_rows(&[bolt.clone()], seeded_at).unwrap();

        let flagged_at = seeded_at + chrono::Duration::seconds(2);
        store
            .set_flag(bolt.id, ToleranceFlag::Above, flagged_at)
            .unwrap();

        let row = store.row(bolt.id).unwrap().unwrap();
        assert_eq!(row.flag, ToleranceFlag::Above);
        assert_eq!(row.updated_at, flagged_at);
        assert_eq!(store.flagged_products().unwrap(), vec![bolt.id]);

        let missing = store.set_flag(ProductId::new(), ToleranceFlag::Below, flagged_at);
        assert!(matches!(missing, Err(StoreError::RowMissing(_))));
    }

    #[test]
    fn removing_a_product_cascades_to_its_report_row() {
        let store = InMemoryStockStore::new();
        let bolt = product("Bolt M6");
        store.add_product(bolt.clone()).unwrap();
        store.seed_rows(&[bolt.clone()], Utc::now()).unwrap();
        assert!(store.row(bolt.id).unwrap().is_some());

        store.remove_product(bolt.id).unwrap();
        assert!(store.row(bolt.id).unwrap().is_none());
        assert_eq!(store.uom_rounding(bolt.id).unwrap(), None);
    }
}
