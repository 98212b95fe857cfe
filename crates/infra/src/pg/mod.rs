//! Postgres-backed stock store.
//!
//! Implements the reconciliation storage ports against PostgreSQL. The
//! products, locations, move_lines and on_hand tables mirror the host ERP's
//! system of record; the adapter reads them and, during a rebalance, rewrites
//! on_hand quantities. The difference_report table is owned by this module,
//! one row per product, reset in place on every report run.
//!
//! ## Aggregation strategy
//!
//! The fill phases are set-based: incoming/outgoing totals come from a single
//! `SUM ... GROUP BY product_id` per direction, and the derived columns are
//! rewritten with whole-table `UPDATE`s. Row counts here are ERP-sized
//! (thousands, not millions), so one pass per phase beats per-row traffic.
//!
//! ## Sync bridge
//!
//! The storage ports are synchronous while sqlx is async. The trait impls
//! bridge with `tokio::runtime::Handle::try_current()` + `block_on`, so they
//! must be called from a thread that can block inside a tokio runtime context
//! (e.g. `spawn_blocking`, or a dedicated worker thread that entered the
//! runtime). Async callers use the inherent methods directly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use stockrecon_core::ProductId;
use stockrecon_ledger::{
    MoveLine, MoveState, OnHandKey, OperationKind, ProductKind, ProductRecord,
};
use stockrecon_reconcile::{
    ClassificationPolicy, DifferenceRow, MoveLedger, OnHandLedger, ProductCatalog, ReportStore,
    StoreError, ToleranceFlag,
};

const SCHEMA: &str = include_str!("schema.sql");

/// Postgres implementation of the reconciliation storage ports.
#[derive(Debug, Clone)]
pub struct PgStockStore {
    pool: Arc<PgPool>,
}

impl PgStockStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn from_arc(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create the reconciliation tables if they do not exist yet.
    ///
    /// Idempotent; safe to run on every startup.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    /// Active stockable products that occur in the movement ledger, in any
    /// line state, ordered by id.
    #[instrument(skip(self), err)]
    pub async fn trackable_products_in_ledger(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT p.id, p.name, p.kind, p.active, p.uom_rounding
            FROM move_lines ml
            JOIN products p ON p.id = ml.product_id
            WHERE p.active AND p.kind = 'stockable'
            ORDER BY p.id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("trackable_products_in_ledger", e))?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let record = ProductRow::from_row(&row)
                .map_err(|e| StoreError::backend(format!("failed to read product row: {e}")))?;
            products.push(record.into_record()?);
        }

        debug!(products = products.len(), "discovered trackable products");
        Ok(products)
    }

    #[instrument(skip(self), fields(product = %product), err)]
    pub async fn uom_rounding(&self, product: ProductId) -> Result<Option<f64>, StoreError> {
        let row = sqlx::query("SELECT uom_rounding FROM products WHERE id = $1")
            .bind(product.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("uom_rounding", e))?;

        row.map(|r| {
            r.try_get::<f64, _>("uom_rounding")
                .map_err(|e| StoreError::backend(format!("failed to read uom_rounding: {e}")))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(policy = ?policy), err)]
    pub async fn sum_incoming(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<HashMap<ProductId, f64>, StoreError> {
        let sql = match policy {
            ClassificationPolicy::ByLocationUsage => {
                r#"
                SELECT ml.product_id, SUM(ml.qty_done) AS total
                FROM move_lines ml
                WHERE ml.state = 'done'
                  AND ml.dest_id IN (SELECT id FROM locations WHERE usage = 'internal')
                GROUP BY ml.product_id
                "#
            }
            ClassificationPolicy::ByPickingType => {
                r#"
                SELECT ml.product_id, SUM(ml.qty_done) AS total
                FROM move_lines ml
                WHERE ml.state = 'done'
                  AND (ml.operation = 'incoming'
                       OR ml.source_id IN
                          (SELECT id FROM locations WHERE usage IN ('inventory', 'production')))
                GROUP BY ml.product_id
                "#
            }
        };

        self.fetch_totals("sum_incoming", sql).await
    }

    #[instrument(skip(self), fields(policy = ?policy), err)]
    pub async fn sum_outgoing(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<HashMap<ProductId, f64>, StoreError> {
        let sql = match policy {
            ClassificationPolicy::ByLocationUsage => {
                r#"
                SELECT ml.product_id, SUM(ml.qty_done) AS total
                FROM move_lines ml
                WHERE ml.state = 'done'
                  AND ml.source_id IN (SELECT id FROM locations WHERE usage = 'internal')
                GROUP BY ml.product_id
                "#
            }
            ClassificationPolicy::ByPickingType => {
                r#"
                SELECT ml.product_id, SUM(ml.qty_done) AS total
                FROM move_lines ml
                WHERE ml.state = 'done'
                  AND (ml.operation = 'outgoing'
                       OR ml.dest_id IN
                          (SELECT id FROM locations WHERE usage IN ('inventory', 'production')))
                GROUP BY ml.product_id
                "#
            }
        };

        self.fetch_totals("sum_outgoing", sql).await
    }

    #[instrument(skip(self, products), fields(products = products.len()), err)]
    pub async fn done_lines_for(
        &self,
        products: &[ProductId],
    ) -> Result<Vec<MoveLine>, StoreError> {
        let ids = uuid_vec(products);
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, source_id, dest_id, qty_done, lot_id, state, operation
            FROM move_lines
            WHERE state = 'done' AND product_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("done_lines_for", e))?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            let record = MoveLineRow::from_row(&row)
                .map_err(|e| StoreError::backend(format!("failed to read move line row: {e}")))?;
            lines.push(record.into_line()?);
        }
        Ok(lines)
    }

    #[instrument(skip(self), err)]
    pub async fn internal_on_hand_by_product(
        &self,
    ) -> Result<HashMap<ProductId, f64>, StoreError> {
        self.fetch_totals(
            "internal_on_hand_by_product",
            r#"
            SELECT oh.product_id, SUM(oh.quantity) AS total
            FROM on_hand oh
            WHERE oh.location_id IN (SELECT id FROM locations WHERE usage = 'internal')
            GROUP BY oh.product_id
            "#,
        )
        .await
    }

    /// Set every on-hand record of the given products to zero.
    ///
    /// Records are kept, not deleted, so the replay finds them again.
    #[instrument(skip(self, products), fields(products = products.len()), err)]
    pub async fn zero_on_hand(&self, products: &[ProductId]) -> Result<usize, StoreError> {
        let ids = uuid_vec(products);
        let result = sqlx::query("UPDATE on_hand SET quantity = 0 WHERE product_id = ANY($1)")
            .bind(&ids)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("zero_on_hand", e))?;
        Ok(result.rows_affected() as usize)
    }

    /// Add `delta` to the record at `key`, creating the record when absent.
    pub async fn apply_delta(&self, key: OnHandKey, delta: f64) -> Result<(), StoreError> {
        let lot: Option<Uuid> = key.lot.map(|lot| *lot.as_uuid());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("apply_delta", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE on_hand SET quantity = quantity + $4
            WHERE product_id = $1 AND location_id = $2 AND lot_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(key.product.as_uuid())
        .bind(key.location.as_uuid())
        .bind(lot)
        .bind(delta)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("apply_delta", e))?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO on_hand (product_id, location_id, lot_id, quantity)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(key.product.as_uuid())
            .bind(key.location.as_uuid())
            .bind(lot)
            .bind(delta)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("apply_delta", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("apply_delta", e))?;
        Ok(())
    }

    pub async fn on_hand(&self, key: OnHandKey) -> Result<Option<f64>, StoreError> {
        let lot: Option<Uuid> = key.lot.map(|lot| *lot.as_uuid());
        let row = sqlx::query(
            r#"
            SELECT quantity FROM on_hand
            WHERE product_id = $1 AND location_id = $2 AND lot_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(key.product.as_uuid())
        .bind(key.location.as_uuid())
        .bind(lot)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("on_hand", e))?;

        row.map(|r| {
            r.try_get::<f64, _>("quantity")
                .map_err(|e| StoreError::backend(format!("failed to read quantity: {e}")))
        })
        .transpose()
    }

    /// Upsert one report row per product, resetting every numeric column.
    ///
    /// Existing rows keep their `created_at`; only `updated_at` moves.
    #[instrument(skip(self, products), fields(products = products.len()), err)]
    pub async fn seed_rows(
        &self,
        products: &[ProductRecord],
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        if products.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = products.iter().map(|p| *p.id.as_uuid()).collect();
        let names: Vec<String> = products.iter().map(|p| p.name.clone()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO difference_report (
                product_id, name, incoming, outgoing, supposed_stock,
                on_hand, difference, flag, created_at, updated_at
            )
            SELECT t.product_id, t.name, 0, 0, 0, 0, 0, 0, $3, $3
            FROM UNNEST($1::uuid[], $2::text[]) AS t(product_id, name)
            ON CONFLICT (product_id) DO UPDATE SET
                name = EXCLUDED.name,
                incoming = 0,
                outgoing = 0,
                supposed_stock = 0,
                on_hand = 0,
                difference = 0,
                flag = 0,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&ids)
        .bind(&names)
        .bind(at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("seed_rows", e))?;

        Ok(result.rows_affected() as usize)
    }

    #[instrument(skip(self, totals), fields(products = totals.len()), err)]
    pub async fn fill_incoming(
        &self,
        totals: &HashMap<ProductId, f64>,
    ) -> Result<(), StoreError> {
        self.fill_column("fill_incoming", "incoming", totals).await
    }

    #[instrument(skip(self, totals), fields(products = totals.len()), err)]
    pub async fn fill_outgoing(
        &self,
        totals: &HashMap<ProductId, f64>,
    ) -> Result<(), StoreError> {
        self.fill_column("fill_outgoing", "outgoing", totals).await
    }

    #[instrument(skip(self), err)]
    pub async fn derive_supposed_stock(&self) -> Result<(), StoreError> {
        sqlx::query("UPDATE difference_report SET supposed_stock = incoming - outgoing")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("derive_supposed_stock", e))?;
        Ok(())
    }

    #[instrument(skip(self, totals), fields(products = totals.len()), err)]
    pub async fn fill_on_hand(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError> {
        self.fill_column("fill_on_hand", "on_hand", totals).await
    }

    #[instrument(skip(self), err)]
    pub async fn derive_difference(&self) -> Result<(), StoreError> {
        sqlx::query("UPDATE difference_report SET difference = supposed_stock - on_hand")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("derive_difference", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn rows_with_nonzero_difference(&self) -> Result<Vec<DifferenceRow>, StoreError> {
        self.fetch_report_rows(
            "rows_with_nonzero_difference",
            r#"
            SELECT product_id, name, incoming, outgoing, supposed_stock,
                   on_hand, difference, flag, created_at, updated_at
            FROM difference_report
            WHERE difference <> 0
            ORDER BY product_id
            "#,
        )
        .await
    }

    #[instrument(skip(self), fields(product = %product, flag = ?flag), err)]
    pub async fn set_flag(
        &self,
        product: ProductId,
        flag: ToleranceFlag,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE difference_report SET flag = $2, updated_at = $3 WHERE product_id = $1",
        )
        .bind(product.as_uuid())
        .bind(i16::from(flag.as_sign()))
        .bind(at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_flag", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowMissing(product));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn rows(&self) -> Result<Vec<DifferenceRow>, StoreError> {
        self.fetch_report_rows(
            "rows",
            r#"
            SELECT product_id, name, incoming, outgoing, supposed_stock,
                   on_hand, difference, flag, created_at, updated_at
            FROM difference_report
            ORDER BY product_id
            "#,
        )
        .await
    }

    pub async fn row(&self, product: ProductId) -> Result<Option<DifferenceRow>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT product_id, name, incoming, outgoing, supposed_stock,
                   on_hand, difference, flag, created_at, updated_at
            FROM difference_report
            WHERE product_id = $1
            "#,
        )
        .bind(product.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("row", e))?;

        row.map(|r| {
            DifferenceReportRow::from_row(&r)
                .map_err(|e| StoreError::backend(format!("failed to read report row: {e}")))
                .map(DifferenceRow::from)
        })
        .transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn flagged_products(&self) -> Result<Vec<ProductId>, StoreError> {
        let rows = sqlx::query(
            "SELECT product_id FROM difference_report WHERE flag <> 0 ORDER BY product_id",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("flagged_products", e))?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row
                .try_get("product_id")
                .map_err(|e| StoreError::backend(format!("failed to read product_id: {e}")))?;
            products.push(ProductId::from_uuid(id));
        }
        Ok(products)
    }

    async fn fetch_totals(
        &self,
        operation: &str,
        sql: &str,
    ) -> Result<HashMap<ProductId, f64>, StoreError> {
        let rows = sqlx::query(sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        let mut totals = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row
                .try_get("product_id")
                .map_err(|e| StoreError::backend(format!("failed to read product_id: {e}")))?;
            let total: f64 = row
                .try_get("total")
                .map_err(|e| StoreError::backend(format!("failed to read total: {e}")))?;
            totals.insert(ProductId::from_uuid(id), total);
        }
        Ok(totals)
    }

    async fn fill_column(
        &self,
        operation: &str,
        column: &str,
        totals: &HashMap<ProductId, f64>,
    ) -> Result<(), StoreError> {
        if totals.is_empty() {
            return Ok(());
        }

        let mut ids = Vec::with_capacity(totals.len());
        let mut values = Vec::with_capacity(totals.len());
        for (product, total) in totals {
            ids.push(*product.as_uuid());
            values.push(*total);
        }

        // `column` comes from a fixed set of call sites, never from input.
        let sql = format!(
            r#"
            UPDATE difference_report AS r
            SET {column} = t.total
            FROM UNNEST($1::uuid[], $2::float8[]) AS t(product_id, total)
            WHERE r.product_id = t.product_id
            "#
        );

        sqlx::query(&sql)
            .bind(&ids)
            .bind(&values)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        Ok(())
    }

    async fn fetch_report_rows(
        &self,
        operation: &str,
        sql: &str,
    ) -> Result<Vec<DifferenceRow>, StoreError> {
        let rows = sqlx::query(sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        let mut report_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let record = DifferenceReportRow::from_row(&row)
                .map_err(|e| StoreError::backend(format!("failed to read report row: {e}")))?;
            report_rows.push(record.into());
        }
        Ok(report_rows)
    }
}

fn uuid_vec(products: &[ProductId]) -> Vec<Uuid> {
    products.iter().map(|p| *p.as_uuid()).collect()
}

fn runtime_handle() -> Result<tokio::runtime::Handle, StoreError> {
    tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::backend(
            "PgStockStore requires a tokio runtime. Call from within a runtime context.",
        )
    })
}

/// Map sqlx errors onto the storage error model.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err
                .code()
                .map(|c| format!(" [{c}]"))
                .unwrap_or_default();
            StoreError::backend(format!(
                "database error in {operation}{code}: {}",
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            StoreError::backend(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::RowNotFound => {
            StoreError::backend(format!("unexpected missing row in {operation}"))
        }
        _ => StoreError::backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn parse_kind(value: &str) -> Result<ProductKind, StoreError> {
    match value {
        "stockable" => Ok(ProductKind::Stockable),
        "consumable" => Ok(ProductKind::Consumable),
        "service" => Ok(ProductKind::Service),
        other => Err(StoreError::backend(format!("unknown product kind '{other}'"))),
    }
}

fn parse_state(value: &str) -> Result<MoveState, StoreError> {
    match value {
        "draft" => Ok(MoveState::Draft),
        "assigned" => Ok(MoveState::Assigned),
        "done" => Ok(MoveState::Done),
        "cancelled" => Ok(MoveState::Cancelled),
        other => Err(StoreError::backend(format!("unknown move state '{other}'"))),
    }
}

fn parse_operation(value: &str) -> Result<OperationKind, StoreError> {
    match value {
        "incoming" => Ok(OperationKind::Incoming),
        "outgoing" => Ok(OperationKind::Outgoing),
        "internal" => Ok(OperationKind::Internal),
        other => Err(StoreError::backend(format!("unknown operation kind '{other}'"))),
    }
}

// sqlx row types

#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    name: String,
    kind: String,
    active: bool,
    uom_rounding: f64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ProductRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            kind: row.try_get("kind")?,
            active: row.try_get("active")?,
            uom_rounding: row.try_get("uom_rounding")?,
        })
    }
}

impl ProductRow {
    fn into_record(self) -> Result<ProductRecord, StoreError> {
        let kind = parse_kind(&self.kind)?;
        let record = ProductRecord::new(
            ProductId::from_uuid(self.id),
            self.name,
            kind,
            self.uom_rounding,
        )
        .map_err(|e| StoreError::backend(format!("invalid product row: {e}")))?;
        Ok(record.with_active(self.active))
    }
}

#[derive(Debug)]
struct MoveLineRow {
    id: Uuid,
    product_id: Uuid,
    source_id: Uuid,
    dest_id: Uuid,
    qty_done: f64,
    lot_id: Option<Uuid>,
    state: String,
    operation: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for MoveLineRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(MoveLineRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            source_id: row.try_get("source_id")?,
            dest_id: row.try_get("dest_id")?,
            qty_done: row.try_get("qty_done")?,
            lot_id: row.try_get("lot_id")?,
            state: row.try_get("state")?,
            operation: row.try_get("operation")?,
        })
    }
}

impl MoveLineRow {
    fn into_line(self) -> Result<MoveLine, StoreError> {
        Ok(MoveLine {
            id: self.id.into(),
            product: ProductId::from_uuid(self.product_id),
            source: self.source_id.into(),
            dest: self.dest_id.into(),
            qty_done: self.qty_done,
            lot: self.lot_id.map(Into::into),
            state: parse_state(&self.state)?,
            operation: self
                .operation
                .as_deref()
                .map(parse_operation)
                .transpose()?,
        })
    }
}

#[derive(Debug)]
struct DifferenceReportRow {
    product_id: Uuid,
    name: String,
    incoming: f64,
    outgoing: f64,
    supposed_stock: f64,
    on_hand: f64,
    difference: f64,
    flag: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for DifferenceReportRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(DifferenceReportRow {
            product_id: row.try_get("product_id")?,
            name: row.try_get("name")?,
            incoming: row.try_get("incoming")?,
            outgoing: row.try_get("outgoing")?,
            supposed_stock: row.try_get("supposed_stock")?,
            on_hand: row.try_get("on_hand")?,
            difference: row.try_get("difference")?,
            flag: row.try_get("flag")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<DifferenceReportRow> for DifferenceRow {
    fn from(row: DifferenceReportRow) -> Self {
        DifferenceRow {
            product: ProductId::from_uuid(row.product_id),
            name: row.name,
            incoming: row.incoming,
            outgoing: row.outgoing,
            supposed_stock: row.supposed_stock,
            on_hand: row.on_hand,
            difference: row.difference,
            flag: ToleranceFlag::from_ordering(row.flag.cmp(&0)),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// Sync port impls, bridged onto the async inherent methods.

impl ProductCatalog for PgStockStore {
    fn trackable_products_in_ledger(&self) -> Result<Vec<ProductRecord>, StoreError> {
        runtime_handle()?.block_on(self.trackable_products_in_ledger())
    }

    fn uom_rounding(&self, product: ProductId) -> Result<Option<f64>, StoreError> {
        runtime_handle()?.block_on(self.uom_rounding(product))
    }
}

impl MoveLedger for PgStockStore {
    fn sum_incoming(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<HashMap<ProductId, f64>, StoreError> {
        runtime_handle()?.block_on(self.sum_incoming(policy))
    }

    fn sum_outgoing(
        &self,
        policy: ClassificationPolicy,
    ) -> Result<HashMap<ProductId, f64>, StoreError> {
        runtime_handle()?.block_on(self.sum_outgoing(policy))
    }

    fn done_lines_for(&self, products: &[ProductId]) -> Result<Vec<MoveLine>, StoreError> {
        runtime_handle()?.block_on(self.done_lines_for(products))
    }
}

impl OnHandLedger for PgStockStore {
    fn internal_on_hand_by_product(&self) -> Result<HashMap<ProductId, f64>, StoreError> {
        runtime_handle()?.block_on(self.internal_on_hand_by_product())
    }

    fn zero_on_hand(&self, products: &[ProductId]) -> Result<usize, StoreError> {
        runtime_handle()?.block_on(self.zero_on_hand(products))
    }

    fn apply_delta(&self, key: OnHandKey, delta: f64) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.apply_delta(key, delta))
    }

    fn on_hand(&self, key: OnHandKey) -> Result<Option<f64>, StoreError> {
        runtime_handle()?.block_on(self.on_hand(key))
    }
}

impl ReportStore for PgStockStore {
    fn seed_rows(
        &self,
        products: &[ProductRecord],
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        runtime_handle()?.block_on(self.seed_rows(products, at))
    }

    fn fill_incoming(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.fill_incoming(totals))
    }

    fn fill_outgoing(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.fill_outgoing(totals))
    }

    fn derive_supposed_stock(&self) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.derive_supposed_stock())
    }

    fn fill_on_hand(&self, totals: &HashMap<ProductId, f64>) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.fill_on_hand(totals))
    }

    fn derive_difference(&self) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.derive_difference())
    }

    fn rows_with_nonzero_difference(&self) -> Result<Vec<DifferenceRow>, StoreError> {
        runtime_handle()?.block_on(self.rows_with_nonzero_difference())
    }

    fn set_flag(
        &self,
        product: ProductId,
        flag: ToleranceFlag,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        runtime_handle()?.block_on(self.set_flag(product, flag, at))
    }

    fn rows(&self) -> Result<Vec<DifferenceRow>, StoreError> {
        runtime_handle()?.block_on(self.rows())
    }

    fn row(&self, product: ProductId) -> Result<Option<DifferenceRow>, StoreError> {
        runtime_handle()?.block_on(self.row(product))
    }

    fn flagged_products(&self) -> Result<Vec<ProductId>, StoreError> {
        runtime_handle()?.block_on(self.flagged_products())
    }
}
