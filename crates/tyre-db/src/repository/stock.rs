//! # Stock Repository
//!
//! Live stock records and their open-stock-day snapshots.
//!
//! ## Stock Lifecycle (as SQL)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. RECEIVE                                                            │
//! │     └── upsert_receipt() → INSERT ... ON CONFLICT(date, tyre_size)     │
//! │         new key: open-stock │ open: replace │ existing: accumulate     │
//! │                                                                         │
//! │  2. SELL (one transaction)                                             │
//! │     ├── INSERT INTO stock_snapshots SELECT ... WHERE status=open-stock │
//! │     └── UPDATE ... SET quantity = quantity - n WHERE quantity >= n     │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── close_day() → existing-stock ──► closed-stock                  │
//! │                                                                         │
//! │  4. ROLL OVER                                                          │
//! │     └── open_carried_forward() → INSERT ... ON CONFLICT DO NOTHING     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::STOCK_COLUMNS;
use crate::error::{DbError, DbResult};
use tyre_core::{Money, StockReceipt, StockRecord, StockStatus};

/// Repository for stock records and snapshots.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Gets a live record by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockRecord>> {
        let sql = format!("SELECT {STOCK_COLUMNS} FROM stock_records WHERE id = ?1");

        let record = sqlx::query_as::<_, StockRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Gets the live record (open, existing or closed) for a key.
    pub async fn find_live(&self, date: NaiveDate, tyre_size: &str) -> DbResult<Option<StockRecord>> {
        let sql = format!(
            "SELECT {STOCK_COLUMNS} FROM stock_records WHERE date = ?1 AND tyre_size = ?2"
        );

        let record = sqlx::query_as::<_, StockRecord>(&sql)
            .bind(date)
            .bind(tyre_size)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Lists records in `status`, for one date or all dates, ordered by
    /// date then tyre size. `OpenStockDay` reads the snapshot table.
    pub async fn list(&self, status: StockStatus, date: Option<NaiveDate>) -> DbResult<Vec<StockRecord>> {
        let table = match status {
            StockStatus::OpenStockDay => "stock_snapshots",
            _ => "stock_records",
        };
        let sql = format!(
            "SELECT {STOCK_COLUMNS} FROM {table} \
             WHERE status = ?1 AND (?2 IS NULL OR date = ?2) \
             ORDER BY date, tyre_size"
        );

        let records = sqlx::query_as::<_, StockRecord>(&sql)
            .bind(status)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        debug!(%status, ?date, count = records.len(), "Listed stock");
        Ok(records)
    }

    /// Applies a receipt in one statement.
    ///
    /// ## Returns
    /// * `Some(record)` - created, replaced (open-stock) or accumulated
    ///   (existing-stock)
    /// * `None` - the key is closed for the day, or accumulating would take
    ///   quantity or amount past `i64::MAX`; nothing was written
    pub async fn upsert_receipt(&self, receipt: &StockReceipt) -> DbResult<Option<StockRecord>> {
        debug!(
            date = %receipt.date,
            tyre_size = %receipt.tyre_size,
            quantity = receipt.quantity,
            "Upserting stock receipt"
        );

        let sql = format!(
            r#"
            INSERT INTO stock_records (
                id, date, tyre_size, status, quantity,
                ssp_cents, total_amount_cents, price_per_unit_cents,
                location, created_at, updated_at
            ) VALUES (?1, ?2, ?3, 'open-stock', ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT (date, tyre_size) DO UPDATE SET
                quantity = CASE WHEN stock_records.status = 'existing-stock'
                    THEN stock_records.quantity + excluded.quantity
                    ELSE excluded.quantity END,
                total_amount_cents = CASE WHEN stock_records.status = 'existing-stock'
                    THEN stock_records.total_amount_cents + excluded.total_amount_cents
                    ELSE excluded.total_amount_cents END,
                ssp_cents = CASE WHEN stock_records.status = 'existing-stock'
                    THEN stock_records.ssp_cents
                    ELSE excluded.ssp_cents END,
                price_per_unit_cents = CASE WHEN stock_records.status = 'existing-stock'
                    THEN stock_records.price_per_unit_cents
                    ELSE excluded.price_per_unit_cents END,
                location = CASE WHEN stock_records.status = 'existing-stock'
                    THEN stock_records.location
                    ELSE excluded.location END,
                updated_at = excluded.updated_at
            WHERE stock_records.status = 'open-stock'
               OR (stock_records.status = 'existing-stock'
                   AND stock_records.quantity <= ?10 - excluded.quantity
                   AND stock_records.total_amount_cents <= ?10 - excluded.total_amount_cents)
            RETURNING {STOCK_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, StockRecord>(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(receipt.date)
            .bind(&receipt.tyre_size)
            .bind(receipt.quantity)
            .bind(receipt.ssp.cents())
            .bind(receipt.total_amount.cents())
            .bind(receipt.price_per_unit.cents())
            .bind(&receipt.location)
            .bind(Utc::now())
            .bind(i64::MAX)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Applies a sale to a live record.
    ///
    /// ## What This Does (one transaction)
    /// 1. If the record is still open-stock, copies it into
    ///    `stock_snapshots` (at most one per key)
    /// 2. Moves it to existing-stock, subtracts `quantity` and adds
    ///    `revenue`, guarded by `quantity >= ?` and by the running total
    ///    staying within `i64`
    ///
    /// ## Returns
    /// * `Some(record)` - the updated live record
    /// * `None` - the guard matched nothing (missing, closed, short or the
    ///   total would overflow); the transaction was rolled back
    pub async fn apply_sale(
        &self,
        stock_id: &str,
        quantity: i64,
        revenue: Money,
    ) -> DbResult<Option<StockRecord>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let snapshot = sqlx::query(
            r#"
            INSERT INTO stock_snapshots (
                id, date, tyre_size, status, quantity,
                ssp_cents, total_amount_cents, price_per_unit_cents,
                location, created_at, updated_at
            )
            SELECT ?1, date, tyre_size, 'open-stock-day', quantity,
                   ssp_cents, total_amount_cents, price_per_unit_cents,
                   location, ?2, ?2
            FROM stock_records
            WHERE id = ?3 AND status = 'open-stock' AND quantity >= ?4
            ON CONFLICT (date, tyre_size) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(now)
        .bind(stock_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            r#"
            UPDATE stock_records SET
                status = 'existing-stock',
                quantity = quantity - ?2,
                total_amount_cents = total_amount_cents + ?3,
                updated_at = ?4
            WHERE id = ?1
              AND status IN ('open-stock', 'existing-stock')
              AND quantity >= ?2
              AND total_amount_cents <= ?5 - ?3
            RETURNING {STOCK_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, StockRecord>(&sql)
            .bind(stock_id)
            .bind(quantity)
            .bind(revenue.cents())
            .bind(now)
            .bind(i64::MAX)
            .fetch_optional(&mut *tx)
            .await?;

        match updated {
            Some(record) => {
                tx.commit().await?;
                debug!(
                    id = %stock_id,
                    sold = quantity,
                    remaining = record.quantity,
                    snapshot_taken = snapshot.rows_affected() > 0,
                    "Applied sale to stock"
                );
                Ok(Some(record))
            }
            None => {
                tx.rollback().await?;
                debug!(id = %stock_id, requested = quantity, "Sale guard matched no stock");
                Ok(None)
            }
        }
    }

    /// Moves every existing-stock record of `date` to closed-stock.
    ///
    /// ## Returns
    /// Number of records closed by this call (0 when already closed).
    pub async fn close_day(&self, date: NaiveDate) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE stock_records SET
                status = 'closed-stock',
                updated_at = ?2
            WHERE date = ?1 AND status = 'existing-stock'
            "#,
        )
        .bind(date)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(%date, closed = result.rows_affected(), "Closed stock day");
        Ok(result.rows_affected())
    }

    /// Most recent date before `date` that has closed stock.
    pub async fn latest_closed_date_before(&self, date: NaiveDate) -> DbResult<Option<NaiveDate>> {
        let latest = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT date FROM stock_records
            WHERE status = 'closed-stock' AND date < ?1
            ORDER BY date DESC
            LIMIT 1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(latest)
    }

    /// Creates open-stock records for carried-forward balances.
    ///
    /// Keys that already have a live record are skipped, so repeating the
    /// call writes nothing.
    ///
    /// ## Returns
    /// Number of records created.
    pub async fn open_carried_forward(&self, receipts: &[StockReceipt]) -> DbResult<u64> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut created = 0;

        for receipt in receipts {
            let result = sqlx::query(
                r#"
                INSERT INTO stock_records (
                    id, date, tyre_size, status, quantity,
                    ssp_cents, total_amount_cents, price_per_unit_cents,
                    location, created_at, updated_at
                ) VALUES (?1, ?2, ?3, 'open-stock', ?4, ?5, ?6, ?7, ?8, ?9, ?9)
                ON CONFLICT (date, tyre_size) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(receipt.date)
            .bind(&receipt.tyre_size)
            .bind(receipt.quantity)
            .bind(receipt.ssp.cents())
            .bind(receipt.total_amount.cents())
            .bind(receipt.price_per_unit.cents())
            .bind(&receipt.location)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            created += result.rows_affected();
        }

        tx.commit().await?;

        debug!(requested = receipts.len(), created, "Opened carried-forward stock");
        Ok(created)
    }

    /// Gets the open-stock-day snapshot for a key.
    pub async fn find_snapshot(&self, date: NaiveDate, tyre_size: &str) -> DbResult<StockRecord> {
        let sql = format!(
            "SELECT {STOCK_COLUMNS} FROM stock_snapshots WHERE date = ?1 AND tyre_size = ?2"
        );

        sqlx::query_as::<_, StockRecord>(&sql)
            .bind(date)
            .bind(tyre_size)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Snapshot", format!("{date}/{tyre_size}")))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn receipt(date: NaiveDate, tyre_size: &str, quantity: i64) -> StockReceipt {
        StockReceipt {
            date,
            tyre_size: tyre_size.to_string(),
            quantity,
            ssp: Money::from_cents(1_300),
            total_amount: Money::from_cents(quantity * 1_000),
            price_per_unit: Money::from_cents(1_000),
            location: "Main St".to_string(),
        }
    }

    async fn setup() -> (Database, StockRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.stock();
        (db, repo)
    }

    #[tokio::test]
    async fn test_receipt_creates_open_stock() {
        let (_db, repo) = setup().await;

        let record = repo.upsert_receipt(&receipt(day(14), "185/65R15", 50)).await.unwrap().unwrap();
        assert_eq!(record.status, StockStatus::OpenStock);
        assert_eq!(record.quantity, 50);
        assert_eq!(record.total_amount_cents, 50_000);

        let found = repo.find_live(day(14), "185/65R15").await.unwrap().unwrap();
        assert_eq!(found.id, record.id);
        let by_id = repo.get_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(by_id.tyre_size, found.tyre_size);
    }

    #[tokio::test]
    async fn test_receipt_replaces_open_stock() {
        let (_db, repo) = setup().await;

        let first = repo.upsert_receipt(&receipt(day(14), "185/65R15", 50)).await.unwrap().unwrap();
        let mut again = receipt(day(14), "185/65R15", 20);
        again.location = "Depot".to_string();
        let second = repo.upsert_receipt(&again).await.unwrap().unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.quantity, 20);
        assert_eq!(second.total_amount_cents, 20_000);
        assert_eq!(second.location, "Depot");
    }

    #[tokio::test]
    async fn test_receipt_accumulates_into_existing_stock() {
        let (_db, repo) = setup().await;

        let stock = repo.upsert_receipt(&receipt(day(14), "185/65R15", 50)).await.unwrap().unwrap();
        repo.apply_sale(&stock.id, 10, Money::from_cents(12_000)).await.unwrap().unwrap();

        let mut delta = receipt(day(14), "185/65R15", 5);
        delta.location = "Depot".to_string();
        repo.upsert_receipt(&delta).await.unwrap().unwrap();
        let after = repo.upsert_receipt(&delta).await.unwrap().unwrap();

        assert_eq!(after.status, StockStatus::ExistingStock);
        assert_eq!(after.quantity, 40 + 5 + 5);
        assert_eq!(after.total_amount_cents, 50_000 + 12_000 + 5_000 + 5_000);
        assert_eq!(after.location, "Main St");
    }

    #[tokio::test]
    async fn test_first_sale_snapshots_once() {
        let (_db, repo) = setup().await;

        let stock = repo.upsert_receipt(&receipt(day(14), "185/65R15", 50)).await.unwrap().unwrap();
        let after = repo.apply_sale(&stock.id, 10, Money::from_cents(12_000)).await.unwrap().unwrap();
        assert_eq!(after.status, StockStatus::ExistingStock);
        assert_eq!(after.quantity, 40);
        assert_eq!(after.total_amount_cents, 62_000);

        repo.apply_sale(&stock.id, 5, Money::from_cents(6_000)).await.unwrap().unwrap();

        let snapshots = repo.list(StockStatus::OpenStockDay, Some(day(14))).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].quantity, 50);
        assert_eq!(snapshots[0].total_amount_cents, 50_000);

        let snapshot = repo.find_snapshot(day(14), "185/65R15").await.unwrap();
        assert_eq!(snapshot.status, StockStatus::OpenStockDay);
    }

    #[tokio::test]
    async fn test_sale_guard_leaves_stock_untouched() {
        let (_db, repo) = setup().await;

        let stock = repo.upsert_receipt(&receipt(day(14), "185/65R15", 40)).await.unwrap().unwrap();
        let result = repo.apply_sale(&stock.id, 60, Money::from_cents(72_000)).await.unwrap();
        assert!(result.is_none());

        let unchanged = repo.find_live(day(14), "185/65R15").await.unwrap().unwrap();
        assert_eq!(unchanged.status, StockStatus::OpenStock);
        assert_eq!(unchanged.quantity, 40);
        assert!(repo.list(StockStatus::OpenStockDay, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_day_and_immutability() {
        let (_db, repo) = setup().await;

        let stock = repo.upsert_receipt(&receipt(day(14), "185/65R15", 50)).await.unwrap().unwrap();
        repo.apply_sale(&stock.id, 10, Money::from_cents(12_000)).await.unwrap();

        assert_eq!(repo.close_day(day(14)).await.unwrap(), 1);
        assert_eq!(repo.close_day(day(14)).await.unwrap(), 0);

        // Closed keys reject receipts and sales.
        assert!(repo.upsert_receipt(&receipt(day(14), "185/65R15", 5)).await.unwrap().is_none());
        assert!(repo.apply_sale(&stock.id, 1, Money::zero()).await.unwrap().is_none());

        let err = sqlx::query("UPDATE stock_records SET quantity = 0 WHERE id = ?1")
            .bind(&stock.id)
            .execute(&repo.pool)
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::Immutable(_)));

        let err = sqlx::query("UPDATE stock_snapshots SET quantity = 0")
            .execute(&repo.pool)
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::Immutable(_)));
    }

    #[tokio::test]
    async fn test_negative_quantity_violates_check() {
        let (_db, repo) = setup().await;
        let stock = repo.upsert_receipt(&receipt(day(14), "185/65R15", 5)).await.unwrap().unwrap();

        let err = sqlx::query("UPDATE stock_records SET quantity = -1 WHERE id = ?1")
            .bind(&stock.id)
            .execute(&repo.pool)
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_accumulating_past_i64_writes_nothing() {
        let (_db, repo) = setup().await;

        let stock = repo.upsert_receipt(&receipt(day(14), "185/65R15", 50)).await.unwrap().unwrap();
        repo.apply_sale(&stock.id, 1, Money::from_cents(10)).await.unwrap().unwrap();

        let mut huge = receipt(day(14), "185/65R15", 5);
        huge.total_amount = Money::from_cents(i64::MAX);
        assert!(repo.upsert_receipt(&huge).await.unwrap().is_none());

        // The row still decodes and is unchanged.
        let existing = repo.list(StockStatus::ExistingStock, None).await.unwrap();
        assert_eq!(existing.len(), 1);
        assert_eq!(existing[0].quantity, 49);
        assert_eq!(existing[0].total_amount_cents, 50_010);

        // A sale whose revenue would overflow the running total is refused too.
        assert!(repo
            .apply_sale(&stock.id, 1, Money::from_cents(i64::MAX))
            .await
            .unwrap()
            .is_none());
        assert_eq!(repo.find_live(day(14), "185/65R15").await.unwrap().unwrap().quantity, 49);
    }

    #[tokio::test]
    async fn test_real_amounts_are_refused() {
        let (_db, repo) = setup().await;
        let stock = repo.upsert_receipt(&receipt(day(14), "185/65R15", 5)).await.unwrap().unwrap();

        let err = sqlx::query(
            "UPDATE stock_records SET total_amount_cents = total_amount_cents + ?2 WHERE id = ?1",
        )
        .bind(&stock.id)
        .bind(i64::MAX)
        .execute(&repo.pool)
        .await
        .map_err(DbError::from)
        .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));

        let unchanged = repo.get_by_id(&stock.id).await.unwrap().unwrap();
        assert_eq!(unchanged.total_amount_cents, 5_000);
    }

    #[tokio::test]
    async fn test_list_filters_by_exact_date() {
        let (_db, repo) = setup().await;

        repo.upsert_receipt(&receipt(day(14), "205/55R16", 8)).await.unwrap();
        repo.upsert_receipt(&receipt(day(14), "185/65R15", 4)).await.unwrap();
        repo.upsert_receipt(&receipt(day(15), "175/70R13", 6)).await.unwrap();

        let on_14 = repo.list(StockStatus::OpenStock, Some(day(14))).await.unwrap();
        let sizes: Vec<_> = on_14.iter().map(|r| r.tyre_size.as_str()).collect();
        assert_eq!(sizes, vec!["185/65R15", "205/55R16"]);

        let all = repo.list(StockStatus::OpenStock, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].date, day(15));

        assert!(repo.list(StockStatus::OpenStock, Some(day(16))).await.unwrap().is_empty());
        assert!(repo.list(StockStatus::ExistingStock, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_carry_forward_is_idempotent() {
        let (_db, repo) = setup().await;

        let stock = repo.upsert_receipt(&receipt(day(13), "185/65R15", 50)).await.unwrap().unwrap();
        repo.apply_sale(&stock.id, 10, Money::from_cents(12_000)).await.unwrap();
        repo.close_day(day(13)).await.unwrap();

        assert_eq!(repo.latest_closed_date_before(day(15)).await.unwrap(), Some(day(13)));
        assert_eq!(repo.latest_closed_date_before(day(13)).await.unwrap(), None);

        let carried = vec![receipt(day(15), "185/65R15", 40)];
        assert_eq!(repo.open_carried_forward(&carried).await.unwrap(), 1);
        assert_eq!(repo.open_carried_forward(&carried).await.unwrap(), 0);

        let open = repo.list(StockStatus::OpenStock, Some(day(15))).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].quantity, 40);

        let closed = repo.list(StockStatus::ClosedStock, Some(day(13))).await.unwrap();
        assert_eq!(closed[0].quantity, 40);
    }
}
