//! # Sale Repository
//!
//! Append-only sale ledger. Rows are inserted once and never updated; the
//! schema rejects UPDATE with a trigger.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::SALE_COLUMNS;
use crate::error::DbResult;
use tyre_core::{SaleEntry, SaleRecord, SalesSummary};

/// Repository for sale records.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a validated sale.
    ///
    /// ## Returns
    /// The stored record with its generated ID and timestamp.
    pub async fn insert(&self, entry: &SaleEntry, user_id: &str) -> DbResult<SaleRecord> {
        let sale = SaleRecord {
            id: Uuid::new_v4().to_string(),
            date: entry.date,
            tyre_size: entry.tyre_size.clone(),
            quantity: entry.quantity,
            price_per_unit_cents: entry.price_per_unit.cents(),
            total_amount_cents: entry.total_amount.cents(),
            customer_name: entry.customer_name.clone(),
            phone_number: entry.phone_number.clone(),
            comment: entry.comment.clone(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };

        debug!(
            id = %sale.id,
            date = %sale.date,
            tyre_size = %sale.tyre_size,
            quantity = sale.quantity,
            "Inserting sale record"
        );

        sqlx::query(
            r#"
            INSERT INTO sale_records (
                id, date, tyre_size, quantity,
                price_per_unit_cents, total_amount_cents,
                customer_name, phone_number, comment,
                user_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.date)
        .bind(&sale.tyre_size)
        .bind(sale.quantity)
        .bind(sale.price_per_unit_cents)
        .bind(sale.total_amount_cents)
        .bind(&sale.customer_name)
        .bind(&sale.phone_number)
        .bind(&sale.comment)
        .bind(&sale.user_id)
        .bind(sale.created_at)
        .execute(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists sales for one date, or all dates, in recording order.
    pub async fn list(&self, date: Option<NaiveDate>) -> DbResult<Vec<SaleRecord>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sale_records \
             WHERE (?1 IS NULL OR date = ?1) \
             ORDER BY date, created_at"
        );

        let sales = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Count, units and revenue for one date. Zeroes when nothing sold.
    pub async fn summary(&self, date: NaiveDate) -> DbResult<SalesSummary> {
        let (sale_count, quantity, total_amount_cents): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(quantity), 0),
                COALESCE(SUM(total_amount_cents), 0)
            FROM sale_records
            WHERE date = ?1
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesSummary {
            date,
            sale_count,
            quantity,
            total_amount_cents,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use tyre_core::Money;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn entry(date: NaiveDate, quantity: i64, unit_cents: i64) -> SaleEntry {
        SaleEntry {
            date,
            tyre_size: "185/65R15".to_string(),
            quantity,
            price_per_unit: Money::from_cents(unit_cents),
            total_amount: Money::from_cents(quantity * unit_cents),
            customer_name: "Bilal".to_string(),
            phone_number: None,
            comment: Some("walk-in".to_string()),
        }
    }

    async fn setup() -> SaleRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().sales()
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let repo = setup().await;

        let sale = repo.insert(&entry(day(14), 10, 1_200), "user-1").await.unwrap();
        assert_eq!(sale.total_amount_cents, 12_000);
        assert_eq!(sale.user_id, "user-1");

        repo.insert(&entry(day(15), 2, 1_200), "user-1").await.unwrap();

        let on_14 = repo.list(Some(day(14))).await.unwrap();
        assert_eq!(on_14.len(), 1);
        assert_eq!(on_14[0].id, sale.id);
        assert_eq!(on_14[0].comment.as_deref(), Some("walk-in"));
        assert_eq!(repo.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_summary() {
        let repo = setup().await;

        repo.insert(&entry(day(14), 10, 1_200), "user-1").await.unwrap();
        repo.insert(&entry(day(14), 2, 1_500), "user-2").await.unwrap();

        let summary = repo.summary(day(14)).await.unwrap();
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.quantity, 12);
        assert_eq!(summary.total_amount_cents, 15_000);

        let empty = repo.summary(day(20)).await.unwrap();
        assert_eq!(empty.sale_count, 0);
        assert_eq!(empty.total_amount_cents, 0);
    }

    #[tokio::test]
    async fn test_sale_records_are_immutable() {
        let repo = setup().await;
        repo.insert(&entry(day(14), 1, 1_000), "user-1").await.unwrap();

        let err = sqlx::query("UPDATE sale_records SET quantity = 99")
            .execute(&repo.pool)
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::Immutable(_)));
    }
}
