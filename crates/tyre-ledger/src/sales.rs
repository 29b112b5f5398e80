//! # Sale Processor
//!
//! Turns a sale request into an inventory decrement plus an immutable sale
//! record.
//!
//! ## Sale Flow
//! ```text
//! record_sale(actor, req)
//!   │
//!   ├─ 1. authorize(RecordSale)                      Forbidden
//!   ├─ 2. validate + date (default today) + total    ValidationError
//!   ├─ 3. find live stock for (date, tyre_size)      StockNotFound
//!   ├─ 4. StockLedger::apply_sale_delta              InsufficientStock / DayClosed
//!   ├─ 5. insert SaleRecord
//!   └─ 6. dispatch SaleRecorded (fire-and-forget)
//! ```
//!
//! Stock is mutated before the sale row is written and the two writes are
//! not one transaction. A failed insert after a successful decrement is
//! logged with both identifiers for manual reconciliation.

use chrono::{NaiveDate, Utc};
use tracing::{error, info};

use crate::error::LedgerResult;
use crate::ledger::StockLedger;
use crate::notify::StockEvent;
use tyre_core::validation;
use tyre_core::{Action, Actor, CoreError, RecordSaleRequest, SaleRecord, SalesSummary};

/// Records sales against the ledger.
#[derive(Debug, Clone)]
pub struct SaleProcessor {
    ledger: StockLedger,
}

impl SaleProcessor {
    pub fn new(ledger: StockLedger) -> Self {
        SaleProcessor { ledger }
    }

    pub fn ledger(&self) -> &StockLedger {
        &self.ledger
    }

    /// Records one sale.
    ///
    /// ## Errors
    /// - `Forbidden` - the actor's role may not sell
    /// - `ValidationError` - bad input, amount overflow or the day is closed
    /// - `StockNotFound` - no live stock for the date and tyre size
    /// - `InsufficientStock` - fewer units on hand than requested
    pub async fn record_sale(&self, actor: &Actor, req: RecordSaleRequest) -> LedgerResult<SaleRecord> {
        self.ledger.authorize(actor, Action::RecordSale)?;

        let entry = validation::validate_sale(&req, Utc::now().date_naive())?;

        let stock = self
            .ledger
            .find_stock(entry.date, &entry.tyre_size)
            .await?
            .ok_or_else(|| CoreError::StockNotFound {
                date: entry.date,
                tyre_size: entry.tyre_size.clone(),
            })?;

        let updated = self
            .ledger
            .apply_sale_delta(&stock, entry.quantity, entry.total_amount)
            .await?;

        let sale = match self.ledger.database().sales().insert(&entry, &actor.id).await {
            Ok(sale) => sale,
            Err(err) => {
                error!(
                    stock_id = %updated.id,
                    date = %entry.date,
                    tyre_size = %entry.tyre_size,
                    quantity = entry.quantity,
                    error = %err,
                    "Stock decremented but sale record was not written"
                );
                return Err(err.into());
            }
        };

        info!(
            sale_id = %sale.id,
            actor = %actor.id,
            date = %sale.date,
            tyre_size = %sale.tyre_size,
            quantity = sale.quantity,
            total = %sale.total_amount(),
            remaining = updated.quantity,
            "Sale recorded"
        );

        self.ledger.notifications().dispatch(StockEvent::SaleRecorded {
            sale_id: sale.id.clone(),
            date: sale.date,
            tyre_size: sale.tyre_size.clone(),
            quantity: sale.quantity,
            total_amount_cents: sale.total_amount_cents,
            remaining: updated.quantity,
        });

        Ok(sale)
    }

    /// Sales for one date, or all sales when `date` is `None`.
    pub async fn get_sales_records(&self, date: Option<NaiveDate>) -> LedgerResult<Vec<SaleRecord>> {
        Ok(self.ledger.database().sales().list(date).await?)
    }

    /// Count, units and revenue for one date.
    pub async fn sales_summary(&self, date: NaiveDate) -> LedgerResult<SalesSummary> {
        Ok(self.ledger.database().sales().summary(date).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::notify::{ChannelNotifier, NotificationDispatcher};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tyre_core::{AddStockRequest, Role, StockStatus};
    use tyre_db::{Database, DbConfig};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn worker() -> Actor {
        Actor::new("worker-7", Role::Worker)
    }

    async fn setup() -> (SaleProcessor, mpsc::Receiver<StockEvent>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (notifier, rx) = ChannelNotifier::channel(32);
        let dispatcher = NotificationDispatcher::new(Arc::new(notifier), Duration::from_secs(1));
        (SaleProcessor::new(StockLedger::new(db, dispatcher)), rx)
    }

    async fn receive(processor: &SaleProcessor, date: NaiveDate, quantity: i64) {
        processor
            .ledger()
            .add_stock(
                &Actor::new("owner-1", Role::Owner),
                AddStockRequest {
                    date,
                    tyre_size: "185/65R15".to_string(),
                    quantity,
                    ssp_cents: 1_300,
                    total_amount_cents: quantity * 1_000,
                    price_per_unit_cents: 1_000,
                    location: "Main St".to_string(),
                },
            )
            .await
            .unwrap();
    }

    fn sale(date: Option<NaiveDate>, quantity: i64) -> RecordSaleRequest {
        RecordSaleRequest {
            date,
            tyre_size: "185/65r15".to_string(),
            quantity,
            customer_name: "Ayesha".to_string(),
            phone_number: Some("+92 300 1234567".to_string()),
            comment: None,
            price_per_unit_cents: 1_200,
        }
    }

    #[tokio::test]
    async fn test_receive_fifty_sell_ten() {
        let (processor, _rx) = setup().await;
        receive(&processor, day(14), 50).await;

        let open = processor.ledger().get_open_stock(Some(day(14))).await.unwrap();
        assert_eq!(open[0].quantity, 50);

        let record = processor.record_sale(&worker(), sale(Some(day(14)), 10)).await.unwrap();
        assert_eq!(record.quantity, 10);
        assert_eq!(record.total_amount_cents, 12_000);
        assert_eq!(record.tyre_size, "185/65R15");
        assert_eq!(record.user_id, "worker-7");

        let stock = processor.ledger().find_stock(day(14), "185/65R15").await.unwrap().unwrap();
        assert_eq!(stock.status, StockStatus::ExistingStock);
        assert_eq!(stock.quantity, 40);

        let snapshots = processor.ledger().get_open_stock_days(Some(day(14))).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].quantity, 50);
    }

    #[tokio::test]
    async fn test_oversell_leaves_no_trace() {
        let (processor, _rx) = setup().await;
        receive(&processor, day(14), 50).await;
        processor.record_sale(&worker(), sale(Some(day(14)), 10)).await.unwrap();

        let err = processor
            .record_sale(&worker(), sale(Some(day(14)), 60))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);

        let stock = processor.ledger().find_stock(day(14), "185/65R15").await.unwrap().unwrap();
        assert_eq!(stock.quantity, 40);
        assert_eq!(processor.get_sales_records(Some(day(14))).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_sale_takes_no_snapshot() {
        let (processor, _rx) = setup().await;
        receive(&processor, day(14), 50).await;

        processor.record_sale(&worker(), sale(Some(day(14)), 10)).await.unwrap();
        processor.record_sale(&worker(), sale(Some(day(14)), 15)).await.unwrap();

        let snapshots = processor.ledger().get_open_stock_days(Some(day(14))).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].quantity, 50);

        let stock = processor.ledger().find_stock(day(14), "185/65R15").await.unwrap().unwrap();
        assert_eq!(stock.quantity, 25);
        assert_eq!(stock.total_amount_cents, 50_000 + 12_000 + 18_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_sales_cannot_oversell() {
        let (processor, _rx) = setup().await;
        receive(&processor, day(14), 40).await;

        let a = tokio::spawn({
            let processor = processor.clone();
            async move { processor.record_sale(&worker(), sale(Some(day(14)), 30)).await }
        });
        let b = tokio::spawn({
            let processor = processor.clone();
            async move { processor.record_sale(&worker(), sale(Some(day(14)), 30)).await }
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let short = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.code() == ErrorCode::InsufficientStock))
            .count();

        assert_eq!(succeeded, 1);
        assert_eq!(short, 1);

        let stock = processor.ledger().find_stock(day(14), "185/65R15").await.unwrap().unwrap();
        assert_eq!(stock.quantity, 10);
        assert_eq!(processor.get_sales_records(None).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_on_shared_file_store() {
        let path = std::env::temp_dir().join(format!("tyre-ledger-sales-{}.db", std::process::id()));
        let db = Database::new(DbConfig::new(path.clone()).max_connections(5)).await.unwrap();
        let processor = SaleProcessor::new(StockLedger::new(db, NotificationDispatcher::disabled()));
        receive(&processor, day(14), 40).await;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let processor = processor.clone();
                tokio::spawn(async move { processor.record_sale(&worker(), sale(Some(day(14)), 5)).await })
            })
            .collect();

        let mut succeeded = 0;
        let mut short = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(e) => {
                    assert_eq!(e.code(), ErrorCode::InsufficientStock, "{e}");
                    short += 1;
                }
            }
        }
        assert_eq!((succeeded, short), (8, 2));

        let stock = processor.ledger().find_stock(day(14), "185/65R15").await.unwrap().unwrap();
        assert_eq!(stock.quantity, 0);
        assert_eq!(processor.get_sales_records(None).await.unwrap().len(), 8);
        assert_eq!(processor.ledger().get_open_stock_days(Some(day(14))).await.unwrap().len(), 1);

        processor.ledger().database().close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            std::fs::remove_file(file).ok();
        }
    }

    #[tokio::test]
    async fn test_missing_stock() {
        let (processor, _rx) = setup().await;

        let err = processor
            .record_sale(&worker(), sale(Some(day(14)), 1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::StockNotFound);
    }

    #[tokio::test]
    async fn test_customer_cannot_sell() {
        let (processor, _rx) = setup().await;
        receive(&processor, day(14), 5).await;

        let err = processor
            .record_sale(&Actor::new("c-1", Role::Customer), sale(Some(day(14)), 1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert!(processor.get_sales_records(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_sale_is_rejected_before_lookup() {
        let (processor, _rx) = setup().await;

        let mut req = sale(Some(day(14)), 1);
        req.phone_number = Some("not a phone".to_string());
        let err = processor.record_sale(&worker(), req).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_sale_after_close_is_rejected() {
        let (processor, _rx) = setup().await;
        receive(&processor, day(14), 50).await;
        processor.record_sale(&worker(), sale(Some(day(14)), 10)).await.unwrap();
        processor.ledger().close_day(day(14)).await.unwrap();

        let err = processor
            .record_sale(&worker(), sale(Some(day(14)), 1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(processor.get_sales_records(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_date_defaults_to_today() {
        let (processor, _rx) = setup().await;
        let today = Utc::now().date_naive();
        receive(&processor, today, 5).await;

        let record = processor.record_sale(&worker(), sale(None, 2)).await.unwrap();
        // A run straddling midnight UTC would look up tomorrow instead.
        assert_eq!(record.date, today);
    }

    #[tokio::test]
    async fn test_sales_summary() {
        let (processor, _rx) = setup().await;
        receive(&processor, day(14), 50).await;

        processor.record_sale(&worker(), sale(Some(day(14)), 10)).await.unwrap();
        processor.record_sale(&worker(), sale(Some(day(14)), 2)).await.unwrap();

        let summary = processor.sales_summary(day(14)).await.unwrap();
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.quantity, 12);
        assert_eq!(summary.total_amount_cents, 14_400);

        let records = processor.get_sales_records(Some(day(14))).await.unwrap();
        let total: i64 = records.iter().map(|r| r.total_amount_cents).sum();
        assert_eq!(total, summary.total_amount_cents);
    }

    #[tokio::test]
    async fn test_sale_is_announced() {
        let (processor, mut rx) = setup().await;
        receive(&processor, day(14), 50).await;
        let record = processor.record_sale(&worker(), sale(Some(day(14)), 10)).await.unwrap();

        let mut events = Vec::new();
        for _ in 0..2 {
            let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            events.push(event);
        }

        assert!(events.contains(&StockEvent::SaleRecorded {
            sale_id: record.id,
            date: day(14),
            tyre_size: "185/65R15".to_string(),
            quantity: 10,
            total_amount_cents: 12_000,
            remaining: 40,
        }));
    }
}
