//! # Stock Ledger
//!
//! Owns stock records keyed by `(date, tyre_size)`: receipts, sale deltas,
//! day closing, rollover and the stock queries.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_stock(actor, req)                                                 │
//! │    authorize ─► validate ─► receipt_effect ─► upsert ─► StockReceived  │
//! │                                                                         │
//! │  apply_sale_delta(stock, qty, revenue)          (called by SaleProcessor)│
//! │    plan_sale ─► [snapshot + guarded decrement] ─► updated record       │
//! │                         │ no row                                        │
//! │                         └─► re-read ─► diagnose_failed_sale            │
//! │                                                                         │
//! │  close_day(date)            existing-stock ─► closed-stock             │
//! │  rollover_open_stock(date)  latest closed day ─► open-stock on date    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::LedgerConfig;
use crate::error::LedgerResult;
use crate::notify::{NotificationDispatcher, Notifier, StockEvent};
use tyre_core::lifecycle;
use tyre_core::validation;
use tyre_core::{
    AccessPolicy, Action, Actor, AddStockRequest, CoreError, CoreResult, Money, RolePolicy,
    StockReceipt, StockRecord, StockStatus,
};
use tyre_db::Database;

/// The stock lifecycle engine.
#[derive(Clone)]
pub struct StockLedger {
    db: Database,
    policy: Arc<dyn AccessPolicy>,
    notifications: NotificationDispatcher,
}

impl StockLedger {
    /// Creates a ledger with the default [`RolePolicy`].
    pub fn new(db: Database, notifications: NotificationDispatcher) -> Self {
        StockLedger {
            db,
            policy: Arc::new(RolePolicy),
            notifications,
        }
    }

    /// Creates a ledger whose notification settings come from `config`.
    pub fn from_config(db: Database, config: &LedgerConfig, notifier: Arc<dyn Notifier>) -> Self {
        let notifications = if config.notify.enabled {
            NotificationDispatcher::new(notifier, config.notify_timeout())
        } else {
            NotificationDispatcher::disabled()
        };
        Self::new(db, notifications)
    }

    /// Replaces the access policy.
    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn notifications(&self) -> &NotificationDispatcher {
        &self.notifications
    }

    /// Checks `actor` against the configured policy.
    pub fn authorize(&self, actor: &Actor, action: Action) -> LedgerResult<()> {
        self.policy.authorize(actor, action).map_err(|err| {
            warn!(actor = %actor.id, role = %actor.role, ?action, "Access denied");
            err.into()
        })
    }

    // =========================================================================
    // Receipts
    // =========================================================================

    /// Receives stock for a `(date, tyre_size)` key.
    ///
    /// ## Effect by current status
    /// ```text
    /// none            → create open-stock
    /// open-stock      → replace quantity, prices, amount, location
    /// existing-stock  → add quantity and amount
    /// closed-stock    → rejected (day closed)
    /// ```
    pub async fn add_stock(&self, actor: &Actor, req: AddStockRequest) -> LedgerResult<StockRecord> {
        self.authorize(actor, Action::AddStock)?;
        let receipt = validation::validate_add_stock(&req).map_err(CoreError::from)?;

        let day_closed = || CoreError::DayClosed {
            date: receipt.date,
            tyre_size: receipt.tyre_size.clone(),
        };

        let stock = self.db.stock();
        let current = stock.find_live(receipt.date, &receipt.tyre_size).await?;
        let effect =
            lifecycle::receipt_effect(current.as_ref().map(|r| r.status)).map_err(|_| day_closed())?;

        // The upsert re-checks status and totals itself; a concurrent close wins.
        let record = match stock.upsert_receipt(&receipt).await? {
            Some(record) => record,
            None => {
                let current = stock.find_live(receipt.date, &receipt.tyre_size).await?;
                let err =
                    lifecycle::diagnose_failed_receipt(receipt.date, &receipt.tyre_size, current.as_ref());
                info!(error = %err, "Receipt rejected at write");
                return Err(err.into());
            }
        };

        info!(
            actor = %actor.id,
            date = %record.date,
            tyre_size = %record.tyre_size,
            ?effect,
            received = receipt.quantity,
            on_hand = record.quantity,
            "Stock received"
        );

        self.notifications.dispatch(StockEvent::StockReceived {
            date: record.date,
            tyre_size: record.tyre_size.clone(),
            quantity: receipt.quantity,
            on_hand: record.quantity,
        });

        Ok(record)
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Applies a sale of `quantity` units worth `total_amount_delta` to a
    /// live record, snapshotting it first if it is still open-stock.
    ///
    /// `stock` may be stale. Its status and running total are checked up
    /// front, but only the guarded update decides whether enough units are
    /// on hand. When it matches nothing the record is re-read to report why.
    pub async fn apply_sale_delta(
        &self,
        stock: &StockRecord,
        quantity: i64,
        total_amount_delta: Money,
    ) -> LedgerResult<StockRecord> {
        let plan = lifecycle::plan_sale(stock, total_amount_delta)?;
        let repo = self.db.stock();

        match repo.apply_sale(&stock.id, quantity, total_amount_delta).await? {
            Some(updated) => {
                if plan.snapshot_first {
                    info!(
                        date = %stock.date,
                        tyre_size = %stock.tyre_size,
                        quantity = stock.quantity,
                        "Open stock snapshotted at first sale"
                    );
                }
                Ok(updated)
            }
            None => {
                let current = repo.get_by_id(&stock.id).await?;
                let err = lifecycle::diagnose_failed_sale(
                    stock.date,
                    &stock.tyre_size,
                    current.as_ref(),
                    quantity,
                );
                info!(error = %err, "Sale rejected at write");
                Err(err.into())
            }
        }
    }

    // =========================================================================
    // Day boundaries
    // =========================================================================

    /// Closes every existing-stock record of `date`.
    ///
    /// Idempotent: a repeated call returns the same closed records.
    ///
    /// ## Errors
    /// `NotFound` when `date` has neither existing nor closed stock.
    pub async fn close_day(&self, date: NaiveDate) -> LedgerResult<Vec<StockRecord>> {
        let stock = self.db.stock();
        let newly_closed = stock.close_day(date).await?;
        let closed = stock.list(StockStatus::ClosedStock, Some(date)).await?;

        if closed.is_empty() {
            return Err(CoreError::not_found("Stock to close", date.to_string()).into());
        }

        if newly_closed > 0 {
            info!(%date, records = newly_closed, "Stock day closed");
            self.notifications.dispatch(StockEvent::DayClosed {
                date,
                records: newly_closed as usize,
            });
        }

        Ok(closed)
    }

    /// Opens `date` with the most recent earlier closing balance.
    ///
    /// Closed records are left as they are; tyre sizes that already have a
    /// live record on `date`, or closed at zero, are skipped.
    ///
    /// ## Returns
    /// All open-stock records for `date`, carried or received.
    ///
    /// ## Errors
    /// `NoStockAvailable` when `date` ends up with no open stock.
    pub async fn rollover_open_stock(&self, date: NaiveDate) -> LedgerResult<Vec<StockRecord>> {
        let stock = self.db.stock();

        if let Some(previous) = stock.latest_closed_date_before(date).await? {
            let closed = stock.list(StockStatus::ClosedStock, Some(previous)).await?;
            let carried = closed
                .iter()
                .filter(|record| lifecycle::carries_forward(record))
                .map(|record| carry_forward(record, date))
                .collect::<CoreResult<Vec<_>>>()?;

            let created = stock.open_carried_forward(&carried).await?;
            if created > 0 {
                info!(from = %previous, to = %date, records = created, "Stock rolled over");
                self.notifications.dispatch(StockEvent::StockRolledOver {
                    from: previous,
                    to: date,
                    records: created as usize,
                });
            }
        }

        let open = stock.list(StockStatus::OpenStock, Some(date)).await?;
        if open.is_empty() {
            return Err(CoreError::NoStockAvailable { date }.into());
        }

        Ok(open)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_open_stock(&self, date: Option<NaiveDate>) -> LedgerResult<Vec<StockRecord>> {
        Ok(self.db.stock().list(StockStatus::OpenStock, date).await?)
    }

    pub async fn get_existing_stock(&self, date: Option<NaiveDate>) -> LedgerResult<Vec<StockRecord>> {
        Ok(self.db.stock().list(StockStatus::ExistingStock, date).await?)
    }

    pub async fn get_closed_stock(&self, date: Option<NaiveDate>) -> LedgerResult<Vec<StockRecord>> {
        Ok(self.db.stock().list(StockStatus::ClosedStock, date).await?)
    }

    /// Open-stock-day snapshots.
    pub async fn get_open_stock_days(&self, date: Option<NaiveDate>) -> LedgerResult<Vec<StockRecord>> {
        Ok(self.db.stock().list(StockStatus::OpenStockDay, date).await?)
    }

    /// Live record for a key; the tyre size is normalized first.
    pub async fn find_stock(&self, date: NaiveDate, tyre_size: &str) -> LedgerResult<Option<StockRecord>> {
        let tyre_size = validation::normalize_tyre_size(tyre_size).map_err(CoreError::from)?;
        Ok(self.db.stock().find_live(date, &tyre_size).await?)
    }
}

fn carry_forward(closed: &StockRecord, date: NaiveDate) -> CoreResult<StockReceipt> {
    Ok(StockReceipt {
        date,
        tyre_size: closed.tyre_size.clone(),
        quantity: closed.quantity,
        ssp: closed.ssp(),
        total_amount: lifecycle::rollover_amount(closed)?,
        price_per_unit: closed.price_per_unit(),
        location: closed.location.clone(),
    })
}

impl std::fmt::Debug for StockLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockLedger")
            .field("db", &self.db)
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
