//! # Stock Notifications
//!
//! Best-effort events about stock movements. Delivery never blocks or fails
//! the operation that produced the event.
//!
//! ```text
//! StockLedger / SaleProcessor
//!        │ dispatch(StockEvent)
//!        ▼
//! NotificationDispatcher ──tokio::spawn──► timeout(notifier.send(event))
//!                                               │
//!                                   ┌───────────┴───────────┐
//!                                   ▼                       ▼
//!                               Ok(()) debug!        Err / Elapsed warn!
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// =============================================================================
// Events
// =============================================================================

/// Something that happened to stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockEvent {
    StockReceived {
        date: NaiveDate,
        tyre_size: String,
        quantity: i64,
        on_hand: i64,
    },
    SaleRecorded {
        sale_id: String,
        date: NaiveDate,
        tyre_size: String,
        quantity: i64,
        total_amount_cents: i64,
        remaining: i64,
    },
    DayClosed {
        date: NaiveDate,
        records: usize,
    },
    StockRolledOver {
        from: NaiveDate,
        to: NaiveDate,
        records: usize,
    },
}

impl StockEvent {
    /// One-line human summary, as a notifier would render it.
    pub fn message(&self) -> String {
        match self {
            StockEvent::StockReceived {
                date,
                tyre_size,
                quantity,
                on_hand,
            } => format!("Received {quantity} × {tyre_size} for {date}; {on_hand} on hand"),
            StockEvent::SaleRecorded {
                date,
                tyre_size,
                quantity,
                remaining,
                ..
            } => format!("Sold {quantity} × {tyre_size} on {date}; {remaining} left"),
            StockEvent::DayClosed { date, records } => {
                format!("Closed {records} stock record(s) for {date}")
            }
            StockEvent::StockRolledOver { from, to, records } => {
                format!("Carried {records} stock record(s) from {from} to {to}")
            }
        }
    }
}

// =============================================================================
// Notifier
// =============================================================================

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel closed")]
    ChannelClosed,

    #[error("Notification channel full")]
    ChannelFull,

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Delivers stock events somewhere (log, channel, email gateway...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: &StockEvent) -> Result<(), NotifyError>;
}

/// Writes each event as an `info!` line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, event: &StockEvent) -> Result<(), NotifyError> {
        info!(target: "tyre_ledger::notify", event = ?event, "{}", event.message());
        Ok(())
    }
}

/// Forwards events to an in-process subscriber over a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<StockEvent>,
}

impl ChannelNotifier {
    /// Creates the notifier and the receiving end for the subscriber.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StockEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ChannelNotifier { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn send(&self, event: &StockEvent) -> Result<(), NotifyError> {
        self.tx.try_send(event.clone()).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => NotifyError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => NotifyError::ChannelClosed,
        })
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Fire-and-forget delivery with a per-event timeout.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Option<Arc<dyn Notifier>>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        NotificationDispatcher {
            notifier: Some(notifier),
            timeout,
        }
    }

    /// A dispatcher that drops every event.
    pub fn disabled() -> Self {
        NotificationDispatcher {
            notifier: None,
            timeout: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// Spawns delivery of `event` and returns immediately.
    ///
    /// The handle is only useful to tests; callers normally drop it.
    /// Returns `None` when notifications are disabled.
    pub fn dispatch(&self, event: StockEvent) -> Option<JoinHandle<()>> {
        let notifier = self.notifier.clone()?;
        let timeout = self.timeout;

        Some(tokio::spawn(async move {
            match tokio::time::timeout(timeout, notifier.send(&event)).await {
                Ok(Ok(())) => debug!(event = ?event, "Notification delivered"),
                Ok(Err(err)) => warn!(error = %err, event = ?event, "Notification failed"),
                Err(_) => warn!(timeout_ms = timeout.as_millis() as u64, event = ?event, "Notification timed out"),
            }
        }))
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("enabled", &self.is_enabled())
            .field("timeout", &self.timeout)
            .finish()
    }
}
