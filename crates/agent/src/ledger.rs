use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use cutquote_core::cpq::price_pieces;
use cutquote_core::domain::customer::CustomerId;
use cutquote_core::domain::order::{LineItem, Order, OrderId, OrderStatus, PieceDraft, SubOrder};
use cutquote_core::errors::DomainError;
use cutquote_db::{OrderRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Transition(#[from] DomainError),
    #[error("nothing to commit")]
    EmptyCommit,
    #[error("order name `{0}` is already in use")]
    NameInUse(String),
}

/// Outcome of [`OrderLedger::set_status`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusChange {
    Updated { orders: u64 },
    Unchanged,
    NotFound,
}

/// Prices, sequences and persists orders. Id generation and append run under one global lock
/// so the daily sequence stays gap-free and collision-free across contacts.
pub struct OrderLedger {
    orders: Arc<dyn OrderRepository>,
    sequence: Mutex<()>,
}

impl OrderLedger {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders, sequence: Mutex::new(()) }
    }

    pub fn price(&self, pieces: &[PieceDraft], price_per_m2: Decimal) -> (Vec<LineItem>, Decimal) {
        price_pieces(pieces, price_per_m2)
    }

    async fn next_id_unlocked(&self, today: NaiveDate) -> Result<OrderId, LedgerError> {
        let existing = self.orders.ids_with_prefix(&OrderId::date_code(today)).await?;
        Ok(OrderId::next_for_day(today, &existing))
    }

    pub async fn next_order_id(&self, today: NaiveDate) -> Result<OrderId, LedgerError> {
        let _sequence = self.sequence.lock().await;
        self.next_id_unlocked(today).await
    }

    /// Persists every sub-order as its own quote under `name`, all or nothing. The name must not
    /// be used by any persisted order.
    pub async fn commit(
        &self,
        name: &str,
        customer: &CustomerId,
        sub_orders: &[SubOrder],
        now: DateTime<Utc>,
    ) -> Result<Vec<Order>, LedgerError> {
        if sub_orders.is_empty() {
            return Err(LedgerError::EmptyCommit);
        }

        let _sequence = self.sequence.lock().await;
        if self.orders.name_in_use(name).await? {
            return Err(LedgerError::NameInUse(name.to_string()));
        }
        let today = now.date_naive();
        let first = self.next_id_unlocked(today).await?;
        let start = first.sequence_for(&OrderId::date_code(today)).unwrap_or(1);

        let orders: Vec<Order> = sub_orders
            .iter()
            .zip(start..)
            .map(|(sub_order, sequence)| {
                Order::quote_from(
                    OrderId::new(today, sequence),
                    name,
                    customer.clone(),
                    sub_order.clone(),
                    now,
                )
            })
            .collect();

        self.orders.append(orders.clone()).await?;
        info!(
            event_name = "ledger.orders_committed",
            order_name = name,
            customer_id = %customer.0,
            order_count = orders.len(),
            first_order_id = %first,
            "orders committed"
        );
        Ok(orders)
    }

    /// Moves every order carrying `name` to `status`. Re-applying the current status is a
    /// no-op; an unknown name reports [`StatusChange::NotFound`].
    pub async fn set_status(
        &self,
        name: &str,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<StatusChange, LedgerError> {
        let mut orders = self.orders.list_by_name(name).await?;
        if orders.is_empty() {
            return Ok(StatusChange::NotFound);
        }

        let mut changed = false;
        for order in &mut orders {
            changed |= order.transition_to(status, now)?;
        }
        if !changed {
            return Ok(StatusChange::Unchanged);
        }

        let authorized_at = (status == OrderStatus::Authorized).then_some(now);
        let updated = self.orders.update_status(name, status, authorized_at).await?;
        info!(
            event_name = "ledger.status_changed",
            order_name = name,
            status = %status,
            updated,
            "order status changed"
        );
        Ok(StatusChange::Updated { orders: updated })
    }

    pub async fn orders_for(&self, customer: &CustomerId) -> Result<Vec<Order>, LedgerError> {
        Ok(self.orders.list_for_customer(customer).await?)
    }
}
