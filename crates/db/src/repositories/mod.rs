use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use thiserror::Error;

use cutquote_core::domain::catalog::CatalogEntry;
use cutquote_core::domain::customer::{Customer, CustomerId};
use cutquote_core::domain::material::MaterialEntry;
use cutquote_core::domain::order::{Order, OrderId, OrderStatus};

pub mod catalog;
pub mod customers;
pub mod materials;
pub mod memory;
pub mod orders;

pub use catalog::SqlCatalogRepository;
pub use customers::SqlCustomerRepository;
pub use materials::SqlMaterialRepository;
pub use memory::{
    InMemoryCatalogRepository, InMemoryCustomerRepository, InMemoryMaterialRepository,
    InMemoryOrderRepository,
};
pub use orders::SqlOrderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("order `{0}` already exists")]
    DuplicateOrder(OrderId),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Append-only order storage. Line items are never rewritten once persisted.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists all orders or none of them.
    async fn append(&self, orders: Vec<Order>) -> Result<(), RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError>;
    async fn list_for_customer(&self, customer: &CustomerId)
        -> Result<Vec<Order>, RepositoryError>;
    async fn list_by_name(&self, name: &str) -> Result<Vec<Order>, RepositoryError>;
    /// Ids starting with `prefix`, used to sequence the ids of one day.
    async fn ids_with_prefix(&self, prefix: &str) -> Result<Vec<OrderId>, RepositoryError>;
    async fn name_in_use(&self, name: &str) -> Result<bool, RepositoryError>;
    /// Sets the status of every order carrying `name`; `authorized_at` is only written when
    /// present. Returns the number of orders updated.
    async fn update_status(
        &self,
        name: &str,
        status: OrderStatus,
        authorized_at: Option<DateTime<Utc>>,
    ) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Every entry in table order.
    async fn list_entries(&self) -> Result<Vec<CatalogEntry>, RepositoryError>;
}

#[async_trait]
pub trait MaterialRepository: Send + Sync {
    async fn list_materials(&self) -> Result<Vec<MaterialEntry>, RepositoryError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_contact(&self, contact: &str) -> Result<Option<Customer>, RepositoryError>;
}

pub(crate) fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| RepositoryError::Decode(e.to_string()))
}

pub(crate) fn decimal_column(row: &SqliteRow, name: &str) -> Result<Decimal, RepositoryError> {
    let raw: String = column(row, name)?;
    Decimal::from_str(&raw)
        .map_err(|e| RepositoryError::Decode(format!("column `{name}` value `{raw}`: {e}")))
}

pub(crate) fn u32_column(row: &SqliteRow, name: &str) -> Result<u32, RepositoryError> {
    let raw: i64 = column(row, name)?;
    u32::try_from(raw)
        .map_err(|_| RepositoryError::Decode(format!("column `{name}` out of range: {raw}")))
}

pub(crate) fn timestamp_column(
    row: &SqliteRow,
    name: &str,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    let raw: Option<String> = column(row, name)?;
    raw.map(|value| {
        DateTime::parse_from_rfc3339(&value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::Decode(format!("column `{name}` value `{value}`: {e}")))
    })
    .transpose()
}
