use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use cutquote_core::domain::catalog::CatalogEntry;
use cutquote_core::domain::customer::{Customer, CustomerId};
use cutquote_core::domain::material::MaterialEntry;
use cutquote_core::domain::order::{Order, OrderId, OrderStatus};

use super::{
    CatalogRepository, CustomerRepository, MaterialRepository, OrderRepository, RepositoryError,
};

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<Vec<Order>>,
    fail_writes: AtomicBool,
}

impl InMemoryOrderRepository {
    /// Makes every subsequent write fail with [`RepositoryError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("order storage is read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn append(&self, orders: Vec<Order>) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut stored = self.orders.write().await;
        for (index, order) in orders.iter().enumerate() {
            let clashes = stored.iter().chain(&orders[..index]).any(|other| other.id == order.id);
            if clashes {
                return Err(RepositoryError::DuplicateOrder(order.id.clone()));
            }
        }
        stored.extend(orders);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = self.orders.read().await.clone();
        orders.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(orders)
    }

    async fn list_for_customer(
        &self,
        customer: &CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.list_all().await?;
        Ok(orders.into_iter().filter(|order| &order.customer_id == customer).collect())
    }

    async fn list_by_name(&self, name: &str) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.list_all().await?;
        Ok(orders.into_iter().filter(|order| order.name == name).collect())
    }

    async fn ids_with_prefix(&self, prefix: &str) -> Result<Vec<OrderId>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .filter(|order| order.id.0.starts_with(prefix))
            .map(|order| order.id.clone())
            .collect())
    }

    async fn name_in_use(&self, name: &str) -> Result<bool, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().any(|order| order.name == name))
    }

    async fn update_status(
        &self,
        name: &str,
        status: OrderStatus,
        authorized_at: Option<DateTime<Utc>>,
    ) -> Result<u64, RepositoryError> {
        self.check_writable()?;
        let mut orders = self.orders.write().await;
        let mut updated = 0;
        for order in orders.iter_mut().filter(|order| order.name == name) {
            order.status = status;
            if authorized_at.is_some() {
                order.authorized_at = authorized_at;
            }
            updated += 1;
        }
        Ok(updated)
    }
}

pub struct InMemoryCatalogRepository {
    entries: Vec<CatalogEntry>,
}

impl InMemoryCatalogRepository {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn list_entries(&self) -> Result<Vec<CatalogEntry>, RepositoryError> {
        Ok(self.entries.clone())
    }
}

pub struct InMemoryMaterialRepository {
    materials: Vec<MaterialEntry>,
}

impl InMemoryMaterialRepository {
    pub fn new(materials: Vec<MaterialEntry>) -> Self {
        Self { materials }
    }
}

#[async_trait::async_trait]
impl MaterialRepository for InMemoryMaterialRepository {
    async fn list_materials(&self) -> Result<Vec<MaterialEntry>, RepositoryError> {
        Ok(self.materials.clone())
    }
}

pub struct InMemoryCustomerRepository {
    customers: Vec<Customer>,
}

impl InMemoryCustomerRepository {
    pub fn new(customers: Vec<Customer>) -> Self {
        Self { customers }
    }
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_contact(&self, contact: &str) -> Result<Option<Customer>, RepositoryError> {
        let contact = contact.trim();
        Ok(self.customers.iter().find(|customer| customer.contact == contact).cloned())
    }
}
