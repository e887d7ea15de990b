use cutquote_core::domain::customer::{Customer, CustomerId};

use super::{column, CustomerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn find_by_contact(&self, contact: &str) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, contact FROM customer WHERE contact = ?")
            .bind(contact.trim())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(Customer {
                id: CustomerId(column(r, "id")?),
                name: column(r, "name")?,
                contact: column(r, "contact")?,
            })),
            None => Ok(None),
        }
    }
}
