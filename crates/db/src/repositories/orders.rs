use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;

use cutquote_core::domain::catalog::MeasurementMode;
use cutquote_core::domain::customer::CustomerId;
use cutquote_core::domain::order::{LineItem, Order, OrderId, OrderStatus};

use super::{
    column, decimal_column, timestamp_column, u32_column, OrderRepository, RepositoryError,
};
use crate::DbPool;

const ORDER_COLUMNS: &str = "id, name, customer_id, project_description, material_description,
        measurement_mode, opening_height_mm, opening_width_mm, units, total, status,
        created_at, authorized_at";

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_orders(&self, rows: Vec<SqliteRow>) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = rows.iter().map(row_to_order).collect::<Result<Vec<_>, _>>()?;
        if orders.is_empty() {
            return Ok(orders);
        }

        let mut lines = self.load_lines(&orders).await?;
        for order in &mut orders {
            order.lines = lines.remove(&order.id.0).unwrap_or_default();
        }
        Ok(orders)
    }

    async fn load_lines(
        &self,
        orders: &[Order],
    ) -> Result<HashMap<String, Vec<LineItem>>, RepositoryError> {
        let placeholders = vec!["?"; orders.len()].join(", ");
        let sql = format!(
            "SELECT order_id, piece_name, quantity, height_mm, width_mm, area_m2, unit_price, total
             FROM order_line WHERE order_id IN ({placeholders})
             ORDER BY order_id, line_number"
        );
        let mut query = sqlx::query(&sql);
        for order in orders {
            query = query.bind(&order.id.0);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut lines: HashMap<String, Vec<LineItem>> = HashMap::new();
        for row in &rows {
            let order_id: String = column(row, "order_id")?;
            lines.entry(order_id).or_default().push(row_to_line(row)?);
        }
        Ok(lines)
    }
}

fn row_to_order(row: &SqliteRow) -> Result<Order, RepositoryError> {
    let measurement_mode: String = column(row, "measurement_mode")?;
    let status: String = column(row, "status")?;
    let created_at = timestamp_column(row, "created_at")?
        .ok_or_else(|| RepositoryError::Decode("created_at is null".to_string()))?;

    Ok(Order {
        id: OrderId(column(row, "id")?),
        name: column(row, "name")?,
        customer_id: CustomerId(column(row, "customer_id")?),
        project_description: column(row, "project_description")?,
        material_description: column(row, "material_description")?,
        measurement_mode: measurement_mode
            .parse::<MeasurementMode>()
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        opening_height_mm: u32_column(row, "opening_height_mm")?,
        opening_width_mm: u32_column(row, "opening_width_mm")?,
        units: u32_column(row, "units")?,
        lines: Vec::new(),
        total: decimal_column(row, "total")?,
        status: status.parse::<OrderStatus>().map_err(|e| RepositoryError::Decode(e.to_string()))?,
        created_at,
        authorized_at: timestamp_column(row, "authorized_at")?,
    })
}

fn row_to_line(row: &SqliteRow) -> Result<LineItem, RepositoryError> {
    Ok(LineItem {
        piece_name: column(row, "piece_name")?,
        quantity: u32_column(row, "quantity")?,
        height_mm: u32_column(row, "height_mm")?,
        width_mm: u32_column(row, "width_mm")?,
        area_m2: decimal_column(row, "area_m2")?,
        unit_price: decimal_column(row, "unit_price")?,
        total: decimal_column(row, "total")?,
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn append(&self, orders: Vec<Order>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for order in &orders {
            let inserted = sqlx::query(
                "INSERT INTO customer_order (id, name, customer_id, project_description,
                     material_description, measurement_mode, opening_height_mm, opening_width_mm,
                     units, total, status, created_at, authorized_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&order.id.0)
            .bind(&order.name)
            .bind(&order.customer_id.0)
            .bind(&order.project_description)
            .bind(&order.material_description)
            .bind(order.measurement_mode.as_str())
            .bind(i64::from(order.opening_height_mm))
            .bind(i64::from(order.opening_width_mm))
            .bind(i64::from(order.units))
            .bind(order.total.to_string())
            .bind(order.status.as_str())
            .bind(order.created_at.to_rfc3339())
            .bind(order.authorized_at.map(|at| at.to_rfc3339()))
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {}
                Err(error) if is_unique_violation(&error) => {
                    return Err(RepositoryError::DuplicateOrder(order.id.clone()));
                }
                Err(error) => return Err(error.into()),
            }

            for (line_number, line) in order.lines.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO order_line (order_id, line_number, piece_name, quantity,
                         height_mm, width_mm, area_m2, unit_price, total)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&order.id.0)
                .bind(line_number as i64)
                .bind(&line.piece_name)
                .bind(i64::from(line.quantity))
                .bind(i64::from(line.height_mm))
                .bind(i64::from(line.width_mm))
                .bind(line.area_m2.to_string())
                .bind(line.unit_price.to_string())
                .bind(line.total.to_string())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM customer_order ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        self.load_orders(rows).await
    }

    async fn list_for_customer(
        &self,
        customer: &CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE customer_id = ? ORDER BY id"
        ))
        .bind(&customer.0)
        .fetch_all(&self.pool)
        .await?;
        self.load_orders(rows).await
    }

    async fn list_by_name(&self, name: &str) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE name = ? ORDER BY id"
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        self.load_orders(rows).await
    }

    async fn ids_with_prefix(&self, prefix: &str) -> Result<Vec<OrderId>, RepositoryError> {
        let rows = sqlx::query("SELECT id FROM customer_order WHERE substr(id, 1, ?) = ?")
            .bind(prefix.chars().count() as i64)
            .bind(prefix)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| column::<String>(row, "id").map(OrderId)).collect()
    }

    async fn name_in_use(&self, name: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM customer_order WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = column(&row, "count")?;
        Ok(count > 0)
    }

    async fn update_status(
        &self,
        name: &str,
        status: OrderStatus,
        authorized_at: Option<DateTime<Utc>>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE customer_order
             SET status = ?, authorized_at = COALESCE(?, authorized_at)
             WHERE name = ?",
        )
        .bind(status.as_str())
        .bind(authorized_at.map(|at| at.to_rfc3339()))
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
