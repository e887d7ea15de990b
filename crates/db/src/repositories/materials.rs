use sqlx::sqlite::SqliteRow;

use cutquote_core::domain::material::{MaterialEntry, MaterialId};

use super::{column, decimal_column, MaterialRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMaterialRepository {
    pool: DbPool,
}

impl SqlMaterialRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_material(row: &SqliteRow) -> Result<MaterialEntry, RepositoryError> {
    Ok(MaterialEntry {
        id: MaterialId(column(row, "id")?),
        description: column(row, "description")?,
        color: column(row, "color")?,
        thickness: column(row, "thickness")?,
        treatment: column(row, "treatment")?,
        price_per_m2: decimal_column(row, "price_per_m2")?,
    })
}

#[async_trait::async_trait]
impl MaterialRepository for SqlMaterialRepository {
    async fn list_materials(&self) -> Result<Vec<MaterialEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, description, color, thickness, treatment, price_per_m2
             FROM material ORDER BY position, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_material).collect::<Result<Vec<_>, _>>()
    }
}
