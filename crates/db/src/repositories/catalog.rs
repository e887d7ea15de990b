use sqlx::sqlite::SqliteRow;

use cutquote_core::domain::catalog::{CatalogEntry, CatalogEntryId, FormulaId, MeasurementMode};

use super::{column, u32_column, CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<CatalogEntry, RepositoryError> {
    let measurement_mode: String = column(row, "measurement_mode")?;

    Ok(CatalogEntry {
        id: CatalogEntryId(column(row, "id")?),
        description: column(row, "description")?,
        measurement_mode: measurement_mode
            .parse::<MeasurementMode>()
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        category: column(row, "category")?,
        line: column(row, "line")?,
        model: column(row, "model")?,
        finish: column(row, "finish")?,
        formula_id: FormulaId(u32_column(row, "formula_id")?),
    })
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn list_entries(&self) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, description, measurement_mode, category, line, model, finish, formula_id
             FROM catalog_entry ORDER BY position, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use cutquote_core::domain::catalog::{FormulaId, MeasurementMode};

    use super::SqlCatalogRepository;
    use crate::repositories::{CatalogRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn entries_come_back_in_table_order_with_optional_levels() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        sqlx::query(
            "INSERT INTO catalog_entry
                 (id, position, description, measurement_mode, category, line, model, finish,
                  formula_id)
             VALUES
                 ('P-2', 2, 'Shower screen', 'final', 'Shower', 'Corner', NULL, 'Frosted', 1),
                 ('P-1', 1, 'Fixed window', 'opening', 'Window', 'Fixed', NULL, NULL, 2)",
        )
        .execute(&pool)
        .await
        .expect("insert catalog");

        let entries = SqlCatalogRepository::new(pool).list_entries().await.expect("list");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id.0, "P-1");
        assert_eq!(entries[0].measurement_mode, MeasurementMode::Opening);
        assert_eq!(entries[0].model, None);
        assert_eq!(entries[0].formula_id, FormulaId(2));
        assert_eq!(entries[1].finish.as_deref(), Some("Frosted"));
    }

    #[tokio::test]
    async fn unknown_measurement_mode_is_a_decode_error() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        sqlx::query("PRAGMA ignore_check_constraints = ON").execute(&pool).await.expect("pragma");
        sqlx::query(
            "INSERT INTO catalog_entry
                 (id, position, description, measurement_mode, category, formula_id)
             VALUES ('P-9', 1, 'Odd entry', 'sideways', 'Window', 1)",
        )
        .execute(&pool)
        .await
        .expect("insert catalog");

        let error = SqlCatalogRepository::new(pool).list_entries().await.expect_err("decode");
        assert!(matches!(error, RepositoryError::Decode(_)));
    }
}
