use rust_decimal::Decimal;

use cutquote_core::domain::catalog::{CatalogEntry, CatalogEntryId, FormulaId, MeasurementMode};
use cutquote_core::domain::customer::{Customer, CustomerId};
use cutquote_core::domain::material::{MaterialEntry, MaterialId};

use crate::{repositories::RepositoryError, DbPool};

/// Demo customer directory, catalog and material table used by local runs and the end-to-end
/// tests. Loading is idempotent.
pub struct DemoDataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    pub customers: usize,
    pub catalog_entries: usize,
    pub materials: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCheck {
    pub name: &'static str,
    pub expected: i64,
    pub actual: i64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<VerificationCheck>,
}

fn catalog_entry(
    id: &str,
    description: &str,
    mode: MeasurementMode,
    levels: [Option<&str>; 4],
    formula: u32,
) -> CatalogEntry {
    let [category, line, model, finish] = levels;
    CatalogEntry {
        id: CatalogEntryId(id.to_string()),
        description: description.to_string(),
        measurement_mode: mode,
        category: category.unwrap_or_default().to_string(),
        line: line.map(str::to_string),
        model: model.map(str::to_string),
        finish: finish.map(str::to_string),
        formula_id: FormulaId(formula),
    }
}

fn material(id: &str, color: &str, thickness: &str, treatment: &str, cents: i64) -> MaterialEntry {
    MaterialEntry {
        id: MaterialId(id.to_string()),
        description: format!("{color} {thickness} {treatment}"),
        color: color.to_string(),
        thickness: thickness.to_string(),
        treatment: treatment.to_string(),
        price_per_m2: Decimal::new(cents, 2),
    }
}

impl DemoDataset {
    pub fn customers() -> Vec<Customer> {
        vec![
            Customer {
                id: CustomerId("C-001".to_string()),
                name: "Ana Souza".to_string(),
                contact: "5511999990000".to_string(),
            },
            Customer {
                id: CustomerId("C-002".to_string()),
                name: "Bruno Lima".to_string(),
                contact: "5511988880000".to_string(),
            },
        ]
    }

    pub fn catalog() -> Vec<CatalogEntry> {
        use MeasurementMode::{Final, Opening};

        vec![
            catalog_entry(
                "P-01",
                "Sliding window, 2 leaves",
                Final,
                [Some("Window"), Some("Sliding 2 leaves"), None, None],
                4,
            ),
            catalog_entry(
                "P-02",
                "Sliding window, 4 leaves",
                Final,
                [Some("Window"), Some("Sliding 4 leaves"), None, None],
                3,
            ),
            catalog_entry(
                "P-03",
                "Fixed window",
                Final,
                [Some("Window"), Some("Fixed"), None, None],
                1,
            ),
            catalog_entry(
                "P-04",
                "Corner shower, clear",
                Final,
                [Some("Shower"), Some("Corner"), None, Some("Clear")],
                1,
            ),
            catalog_entry(
                "P-05",
                "Corner shower, frosted",
                Final,
                [Some("Shower"), Some("Corner"), None, Some("Frosted")],
                1,
            ),
            catalog_entry("P-06", "Wall mirror", Final, [Some("Mirror"), None, None, None], 1),
            catalog_entry("P-07", "Bathroom mirror", Final, [Some("Mirror"), None, None, None], 1),
            catalog_entry(
                "P-08",
                "Fixed window for opening",
                Opening,
                [Some("Window"), Some("Fixed"), None, None],
                2,
            ),
            catalog_entry(
                "P-09",
                "Sliding window for opening, 2 leaves",
                Opening,
                [Some("Window"), Some("Sliding 2 leaves"), None, None],
                4,
            ),
        ]
    }

    pub fn materials() -> Vec<MaterialEntry> {
        vec![
            material("M-01", "Clear", "8mm", "Tempered", 18_000),
            material("M-02", "Clear", "8mm", "Laminated", 24_000),
            material("M-03", "Clear", "10mm", "Tempered", 22_000),
            material("M-04", "Bronze", "8mm", "Tempered", 21_000),
            material("M-05", "Silver", "4mm", "Polished", 9_000),
        ]
    }

    /// Inserts the demo rows in one transaction. Rows already present are left untouched.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let customers = Self::customers();
        let catalog = Self::catalog();
        let materials = Self::materials();

        let mut tx = pool.begin().await?;

        for customer in &customers {
            sqlx::query("INSERT OR IGNORE INTO customer (id, name, contact) VALUES (?1, ?2, ?3)")
                .bind(&customer.id.0)
                .bind(&customer.name)
                .bind(&customer.contact)
                .execute(&mut *tx)
                .await?;
        }

        for (position, entry) in catalog.iter().enumerate() {
            sqlx::query(
                "INSERT OR IGNORE INTO catalog_entry
                 (id, position, description, measurement_mode, category, line, model, finish,
                  formula_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .bind(&entry.id.0)
            .bind(position as i64)
            .bind(&entry.description)
            .bind(entry.measurement_mode.as_str())
            .bind(&entry.category)
            .bind(entry.line.as_deref())
            .bind(entry.model.as_deref())
            .bind(entry.finish.as_deref())
            .bind(i64::from(entry.formula_id.0))
            .execute(&mut *tx)
            .await?;
        }

        for (position, material) in materials.iter().enumerate() {
            sqlx::query(
                "INSERT OR IGNORE INTO material
                 (id, position, description, color, thickness, treatment, price_per_m2)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&material.id.0)
            .bind(position as i64)
            .bind(&material.description)
            .bind(&material.color)
            .bind(&material.thickness)
            .bind(&material.treatment)
            .bind(material.price_per_m2.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(SeedResult {
            customers: customers.len(),
            catalog_entries: catalog.len(),
            materials: materials.len(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let expectations: [(&'static str, &str, usize); 3] = [
            ("customers", "SELECT COUNT(1) FROM customer WHERE id LIKE 'C-0%'", 2),
            ("catalog-entries", "SELECT COUNT(1) FROM catalog_entry WHERE id LIKE 'P-0%'", 9),
            ("materials", "SELECT COUNT(1) FROM material WHERE id LIKE 'M-0%'", 5),
        ];

        let mut checks = Vec::with_capacity(expectations.len() + 1);
        for (name, query, expected) in expectations {
            let actual: i64 = sqlx::query_scalar(query).fetch_one(pool).await?;
            let expected = expected as i64;
            checks.push(VerificationCheck { name, expected, actual, passed: actual == expected });
        }

        let mirrors: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM catalog_entry
             WHERE category = 'Mirror' AND line IS NULL AND model IS NULL AND finish IS NULL",
        )
        .fetch_one(pool)
        .await?;
        checks.push(VerificationCheck {
            name: "ambiguous-mirror-pair",
            expected: 2,
            actual: mirrors,
            passed: mirrors == 2,
        });

        let all_present = checks.iter().all(|check| check.passed);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the demo rows. Orders placed against them are kept.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        for customer in Self::customers() {
            sqlx::query("DELETE FROM customer WHERE id = ?1")
                .bind(customer.id.0)
                .execute(&mut *tx)
                .await?;
        }
        for entry in Self::catalog() {
            sqlx::query("DELETE FROM catalog_entry WHERE id = ?1")
                .bind(entry.id.0)
                .execute(&mut *tx)
                .await?;
        }
        for material in Self::materials() {
            sqlx::query("DELETE FROM material WHERE id = ?1")
                .bind(material.id.0)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
