use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogEntryId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormulaId(pub u32);

impl fmt::Display for FormulaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the customer measures the finished piece or the wall opening it goes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementMode {
    Final,
    Opening,
}

impl MeasurementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Final => "final",
            Self::Opening => "opening",
        }
    }
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementMode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "final" => Ok(Self::Final),
            "opening" => Ok(Self::Opening),
            other => {
                Err(DomainError::InvariantViolation(format!("unknown measurement mode `{other}`")))
            }
        }
    }
}

/// The four hierarchical attributes a catalog entry is narrowed by, in menu order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogAttribute {
    Category,
    Line,
    Model,
    Finish,
}

impl CatalogAttribute {
    pub const ORDER: [CatalogAttribute; 4] =
        [Self::Category, Self::Line, Self::Model, Self::Finish];

    /// 1-based position in the hierarchy.
    pub fn level(&self) -> u8 {
        match self {
            Self::Category => 1,
            Self::Line => 2,
            Self::Model => 3,
            Self::Finish => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Category => "product type",
            Self::Line => "product line",
            Self::Model => "model",
            Self::Finish => "finish",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: CatalogEntryId,
    pub description: String,
    pub measurement_mode: MeasurementMode,
    pub category: String,
    pub line: Option<String>,
    pub model: Option<String>,
    pub finish: Option<String>,
    pub formula_id: FormulaId,
}

impl CatalogEntry {
    pub fn attribute(&self, attribute: CatalogAttribute) -> Option<&str> {
        match attribute {
            CatalogAttribute::Category => Some(self.category.as_str()),
            CatalogAttribute::Line => self.line.as_deref(),
            CatalogAttribute::Model => self.model.as_deref(),
            CatalogAttribute::Finish => self.finish.as_deref(),
        }
        .filter(|value| !value.trim().is_empty())
    }
}
