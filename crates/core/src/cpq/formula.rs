use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::catalog::FormulaId;
use crate::domain::order::PieceDraft;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormulaError {
    #[error("formula {0} is not registered")]
    UnknownFormula(FormulaId),
    #[error("formula {formula} piece `{piece}` cannot be computed: {reason}")]
    InvalidTransform { formula: FormulaId, piece: String, reason: String },
    #[error("quantity multiplier must be positive")]
    InvalidMultiplier,
    #[error("formula {0} is defined more than once")]
    DuplicateFormula(FormulaId),
    #[error("could not parse formula definitions: {0}")]
    Parse(String),
}

/// How a piece's height and width derive from the measured height and width.
/// Divisions are integer divisions rounding toward zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PieceTransform {
    Identity,
    Offset {
        height: i64,
        width: i64,
    },
    /// The width is split into `panels` equal leaves before the offsets are applied.
    Split {
        panels: u32,
        height_offset: i64,
        width_offset: i64,
    },
}

impl PieceTransform {
    pub fn apply(&self, height: u32, width: u32) -> Result<(i64, i64), String> {
        let height = i64::from(height);
        let width = i64::from(width);
        match self {
            Self::Identity => Ok((height, width)),
            Self::Offset { height: dh, width: dw } => Ok((
                height.checked_add(*dh).ok_or("height overflow")?,
                width.checked_add(*dw).ok_or("width overflow")?,
            )),
            Self::Split { panels, height_offset, width_offset } => {
                if *panels == 0 {
                    return Err("split into zero panels".to_string());
                }
                let leaf = width / i64::from(*panels);
                Ok((
                    height.checked_add(*height_offset).ok_or("height overflow")?,
                    leaf.checked_add(*width_offset).ok_or("width overflow")?,
                ))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceTemplate {
    pub name: String,
    pub quantity: u32,
    pub transform: PieceTransform,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub id: FormulaId,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub pieces: Vec<PieceTemplate>,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct FormulaFile {
    formulas: Vec<Formula>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormulaRegistry {
    formulas: BTreeMap<FormulaId, Formula>,
}

impl Default for FormulaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FormulaRegistry {
    pub fn new(formulas: Vec<Formula>) -> Result<Self, FormulaError> {
        let mut registry = BTreeMap::new();
        for formula in formulas {
            let id = formula.id;
            if registry.insert(id, formula).is_some() {
                return Err(FormulaError::DuplicateFormula(id));
            }
        }
        Ok(Self { formulas: registry })
    }

    /// The production cutting rules shipped with the service.
    pub fn builtin() -> Self {
        let piece = |name: &str, quantity: u32, transform: PieceTransform| PieceTemplate {
            name: name.to_string(),
            quantity,
            transform,
        };
        let formulas = [
            Formula {
                id: FormulaId(1),
                name: "Single piece".to_string(),
                version: 1,
                pieces: vec![piece("Main piece", 1, PieceTransform::Identity)],
            },
            Formula {
                id: FormulaId(2),
                name: "Single piece inset in opening".to_string(),
                version: 1,
                pieces: vec![piece(
                    "Fixed piece",
                    1,
                    PieceTransform::Offset { height: -20, width: -20 },
                )],
            },
            Formula {
                id: FormulaId(3),
                name: "Four-leaf opening window".to_string(),
                version: 1,
                pieces: vec![
                    piece(
                        "Fixed leaf",
                        2,
                        PieceTransform::Split { panels: 4, height_offset: -25, width_offset: 0 },
                    ),
                    piece(
                        "Sliding leaf",
                        2,
                        PieceTransform::Split { panels: 4, height_offset: -62, width_offset: 50 },
                    ),
                ],
            },
            Formula {
                id: FormulaId(4),
                name: "Two-leaf opening window".to_string(),
                version: 1,
                pieces: vec![
                    piece(
                        "Fixed leaf",
                        1,
                        PieceTransform::Split { panels: 2, height_offset: -25, width_offset: 0 },
                    ),
                    piece(
                        "Sliding leaf",
                        1,
                        PieceTransform::Split { panels: 2, height_offset: -62, width_offset: 50 },
                    ),
                ],
            },
        ];
        Self { formulas: formulas.into_iter().map(|formula| (formula.id, formula)).collect() }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, FormulaError> {
        let file: FormulaFile =
            toml::from_str(raw).map_err(|error| FormulaError::Parse(error.to_string()))?;
        Self::new(file.formulas)
    }

    pub fn get(&self, id: FormulaId) -> Option<&Formula> {
        self.formulas.get(&id)
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Computes every piece of the formula for the measured opening. Piece counts are scaled by
    /// `multiplier`; negative dimensions clamp to zero. Any failing piece fails the whole call.
    pub fn compute(
        &self,
        id: FormulaId,
        height_mm: u32,
        width_mm: u32,
        multiplier: u32,
    ) -> Result<Vec<PieceDraft>, FormulaError> {
        if multiplier == 0 {
            return Err(FormulaError::InvalidMultiplier);
        }
        let formula = self.get(id).ok_or(FormulaError::UnknownFormula(id))?;

        formula
            .pieces
            .iter()
            .map(|template| {
                let invalid = |reason: String| FormulaError::InvalidTransform {
                    formula: id,
                    piece: template.name.clone(),
                    reason,
                };
                let (height, width) =
                    template.transform.apply(height_mm, width_mm).map_err(invalid)?;
                let quantity = template
                    .quantity
                    .checked_mul(multiplier)
                    .ok_or_else(|| invalid("piece count overflow".to_string()))?;
                Ok(PieceDraft {
                    name: template.name.clone(),
                    quantity,
                    height_mm: clamp_dimension(height).map_err(invalid)?,
                    width_mm: clamp_dimension(width).map_err(invalid)?,
                })
            })
            .collect()
    }
}

fn clamp_dimension(value: i64) -> Result<u32, String> {
    u32::try_from(value.max(0)).map_err(|_| format!("dimension {value} exceeds supported range"))
}
