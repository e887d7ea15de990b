use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{CatalogEntryId, MeasurementMode};
use crate::domain::customer::CustomerId;
use crate::domain::material::MaterialId;
use crate::errors::DomainError;

/// Order identifier in the `YYMMDD_NNNN` form, sequential within a calendar day.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(date: NaiveDate, sequence: u32) -> Self {
        Self(format!("{}_{sequence:04}", Self::date_code(date)))
    }

    pub fn date_code(date: NaiveDate) -> String {
        date.format("%y%m%d").to_string()
    }

    /// Sequence suffix when this id belongs to the day identified by `date_code`.
    pub fn sequence_for(&self, date_code: &str) -> Option<u32> {
        self.0.strip_prefix(date_code)?.strip_prefix('_')?.parse::<u32>().ok()
    }

    /// First id of `today` is `_0001`; otherwise the highest sequence of the day plus one.
    pub fn next_for_day<'a, I>(today: NaiveDate, existing: I) -> Self
    where
        I: IntoIterator<Item = &'a OrderId>,
    {
        let date_code = Self::date_code(today);
        let highest =
            existing.into_iter().filter_map(|id| id.sequence_for(&date_code)).max().unwrap_or(0);
        Self::new(today, highest.saturating_add(1))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Quote,
    Authorized,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Authorized => "authorized",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quote" => Ok(Self::Quote),
            "authorized" => Ok(Self::Authorized),
            "cancelled" => Ok(Self::Cancelled),
            other => {
                Err(DomainError::InvariantViolation(format!("unknown order status `{other}`")))
            }
        }
    }
}

/// A piece to cut, computed by a formula but not yet priced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceDraft {
    pub name: String,
    pub quantity: u32,
    pub height_mm: u32,
    pub width_mm: u32,
}

impl PieceDraft {
    /// The same piece cut for `units` items, or `None` when the count overflows.
    pub fn times(&self, units: u32) -> Option<Self> {
        Some(Self { quantity: self.quantity.checked_mul(units)?, ..self.clone() })
    }
}

/// One priced, dimensioned piece. `unit_price` is the material price per square metre.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub piece_name: String,
    pub quantity: u32,
    pub height_mm: u32,
    pub width_mm: u32,
    pub area_m2: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// A priced configuration accumulated within a session and not yet persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubOrder {
    pub project_id: CatalogEntryId,
    pub project_description: String,
    pub material_id: MaterialId,
    pub material_description: String,
    pub measurement_mode: MeasurementMode,
    pub opening_height_mm: u32,
    pub opening_width_mm: u32,
    pub units: u32,
    pub lines: Vec<LineItem>,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub name: String,
    pub customer_id: CustomerId,
    pub project_description: String,
    pub material_description: String,
    pub measurement_mode: MeasurementMode,
    pub opening_height_mm: u32,
    pub opening_width_mm: u32,
    pub units: u32,
    pub lines: Vec<LineItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub authorized_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn quote_from(
        id: OrderId,
        name: impl Into<String>,
        customer_id: CustomerId,
        sub_order: SubOrder,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            customer_id,
            project_description: sub_order.project_description,
            material_description: sub_order.material_description,
            measurement_mode: sub_order.measurement_mode,
            opening_height_mm: sub_order.opening_height_mm,
            opening_width_mm: sub_order.opening_width_mm,
            units: sub_order.units,
            lines: sub_order.lines,
            total: sub_order.total,
            status: OrderStatus::Quote,
            created_at,
            authorized_at: None,
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self.status, next),
            (OrderStatus::Quote, OrderStatus::Authorized)
                | (OrderStatus::Quote, OrderStatus::Cancelled)
                | (OrderStatus::Authorized, OrderStatus::Cancelled)
        ) || self.status == next
    }

    /// Returns whether the status changed. Re-applying the current status is a no-op.
    pub fn transition_to(
        &mut self,
        next: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        if self.status == next {
            return Ok(false);
        }
        if !self.can_transition_to(next) {
            return Err(DomainError::InvalidOrderTransition { from: self.status, to: next });
        }

        self.status = next;
        if next == OrderStatus::Authorized {
            self.authorized_at = Some(at);
        }
        Ok(true)
    }
}
