pub mod audit;
pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod flows;

pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use cpq::{CatalogFilter, FormulaError, FormulaRegistry, MaterialFilter, Narrowing};
pub use domain::catalog::{
    CatalogAttribute, CatalogEntry, CatalogEntryId, FormulaId, MeasurementMode,
};
pub use domain::customer::{Customer, CustomerId};
pub use domain::material::{MaterialEntry, MaterialId};
pub use domain::order::{LineItem, Order, OrderId, OrderStatus, PieceDraft, SubOrder};
pub use domain::session::{ContactId, Session};
pub use errors::{DomainError, InterfaceError};
pub use flows::{DialogueState, SessionPhase};
