pub mod catalog;
pub mod formula;
pub mod materials;
pub mod pricing;

pub use catalog::{CatalogFilter, Narrowing};
pub use formula::{Formula, FormulaError, FormulaRegistry, PieceTemplate, PieceTransform};
pub use materials::MaterialFilter;
pub use pricing::{billed_area_m2, price_pieces, round_money};
