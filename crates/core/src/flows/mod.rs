pub mod input;
pub mod states;

pub use input::{parse_menu_choice, parse_order_name, parse_positive_integer, InputError};
pub use states::{DialogueState, ExpectedInput, MeasurementField, SessionPhase};
