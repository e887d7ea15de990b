//! Parse-and-validate helpers for inbound replies. Handlers match on the result instead of
//! recovering from panics or sentinel values.

use thiserror::Error;

pub const MAX_ORDER_NAME_CHARS: usize = 60;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("reply is empty")]
    Empty,
    #[error("reply `{0}` is not a whole number")]
    NotANumber(String),
    #[error("value must be positive")]
    NotPositive,
    #[error("option {choice} is outside 1..={options}")]
    OutOfRange { choice: usize, options: usize },
    #[error("reply is longer than {0} characters")]
    TooLong(usize),
}

/// Resolves a 1-based menu reply into a 0-based index into a menu of `options` entries.
pub fn parse_menu_choice(text: &str, options: usize) -> Result<usize, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    let choice = trimmed
        .parse::<usize>()
        .map_err(|_| InputError::NotANumber(trimmed.to_string()))?;
    if choice == 0 || choice > options {
        return Err(InputError::OutOfRange { choice, options });
    }
    Ok(choice - 1)
}

pub fn parse_positive_integer(text: &str) -> Result<u32, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    let value =
        trimmed.parse::<i64>().map_err(|_| InputError::NotANumber(trimmed.to_string()))?;
    if value <= 0 {
        return Err(InputError::NotPositive);
    }
    u32::try_from(value).map_err(|_| InputError::NotANumber(trimmed.to_string()))
}

pub fn parse_order_name(text: &str) -> Result<String, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    if trimmed.chars().count() > MAX_ORDER_NAME_CHARS {
        return Err(InputError::TooLong(MAX_ORDER_NAME_CHARS));
    }
    Ok(trimmed.to_string())
}
