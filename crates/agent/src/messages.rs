//! Customer-facing texts. Every prompt the engine or supervisor sends is built here.

use rust_decimal::Decimal;

use cutquote_core::domain::catalog::{CatalogAttribute, MeasurementMode};
use cutquote_core::domain::order::{Order, PieceDraft, SubOrder};
use cutquote_core::flows::MeasurementField;

pub const SERVICE_MENU: [&str; 2] = ["Request a quote", "Check my quotes"];
pub const MEASUREMENT_MENU: [&str; 2] = ["Final measurement", "Opening measurement"];
pub const ADD_MORE_MENU: [&str; 3] = ["Add another item", "Finish order", "Cancel"];
pub const AUTHORIZATION_MENU: [&str; 3] =
    ["Authorize production", "Keep as quote", "Cancel order"];

pub const NOT_REGISTERED: &str = "Your number is not registered with us. Please ask a sales \
     representative to register it before requesting a quote.";
pub const CATALOG_EXHAUSTED: &str = "We have no products matching these choices. Nothing is \
     pending; send any message to start again.";
pub const FORMULA_FAILED: &str =
    "We could not compute the pieces for this project. Let's restart the configuration.";
pub const ORDER_CANCELLED: &str = "Order cancelled. Nothing was saved.";
pub const NAME_IN_USE: &str = "That name is already used by another order. Choose another name:";
pub const COMMIT_FAILED: &str = "We could not save your order right now. Your items are kept; \
     send the order name again to retry.";
pub const STATUS_UPDATE_FAILED: &str =
    "We could not update your order right now. Please choose an option again.";
pub const DATA_UNAVAILABLE: &str =
    "Our product data is temporarily unavailable. Please send your answer again in a moment.";
pub const FAREWELL: &str = "Thank you! Send any message whenever you need a new quote.";
pub const INACTIVITY_CLOSED: &str =
    "This conversation was closed due to inactivity. Send any message to start again.";

pub fn render_menu(title: &str, options: &[String]) -> String {
    let mut text = title.to_string();
    for (index, option) in options.iter().enumerate() {
        text.push_str(&format!("\n{}. {option}", index + 1));
    }
    text
}

pub fn options(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| label.to_string()).collect()
}

pub fn greeting(customer_name: &str) -> String {
    format!("Hello, {customer_name}! How can we help you today?")
}

pub fn measurement_title() -> &'static str {
    "How did you take the measurements?"
}

pub fn measurement_confirmation(mode: MeasurementMode) -> String {
    match mode {
        MeasurementMode::Final => "You chose final measurements.".to_string(),
        MeasurementMode::Opening => "You chose opening measurements.".to_string(),
    }
}

pub fn catalog_title(attribute: CatalogAttribute) -> String {
    format!("Choose the {}:", attribute.label())
}

pub fn candidates_title() -> &'static str {
    "More than one project matches. Choose the one you want:"
}

pub fn field_prompt(field: MeasurementField, mode: Option<MeasurementMode>) -> String {
    let mode = mode.map(|mode| format!(" ({mode})")).unwrap_or_default();
    match field {
        MeasurementField::Height => format!("Enter the height in millimetres{mode}:"),
        MeasurementField::Width => format!("Enter the width in millimetres{mode}:"),
        MeasurementField::Quantity => "How many units of this project do you need?".to_string(),
    }
}

pub fn field_reask(field: MeasurementField) -> &'static str {
    match field {
        MeasurementField::Height => {
            "Invalid height. Send a whole number of millimetres greater than zero."
        }
        MeasurementField::Width => {
            "Invalid width. Send a whole number of millimetres greater than zero."
        }
        MeasurementField::Quantity => "Invalid quantity. Send a whole number greater than zero.",
    }
}

pub fn piece_breakdown(
    project: &str,
    height_mm: u32,
    width_mm: u32,
    pieces: &[PieceDraft],
) -> String {
    let mut text = format!("{project}\nOpening: {height_mm} x {width_mm} mm\nPieces per unit:");
    for piece in pieces {
        text.push_str(&format!(
            "\n{} pcs - {} - {} x {}",
            piece.quantity, piece.name, piece.height_mm, piece.width_mm
        ));
    }
    text
}

pub fn color_title() -> &'static str {
    "Choose the glass colour:"
}

pub fn thickness_title(color: &str) -> String {
    format!("Choose the thickness for {color}:")
}

pub fn treatment_title() -> &'static str {
    "Choose the treatment:"
}

pub fn sub_order_summary(sub_order: &SubOrder) -> String {
    let mut text = format!(
        "{} - {}\n{} unit(s) of {} x {} mm",
        sub_order.project_description,
        sub_order.material_description,
        sub_order.units,
        sub_order.opening_height_mm,
        sub_order.opening_width_mm
    );
    for line in &sub_order.lines {
        text.push_str(&format!(
            "\n{} pcs {} - {} x {} - {} m² - {}",
            line.quantity,
            line.piece_name,
            line.height_mm,
            line.width_mm,
            line.area_m2,
            money(line.total)
        ));
    }
    text.push_str(&format!("\nItem total: {}", money(sub_order.total)));
    text
}

pub fn add_more_title() -> &'static str {
    "What would you like to do next?"
}

pub fn order_name_prompt() -> &'static str {
    "Give this order a name (up to 60 characters):"
}

pub fn order_name_reask() -> &'static str {
    "Invalid name. Send a name between 1 and 60 characters:"
}

pub fn order_saved(name: &str, orders: &[Order]) -> String {
    let ids: Vec<&str> = orders.iter().map(|order| order.id.0.as_str()).collect();
    let total = orders.iter().fold(Decimal::ZERO, |sum, order| sum + order.total);
    format!(
        "Order \"{name}\" saved as a quote.\nOrder numbers: {}\nTotal: {}",
        ids.join(", "),
        money(total)
    )
}

pub fn authorization_title() -> &'static str {
    "Do you want to authorize production?"
}

pub fn authorized(name: &str) -> String {
    format!("Order \"{name}\" is authorized for production.")
}

pub fn kept_as_quote(name: &str) -> String {
    format!("Order \"{name}\" was kept as a quote.")
}

pub fn cancelled(name: &str) -> String {
    format!("Order \"{name}\" was cancelled.")
}

pub fn quote_listing(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "You have no quotes yet.".to_string();
    }
    let mut text = "Your quotes:".to_string();
    for order in orders {
        text.push_str(&format!(
            "\n{} - {} - {} - {}",
            order.id,
            order.name,
            order.status,
            money(order.total)
        ));
    }
    text
}

pub fn inactivity_warning(last_prompt: &str) -> String {
    format!("Are you still there? The conversation will close soon.\n{last_prompt}")
}

pub fn money(amount: Decimal) -> String {
    format!("$ {:.2}", amount)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use cutquote_core::domain::catalog::MeasurementMode;
    use cutquote_core::flows::MeasurementField;

    use super::{field_prompt, money, options, render_menu, SERVICE_MENU};

    #[test]
    fn menus_are_numbered_from_one() {
        let text = render_menu("Hello", &options(&SERVICE_MENU));
        assert_eq!(text, "Hello\n1. Request a quote\n2. Check my quotes");
    }

    #[test]
    fn field_prompts_name_the_measurement_mode() {
        let prompt = field_prompt(MeasurementField::Height, Some(MeasurementMode::Opening));
        assert_eq!(prompt, "Enter the height in millimetres (opening):");
    }

    #[test]
    fn money_always_shows_cents() {
        assert_eq!(money(Decimal::new(720, 0)), "$ 720.00");
        assert_eq!(money(Decimal::new(24_690, 2)), "$ 246.90");
    }
}
