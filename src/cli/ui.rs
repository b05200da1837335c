use crate::core::currency::round_money;
use crate::core::error::ValidationErrors;
use crate::core::transaction::TransactionType;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Negative,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Negative => style(text).red().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right-aligned money cell with two decimal places.
pub fn amount_cell(value: Decimal) -> Cell {
    Cell::new(format!("{:.2}", round_money(value))).set_alignment(CellAlignment::Right)
}

/// Transaction type, green for income and red for expenses.
pub fn kind_cell(kind: TransactionType) -> Cell {
    let color = match kind {
        TransactionType::Income => Color::Green,
        TransactionType::Expense => Color::Red,
    };
    Cell::new(kind.to_string()).fg(color)
}

/// Formats a labelled total, red when negative.
pub fn total_line(label: &str, value: Decimal, currency: &str) -> String {
    let style_type = if value.is_sign_negative() && !value.is_zero() {
        StyleType::Negative
    } else {
        StyleType::TotalValue
    };
    format!(
        "{} ({}): {}",
        style_text(label, StyleType::TotalLabel),
        currency,
        style_text(&format!("{:.2}", round_money(value)), style_type)
    )
}

/// One line per field error.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .fields()
        .flat_map(|(field, messages)| {
            messages
                .iter()
                .map(move |m| format!("  {}: {}", style_text(field, StyleType::TotalLabel), m))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Creates a spinner shown while waiting on the network.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
