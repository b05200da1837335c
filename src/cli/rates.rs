use super::ui;
use crate::core::currency::{CurrencyConverter, DEFAULT_CURRENCIES};
use crate::core::rates::RateTable;
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};
use rust_decimal::Decimal;

/// Renders the current rate table, one row per currency.
pub fn rates_table(table: &RateTable, storage_currency: &str) -> String {
    let mut output_table = ui::new_styled_table();
    output_table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Per 1 {storage_currency}")),
    ]);
    for (code, rate) in table.iter() {
        output_table.add_row(vec![
            Cell::new(code),
            Cell::new(rate.to_string()).set_alignment(CellAlignment::Right),
        ]);
    }
    output_table.to_string()
}

pub async fn show_rates(converter: &CurrencyConverter) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let table = converter.get_rates().await;
    pb.finish_and_clear();

    match table {
        Some(table) => println!("{}", rates_table(&table, converter.storage_currency())),
        None => {
            println!(
                "{}",
                ui::style_text("Exchange rates are unavailable right now.", ui::StyleType::Error)
            );
            let codes: Vec<&str> = DEFAULT_CURRENCIES.iter().map(|(code, _)| *code).collect();
            println!(
                "{}",
                ui::style_text(
                    &format!("Transactions can still be entered in: {}", codes.join(", ")),
                    ui::StyleType::Subtle
                )
            );
        }
    }
    Ok(())
}

pub async fn convert(converter: &CurrencyConverter, amount: Decimal, currency: &str) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let rate = converter.get_rate_for(currency).await;
    let converted = converter.convert(amount, currency).await;
    pb.finish_and_clear();

    let storage_currency = converter.storage_currency();
    match rate {
        Some(rate) => println!(
            "{amount} {currency} = {} {storage_currency} {}",
            ui::style_text(&format!("{converted:.2}"), ui::StyleType::TotalValue),
            ui::style_text(
                &format!("(1 {storage_currency} = {rate} {currency})"),
                ui::StyleType::Subtle
            ),
        ),
        None => println!(
            "{}",
            ui::style_text(
                &format!("No exchange rate is known for {currency}"),
                ui::StyleType::Error
            )
        ),
    }
    Ok(())
}
