use super::ui;
use crate::core::analytics::Totals;
use crate::core::error::ValidationErrors;
use crate::core::filter::TransactionQuery;
use crate::core::ledger::{Ledger, Overview, TransactionListing};
use crate::core::pagination::Page;
use crate::core::transaction::{Category, CategoryId, Transaction, TransactionDraft, TransactionId, UserId};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};
use std::collections::HashMap;

fn category_names(categories: &[Category]) -> HashMap<CategoryId, &str> {
    categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect()
}

/// Renders one page of transactions with a footer naming the page.
pub fn transactions_table(
    page: &Page<Transaction>,
    categories: &[Category],
    storage_currency: &str,
) -> String {
    let names = category_names(categories);
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Date"),
        ui::header_cell("Type"),
        ui::header_cell("Category"),
        ui::header_cell("Amount"),
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Amount ({storage_currency})")),
    ]);

    for tx in &page.items {
        let category = names
            .get(&tx.category_id)
            .map_or_else(|| format!("#{}", tx.category_id), |name| name.to_string());
        table.add_row(vec![
            Cell::new(tx.id).set_alignment(CellAlignment::Right),
            Cell::new(tx.date),
            ui::kind_cell(tx.kind),
            Cell::new(category),
            ui::amount_cell(tx.amount),
            Cell::new(&tx.currency),
            ui::amount_cell(tx.amount_in_storage_currency),
        ]);
    }

    let mut output = table.to_string();
    let footer = if page.total_items == 0 {
        "No transactions".to_string()
    } else {
        format!(
            "Showing {}-{} of {} (page {} of {})",
            page.start_index(),
            page.end_index(),
            page.total_items,
            page.number,
            page.total_pages
        )
    };
    output.push('\n');
    output.push_str(&ui::style_text(&footer, ui::StyleType::Subtle));
    output
}

fn totals_block(title: &str, totals: &Totals, storage_currency: &str) -> String {
    [
        ui::style_text(title, ui::StyleType::Title),
        ui::total_line("Income", totals.income, storage_currency),
        ui::total_line("Expenses", totals.expense, storage_currency),
        ui::total_line("Net", totals.net(), storage_currency),
    ]
    .join("\n")
}

pub fn listing_view(listing: &TransactionListing, categories: &[Category], storage_currency: &str) -> String {
    format!(
        "{}\n\n{}",
        transactions_table(&listing.page, categories, storage_currency),
        totals_block("Filtered totals", &listing.totals, storage_currency)
    )
}

pub fn overview_view(overview: &Overview, categories: &[Category], storage_currency: &str) -> String {
    format!(
        "{}\n\n{}\n\n{}",
        totals_block("All transactions", &overview.overall, storage_currency),
        transactions_table(&overview.page, categories, storage_currency),
        totals_block("Filtered totals", &overview.filtered, storage_currency)
    )
}

fn parse_query(query: Option<&str>) -> Result<TransactionQuery, ValidationErrors> {
    TransactionQuery::from_query_string(query.unwrap_or_default())
}

pub async fn add(ledger: &Ledger, user: &UserId, draft: TransactionDraft) -> Result<()> {
    let pb = ui::new_spinner("Converting amount...");
    let result = ledger.create_transaction(user, draft).await;
    pb.finish_and_clear();

    let tx = result?;
    println!(
        "Transaction {} was added successfully! ({} {})",
        tx.id,
        tx.amount_in_storage_currency,
        ledger.converter().storage_currency()
    );
    Ok(())
}

pub async fn edit(ledger: &Ledger, user: &UserId, id: TransactionId, draft: TransactionDraft) -> Result<()> {
    let pb = ui::new_spinner("Converting amount...");
    let result = ledger.update_transaction(user, id, draft).await;
    pb.finish_and_clear();

    let tx = result?;
    println!(
        "Transaction {} was updated successfully! ({} {})",
        tx.id,
        tx.amount_in_storage_currency,
        ledger.converter().storage_currency()
    );
    Ok(())
}

pub async fn show(ledger: &Ledger, user: &UserId, id: TransactionId) -> Result<()> {
    let tx = ledger.transaction(user, id).await?;
    let categories = ledger.categories().await?;
    let page = Page {
        items: vec![tx],
        number: 1,
        page_size: 1,
        total_items: 1,
        total_pages: 1,
    };
    println!(
        "{}",
        transactions_table(&page, &categories, ledger.converter().storage_currency())
    );
    Ok(())
}

pub async fn delete(ledger: &Ledger, user: &UserId, id: TransactionId) -> Result<()> {
    let tx = ledger.delete_transaction(user, id).await?;
    println!(
        "Transaction of {} {} on {} was deleted successfully!",
        tx.amount_in_storage_currency,
        ledger.converter().storage_currency(),
        tx.date
    );
    Ok(())
}

pub async fn list(ledger: &Ledger, user: &UserId, query: Option<&str>) -> Result<()> {
    let query = parse_query(query)?;
    let listing = ledger.list_transactions(user, &query).await?;
    let categories = ledger.categories().await?;
    println!(
        "{}",
        listing_view(&listing, &categories, ledger.converter().storage_currency())
    );
    Ok(())
}

pub async fn overview(ledger: &Ledger, user: &UserId, query: Option<&str>) -> Result<()> {
    let query = parse_query(query)?;
    let overview = ledger.overview(user, &query).await?;
    let categories = ledger.categories().await?;
    println!(
        "{}",
        overview_view(&overview, &categories, ledger.converter().storage_currency())
    );
    Ok(())
}
