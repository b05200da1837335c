use super::ui;
use crate::core::ledger::Ledger;
use crate::core::transaction::{Category, CategoryId};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

pub fn categories_table(categories: &[Category]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("ID"), ui::header_cell("Name")]);
    for category in categories {
        table.add_row(vec![
            Cell::new(category.id).set_alignment(CellAlignment::Right),
            Cell::new(&category.name),
        ]);
    }
    table.to_string()
}

pub async fn add(ledger: &Ledger, name: &str) -> Result<()> {
    let category = ledger.create_category(name).await?;
    println!("Created category {} ({})", category.name, category.id);
    Ok(())
}

pub async fn list(ledger: &Ledger) -> Result<()> {
    let categories = ledger.categories().await?;
    if categories.is_empty() {
        println!(
            "{}",
            ui::style_text("No categories yet.", ui::StyleType::Subtle)
        );
    } else {
        println!("{}", categories_table(&categories));
    }
    Ok(())
}

pub async fn delete(ledger: &Ledger, id: CategoryId) -> Result<()> {
    let removed = ledger.delete_category(id).await?;
    println!("Deleted category {id} and {removed} transactions filed under it");
    Ok(())
}
