use super::ui;
use crate::core::analytics::StatisticsSnapshot;
use crate::core::filter::DateRange;
use crate::core::ledger::Ledger;
use crate::core::transaction::UserId;
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use std::ops::Bound;

fn window_title(window: &DateRange) -> String {
    let first_day = match window.start {
        Bound::Included(day) => Some(day),
        Bound::Excluded(day) => day.succ_opt(),
        Bound::Unbounded => None,
    };
    match first_day {
        Some(day) => format!("Last 30 days (since {day})"),
        None => "All time".to_string(),
    }
}

pub fn statistics_view(snapshot: &StatisticsSnapshot, storage_currency: &str) -> String {
    let mut output = format!(
        "{}\n{}\n{}\n",
        ui::style_text(&window_title(&snapshot.window), ui::StyleType::Title),
        ui::total_line("Income", snapshot.total_income, storage_currency),
        ui::total_line("Expenses", snapshot.total_expense, storage_currency),
    );

    if snapshot.by_category.is_empty() {
        output.push_str(&ui::style_text(
            "\nNo expenses in this period.",
            ui::StyleType::Subtle,
        ));
        return output;
    }

    let mut by_category = ui::new_styled_table();
    by_category.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell(&format!("Spent ({storage_currency})")),
    ]);
    for sum in &snapshot.by_category {
        by_category.add_row(vec![Cell::new(&sum.name), ui::amount_cell(sum.total)]);
    }

    let mut by_day = ui::new_styled_table();
    by_day.set_header(vec![
        ui::header_cell("Day"),
        ui::header_cell(&format!("Spent ({storage_currency})")),
    ]);
    for sum in &snapshot.by_day {
        by_day.add_row(vec![Cell::new(sum.date), ui::amount_cell(sum.total)]);
    }

    output.push_str(&format!("\n{by_category}\n\n{by_day}"));
    output
}

pub async fn run(ledger: &Ledger, user: &UserId, today: NaiveDate) -> Result<()> {
    let snapshot = ledger.statistics(user, today).await?;
    println!(
        "{}",
        statistics_view(&snapshot, ledger.converter().storage_currency())
    );
    Ok(())
}
