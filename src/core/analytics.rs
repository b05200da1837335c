//! Aggregations over a user's transactions.
//!
//! Everything here is a pure function of the rows it is given; the ledger
//! fetches the rows from the store.
use crate::core::filter::{DateRange, TransactionFilter};
use crate::core::transaction::{Category, CategoryId, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Income and expense sums in the storage currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
}

impl Totals {
    pub fn net(&self) -> Decimal {
        self.income - self.expense
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySum {
    pub category_id: CategoryId,
    pub name: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySum {
    pub date: NaiveDate,
    pub total: Decimal,
}

/// Aggregates for one filter, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub window: DateRange,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    /// Expense sums per category, ordered by category id.
    pub by_category: Vec<CategorySum>,
    /// Expense sums per day, oldest first.
    pub by_day: Vec<DaySum>,
}

impl StatisticsSnapshot {
    pub fn totals(&self) -> Totals {
        Totals {
            income: self.total_income,
            expense: self.total_expense,
        }
    }
}

/// Sums income and expense. Zero when there are no rows.
pub fn totals<'a>(rows: impl IntoIterator<Item = &'a Transaction>) -> Totals {
    rows.into_iter().fold(Totals::default(), |mut acc, tx| {
        if tx.is_income() {
            acc.income += tx.amount_in_storage_currency;
        } else {
            acc.expense += tx.amount_in_storage_currency;
        }
        acc
    })
}

/// Expense sums per category for every category with at least one expense.
pub fn expenses_by_category<'a>(
    rows: impl IntoIterator<Item = &'a Transaction>,
    categories: &[Category],
) -> Vec<CategorySum> {
    let names: HashMap<CategoryId, &str> = categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    let mut sums: BTreeMap<CategoryId, Decimal> = BTreeMap::new();
    for tx in rows.into_iter().filter(|tx| tx.is_expense()) {
        *sums.entry(tx.category_id).or_default() += tx.amount_in_storage_currency;
    }

    sums.into_iter()
        .map(|(category_id, total)| CategorySum {
            category_id,
            name: names
                .get(&category_id)
                .map_or_else(|| format!("#{category_id}"), |name| name.to_string()),
            total,
        })
        .collect()
}

/// Expense sums per calendar day, ascending.
pub fn expenses_by_day<'a>(rows: impl IntoIterator<Item = &'a Transaction>) -> Vec<DaySum> {
    let mut sums: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for tx in rows.into_iter().filter(|tx| tx.is_expense()) {
        *sums.entry(tx.date).or_default() += tx.amount_in_storage_currency;
    }
    sums.into_iter()
        .map(|(date, total)| DaySum { date, total })
        .collect()
}

/// Builds the full snapshot from the rows matching `filter`.
pub fn snapshot(
    rows: &[Transaction],
    categories: &[Category],
    filter: &TransactionFilter,
) -> StatisticsSnapshot {
    let matching: Vec<&Transaction> = rows.iter().filter(|tx| filter.matches(tx)).collect();
    debug!(
        "Aggregating {} of {} transactions",
        matching.len(),
        rows.len()
    );

    let totals = totals(matching.iter().copied());
    StatisticsSnapshot {
        window: filter.dates,
        total_income: totals.income,
        total_expense: totals.expense,
        by_category: expenses_by_category(matching.iter().copied(), categories),
        by_day: expenses_by_day(matching.iter().copied()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::{TransactionId, TransactionType, UserId};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(id: u64, kind: TransactionType, category: u64, amount: Decimal, on: NaiveDate) -> Transaction {
        Transaction {
            id: TransactionId(id),
            user: UserId::from("alice"),
            category_id: CategoryId(category),
            kind,
            amount,
            currency: "EUR".to_string(),
            amount_in_storage_currency: amount,
            date: on,
        }
    }

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: CategoryId(1),
                name: "Food".to_string(),
            },
            Category {
                id: CategoryId(2),
                name: "Rent".to_string(),
            },
        ]
    }

    #[test]
    fn test_no_rows_gives_zeros() {
        let snapshot = snapshot(&[], &categories(), &TransactionFilter::all());

        assert_eq!(snapshot.total_income, Decimal::ZERO);
        assert_eq!(snapshot.total_expense, Decimal::ZERO);
        assert!(snapshot.by_category.is_empty());
        assert!(snapshot.by_day.is_empty());
        assert_eq!(snapshot.totals().net(), Decimal::ZERO);
    }

    #[test]
    fn test_grouped_sums_are_ordered() {
        use TransactionType::*;
        // Inserted out of order on purpose.
        let rows = vec![
            tx(1, Expense, 2, dec!(3), date(2024, 3, 12)),
            tx(2, Expense, 1, dec!(10), date(2024, 3, 10)),
            tx(3, Expense, 1, dec!(5), date(2024, 3, 11)),
            tx(4, Income, 1, dec!(1000), date(2024, 3, 10)),
        ];

        let snapshot = snapshot(&rows, &categories(), &TransactionFilter::all());

        assert_eq!(
            snapshot.by_category,
            vec![
                CategorySum {
                    category_id: CategoryId(1),
                    name: "Food".to_string(),
                    total: dec!(15),
                },
                CategorySum {
                    category_id: CategoryId(2),
                    name: "Rent".to_string(),
                    total: dec!(3),
                },
            ]
        );
        assert_eq!(
            snapshot.by_day,
            vec![
                DaySum {
                    date: date(2024, 3, 10),
                    total: dec!(10),
                },
                DaySum {
                    date: date(2024, 3, 11),
                    total: dec!(5),
                },
                DaySum {
                    date: date(2024, 3, 12),
                    total: dec!(3),
                },
            ]
        );
        assert_eq!(snapshot.total_income, dec!(1000));
        assert_eq!(snapshot.total_expense, dec!(18));
    }

    #[test]
    fn test_same_day_expenses_are_summed() {
        let on = date(2024, 3, 10);
        let rows = vec![
            tx(1, TransactionType::Expense, 1, dec!(2.25), on),
            tx(2, TransactionType::Expense, 2, dec!(0.75), on),
        ];
        assert_eq!(
            expenses_by_day(&rows),
            vec![DaySum {
                date: on,
                total: dec!(3.00),
            }]
        );
    }

    #[test]
    fn test_thirty_day_window_boundary() {
        let today = date(2024, 6, 30);
        let rows = vec![
            tx(1, TransactionType::Expense, 1, dec!(7), date(2024, 5, 31)), // today - 30
            tx(2, TransactionType::Expense, 1, dec!(4), date(2024, 6, 1)),  // today - 29
            tx(3, TransactionType::Income, 2, dec!(50), date(2024, 5, 31)),
        ];

        let snapshot = snapshot(
            &rows,
            &categories(),
            &TransactionFilter::statistics_window(today),
        );

        assert_eq!(snapshot.total_expense, dec!(4));
        assert_eq!(snapshot.total_income, Decimal::ZERO);
        assert_eq!(snapshot.by_day.len(), 1);
        assert_eq!(snapshot.by_day[0].date, date(2024, 6, 1));
    }

    #[test]
    fn test_unknown_category_name_falls_back_to_id() {
        let rows = vec![tx(1, TransactionType::Expense, 9, dec!(1), date(2024, 1, 1))];
        let sums = expenses_by_category(&rows, &categories());
        assert_eq!(sums[0].name, "#9");
    }
}
