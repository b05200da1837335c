//! Filtering transactions and parsing filter parameters from query strings.

use crate::core::error::ValidationErrors;
use crate::core::pagination::PageRequest;
use crate::core::transaction::{CategoryId, Transaction, TransactionType};
use chrono::{Days, NaiveDate};
use std::collections::BTreeSet;
use std::ops::{Bound, RangeBounds};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of the trailing window used by the statistics view.
pub const STATISTICS_WINDOW_DAYS: u64 = 30;

/// A range of calendar dates with independently inclusive/exclusive ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Bound<NaiveDate>,
    pub end: Bound<NaiveDate>,
}

impl Default for DateRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl DateRange {
    pub fn unbounded() -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    /// Both ends inclusive; `None` leaves that end open.
    pub fn inclusive(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            start: start.map_or(Bound::Unbounded, Bound::Included),
            end: end.map_or(Bound::Unbounded, Bound::Included),
        }
    }

    /// Dates strictly after `today - days`, with no upper bound. With
    /// `days = 30` the day exactly thirty days ago is excluded.
    pub fn trailing_days(today: NaiveDate, days: u64) -> Self {
        let start = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        Self {
            start: Bound::Excluded(start),
            end: Bound::Unbounded,
        }
    }

    pub fn contains_date(&self, date: &NaiveDate) -> bool {
        self.contains(date)
    }
}

impl RangeBounds<NaiveDate> for DateRange {
    fn start_bound(&self) -> Bound<&NaiveDate> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&NaiveDate> {
        self.end.as_ref()
    }
}

/// Criteria a transaction must satisfy. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    pub dates: DateRange,
    pub categories: BTreeSet<CategoryId>,
}

impl TransactionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_dates(mut self, dates: DateRange) -> Self {
        self.dates = dates;
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = CategoryId>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    /// The statistics window: everything after `today - 30 days`.
    pub fn statistics_window(today: NaiveDate) -> Self {
        Self::all().with_dates(DateRange::trailing_days(today, STATISTICS_WINDOW_DAYS))
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.kind.is_none_or(|kind| transaction.kind == kind)
            && self.dates.contains_date(&transaction.date)
            && (self.categories.is_empty() || self.categories.contains(&transaction.category_id))
    }
}

/// A filter plus the requested page, as parsed from a listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub filter: TransactionFilter,
    pub page: PageRequest,
}

impl TransactionQuery {
    /// Parses URL-encoded listing parameters:
    /// `transaction_type`, `start_date`, `end_date`, repeated `category`, and
    /// `page`. Unknown parameters are ignored.
    pub fn from_query_string(query: &str) -> Result<Self, ValidationErrors> {
        let query = query.trim_start_matches('?');
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| ValidationErrors::single("query", format!("Malformed query: {e}")))?;

        let mut errors = ValidationErrors::new();
        let mut parsed = TransactionQuery::default();
        let mut start_date = None;
        let mut end_date = None;

        for (key, value) in &pairs {
            let value = value.trim();
            match key.as_str() {
                "transaction_type" => {
                    if value.is_empty() || value.eq_ignore_ascii_case("any") {
                        continue;
                    }
                    match value.parse::<TransactionType>() {
                        Ok(kind) => parsed.filter.kind = Some(kind),
                        Err(_) => errors.add(
                            "transaction_type",
                            format!(
                                "Select a valid choice. {value} is not one of the available choices."
                            ),
                        ),
                    }
                }
                "start_date" | "end_date" => {
                    if value.is_empty() {
                        continue;
                    }
                    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
                        Ok(date) if key == "start_date" => start_date = Some(date),
                        Ok(date) => end_date = Some(date),
                        Err(_) => errors.add(key, "Enter a valid date."),
                    }
                }
                "category" => {
                    if value.is_empty() {
                        continue;
                    }
                    match value.parse::<u64>() {
                        Ok(id) => {
                            parsed.filter.categories.insert(CategoryId(id));
                        }
                        Err(_) => errors.add("category", format!("\"{value}\" is not a valid value.")),
                    }
                }
                "page" => match value.parse::<PageRequest>() {
                    Ok(page) => parsed.page = page,
                    Err(e) => errors.add("page", e.to_string()),
                },
                _ => {}
            }
        }

        parsed.filter.dates = DateRange::inclusive(start_date, end_date);
        errors.into_result().map(|_| parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::{TransactionId, UserId};
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(kind: TransactionType, category: u64, on: NaiveDate) -> Transaction {
        Transaction {
            id: TransactionId(1),
            user: UserId::from("alice"),
            category_id: CategoryId(category),
            kind,
            amount: Decimal::ONE,
            currency: "EUR".to_string(),
            amount_in_storage_currency: Decimal::ONE,
            date: on,
        }
    }

    #[test]
    fn test_trailing_window_excludes_boundary_day() {
        let today = date(2024, 3, 31);
        let window = DateRange::trailing_days(today, 30);

        assert!(!window.contains_date(&date(2024, 3, 1)));
        assert!(window.contains_date(&date(2024, 3, 2)));
        assert!(window.contains_date(&today));
        // No upper bound.
        assert!(window.contains_date(&date(2024, 4, 15)));
    }

    #[test]
    fn test_inclusive_range() {
        let range = DateRange::inclusive(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)));
        assert!(range.contains_date(&date(2024, 1, 1)));
        assert!(range.contains_date(&date(2024, 1, 31)));
        assert!(!range.contains_date(&date(2024, 2, 1)));
        assert!(DateRange::inclusive(None, None).contains_date(&date(1999, 1, 1)));
    }

    #[test]
    fn test_filter_matches() {
        let on = date(2024, 2, 10);
        let filter = TransactionFilter::all()
            .with_kind(TransactionType::Expense)
            .with_categories([CategoryId(1), CategoryId(3)]);

        assert!(filter.matches(&tx(TransactionType::Expense, 1, on)));
        assert!(!filter.matches(&tx(TransactionType::Income, 1, on)));
        assert!(!filter.matches(&tx(TransactionType::Expense, 2, on)));
        assert!(TransactionFilter::all().matches(&tx(TransactionType::Income, 9, on)));
    }

    #[test]
    fn test_parse_full_query() {
        let query = TransactionQuery::from_query_string(
            "?transaction_type=Expense&start_date=2024-01-01&end_date=2024-01-31&category=2&category=5&page=3",
        )
        .unwrap();

        assert_eq!(query.filter.kind, Some(TransactionType::Expense));
        assert_eq!(
            query.filter.dates,
            DateRange::inclusive(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)))
        );
        assert_eq!(
            query.filter.categories,
            BTreeSet::from([CategoryId(2), CategoryId(5)])
        );
        assert_eq!(query.page, PageRequest::Number(3));
    }

    #[test]
    fn test_parse_empty_and_any_values() {
        let query =
            TransactionQuery::from_query_string("transaction_type=Any&start_date=&category=")
                .unwrap();
        assert_eq!(query, TransactionQuery::default());
        assert_eq!(
            TransactionQuery::from_query_string("").unwrap(),
            TransactionQuery::default()
        );
        assert_eq!(
            TransactionQuery::from_query_string("page=last").unwrap().page,
            PageRequest::Last
        );
    }

    #[test]
    fn test_parse_reports_every_bad_field() {
        let errors = TransactionQuery::from_query_string(
            "transaction_type=transfer&start_date=2024-13-01&category=abc&page=zero",
        )
        .unwrap_err();

        assert!(errors.get("transaction_type").is_some());
        assert_eq!(
            errors.get("start_date").unwrap(),
            ["Enter a valid date.".to_string()]
        );
        assert!(errors.get("category").is_some());
        assert!(errors.get("page").is_some());
        assert!(errors.get("end_date").is_none());
    }
}
