//! Transactions, categories and the input drafts they are created from.

use crate::core::error::ValidationErrors;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Largest accepted amount: ten digits with two decimal places.
const MAX_AMOUNT_INTEGER_DIGITS: u32 = 8;
const MAX_AMOUNT_DECIMAL_PLACES: u32 = 2;
const MAX_CATEGORY_NAME_LEN: usize = 50;
const MAX_CURRENCY_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub u64);

impl Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        })
    }
}

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(anyhow::anyhow!("Invalid transaction type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Trims a category name and checks it is usable.
pub fn clean_category_name(name: &str) -> Result<String, ValidationErrors> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationErrors::single("name", "This field is required."));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(ValidationErrors::single(
            "name",
            format!("Ensure this value has at most {MAX_CATEGORY_NAME_LEN} characters."),
        ));
    }
    Ok(name.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user: UserId,
    pub category_id: CategoryId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    /// Derived from `amount` and `currency` when the row is written.
    pub amount_in_storage_currency: Decimal,
    pub date: NaiveDate,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }
}

/// A transaction ready to be stored, lacking only its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user: UserId,
    pub category_id: CategoryId,
    pub kind: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub amount_in_storage_currency: Decimal,
    pub date: NaiveDate,
}

impl NewTransaction {
    pub fn with_id(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            user: self.user,
            category_id: self.category_id,
            kind: self.kind,
            amount: self.amount,
            currency: self.currency,
            amount_in_storage_currency: self.amount_in_storage_currency,
            date: self.date,
        }
    }
}

/// User-entered fields of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub kind: TransactionType,
    pub category_id: CategoryId,
    pub amount: Decimal,
    pub currency: String,
    pub date: NaiveDate,
}

impl TransactionDraft {
    /// Checks the fields that can be validated without the store. Category
    /// existence is checked by the ledger.
    pub fn validate(&self, currency_choices: &[String]) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if self.amount <= Decimal::ZERO {
            errors.add("amount", "Amount must be a positive number.");
        }
        if self.amount.normalize().scale() > MAX_AMOUNT_DECIMAL_PLACES {
            errors.add(
                "amount",
                format!("Ensure that there are no more than {MAX_AMOUNT_DECIMAL_PLACES} decimal places."),
            );
        }
        if self.amount.abs().trunc() >= Decimal::from(10u64.pow(MAX_AMOUNT_INTEGER_DIGITS)) {
            errors.add(
                "amount",
                format!(
                    "Ensure that there are no more than {MAX_AMOUNT_INTEGER_DIGITS} digits before the decimal point."
                ),
            );
        }

        let currency = self.currency.trim();
        if currency.is_empty() {
            errors.add("currency", "This field is required.");
        } else if currency.len() > MAX_CURRENCY_LEN
            || !currency_choices.iter().any(|c| c == currency)
        {
            errors.add(
                "currency",
                format!("Select a valid choice. {currency} is not one of the available choices."),
            );
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft(amount: Decimal, currency: &str) -> TransactionDraft {
        TransactionDraft {
            kind: TransactionType::Expense,
            category_id: CategoryId(1),
            amount,
            currency: currency.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    fn choices() -> Vec<String> {
        vec!["EUR".to_string(), "USD".to_string()]
    }

    #[test]
    fn test_transaction_type_parsing() {
        assert_eq!(
            "Income".parse::<TransactionType>().unwrap(),
            TransactionType::Income
        );
        assert_eq!(
            " EXPENSE ".parse::<TransactionType>().unwrap(),
            TransactionType::Expense
        );
        assert!("transfer".parse::<TransactionType>().is_err());
        assert_eq!(TransactionType::Expense.to_string(), "expense");
    }

    #[test]
    fn test_valid_draft() {
        assert!(draft(dec!(12.50), "USD").validate(&choices()).is_empty());
        assert!(draft(dec!(99999999.99), "EUR").validate(&choices()).is_empty());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        for amount in [dec!(0), dec!(-5)] {
            let errors = draft(amount, "USD").validate(&choices());
            assert_eq!(
                errors.get("amount").unwrap(),
                ["Amount must be a positive number.".to_string()]
            );
        }
    }

    #[test]
    fn test_amount_shape_rejected() {
        let errors = draft(dec!(1.005), "USD").validate(&choices());
        assert!(errors.get("amount").unwrap()[0].contains("2 decimal places"));

        let errors = draft(dec!(100000000), "USD").validate(&choices());
        assert!(errors.get("amount").unwrap()[0].contains("8 digits"));

        // Trailing zeros do not count as decimal places.
        assert!(draft(dec!(1.500), "USD").validate(&choices()).is_empty());
    }

    #[test]
    fn test_currency_must_be_offered() {
        let errors = draft(dec!(1), "GBP").validate(&choices());
        assert_eq!(
            errors.get("currency").unwrap(),
            ["Select a valid choice. GBP is not one of the available choices.".to_string()]
        );

        let errors = draft(dec!(1), "  ").validate(&choices());
        assert_eq!(
            errors.get("currency").unwrap(),
            ["This field is required.".to_string()]
        );
    }

    #[test]
    fn test_clean_category_name() {
        assert_eq!(clean_category_name("  Food ").unwrap(), "Food");
        assert!(clean_category_name("   ").is_err());
        assert!(clean_category_name(&"x".repeat(51)).is_err());
        assert!(clean_category_name(&"x".repeat(50)).is_ok());
    }

    #[test]
    fn test_transaction_serializes_type_field() {
        let tx = draft(dec!(3), "EUR");
        let stored = NewTransaction {
            user: UserId::from("alice"),
            category_id: tx.category_id,
            kind: tx.kind,
            amount: tx.amount,
            currency: tx.currency,
            amount_in_storage_currency: dec!(3),
            date: tx.date,
        }
        .with_id(TransactionId(4));

        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["date"], "2024-05-01");
        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, stored);
    }
}
