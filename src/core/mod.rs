//! Core bookkeeping logic, independent of the terminal and of any one store

pub mod analytics;
pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod log;
pub mod pagination;
pub mod rates;
pub mod transaction;

// Re-export main types for cleaner imports
pub use cache::RateCache;
pub use currency::CurrencyConverter;
pub use error::{LedgerError, ValidationErrors};
pub use ledger::Ledger;
pub use rates::{RateFetcher, RateTable};
pub use transaction::{
    Category, CategoryId, Transaction, TransactionDraft, TransactionId, TransactionType, UserId,
};
