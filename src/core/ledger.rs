//! Per-user bookkeeping on top of a [`TransactionStore`].
//!
//! The ledger validates input, converts amounts into the storage currency
//! before they are written and answers the listing and statistics views.

use crate::core::analytics::{self, StatisticsSnapshot, Totals};
use crate::core::currency::CurrencyConverter;
use crate::core::error::{LedgerError, ValidationErrors};
use crate::core::filter::{TransactionFilter, TransactionQuery};
use crate::core::pagination::{Page, paginate};
use crate::core::transaction::{
    Category, CategoryId, NewTransaction, Transaction, TransactionDraft, TransactionId, UserId,
    clean_category_name,
};
use crate::store::TransactionStore;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

const INVALID_CATEGORY: &str =
    "Select a valid choice. That choice is not one of the available choices.";

pub type LedgerResult<T> = Result<T, LedgerError>;

/// One page of a filtered listing together with the totals of the whole
/// filtered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionListing {
    pub page: Page<Transaction>,
    pub totals: Totals,
}

/// Dashboard view: totals over everything the user owns, totals over the
/// filtered set, and one page of the filtered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    pub overall: Totals,
    pub filtered: Totals,
    pub page: Page<Transaction>,
}

pub struct Ledger {
    store: Arc<dyn TransactionStore>,
    converter: CurrencyConverter,
    page_size: usize,
}

impl Ledger {
    pub fn new(store: Arc<dyn TransactionStore>, converter: CurrencyConverter, page_size: usize) -> Self {
        Self {
            store,
            converter,
            page_size: page_size.max(1),
        }
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    pub async fn create_category(&self, name: &str) -> LedgerResult<Category> {
        let name = clean_category_name(name)?;
        self.store.create_category(&name).await?.ok_or_else(|| {
            LedgerError::Validation(ValidationErrors::single(
                "name",
                "Category with this Name already exists.",
            ))
        })
    }

    pub async fn categories(&self) -> LedgerResult<Vec<Category>> {
        Ok(self.store.categories().await?)
    }

    /// Removes a category and, with it, every transaction filed under it.
    pub async fn delete_category(&self, id: CategoryId) -> LedgerResult<usize> {
        let removed = self
            .store
            .delete_category(id)
            .await?
            .ok_or(LedgerError::CategoryNotFound(id))?;
        if removed > 0 {
            warn!(
                category = %id,
                "Deleting category also deleted {} transactions", removed
            );
        } else {
            info!("Deleted category {}", id);
        }
        Ok(removed)
    }

    /// Checks a draft, including that its category exists. All problems are
    /// reported together.
    async fn validate(&self, draft: &TransactionDraft) -> LedgerResult<()> {
        let choices = self.converter.currency_choices().await;
        let mut errors = draft.validate(&choices);
        if self.store.category(draft.category_id).await?.is_none() {
            errors.add("category", INVALID_CATEGORY);
        }
        Ok(errors.into_result()?)
    }

    pub async fn create_transaction(
        &self,
        user: &UserId,
        draft: TransactionDraft,
    ) -> LedgerResult<Transaction> {
        self.validate(&draft).await?;

        let currency = draft.currency.trim().to_string();
        let amount_in_storage_currency = self.converter.convert(draft.amount, &currency).await;
        let transaction = self
            .store
            .insert_transaction(NewTransaction {
                user: user.clone(),
                category_id: draft.category_id,
                kind: draft.kind,
                amount: draft.amount,
                currency,
                amount_in_storage_currency,
                date: draft.date,
            })
            .await?
            .ok_or_else(|| {
                LedgerError::Validation(ValidationErrors::single("category", INVALID_CATEGORY))
            })?;

        info!(
            "Added {} {} {} ({} {}) as transaction {}",
            transaction.kind,
            transaction.amount,
            transaction.currency,
            transaction.amount_in_storage_currency,
            self.converter.storage_currency(),
            transaction.id
        );
        Ok(transaction)
    }

    /// Replaces the editable fields of a transaction. The stored converted
    /// amount is recomputed only when the amount or the currency changed.
    pub async fn update_transaction(
        &self,
        user: &UserId,
        id: TransactionId,
        draft: TransactionDraft,
    ) -> LedgerResult<Transaction> {
        let existing = self.transaction(user, id).await?;
        self.validate(&draft).await?;

        let currency = draft.currency.trim().to_string();
        let amount_in_storage_currency =
            if draft.amount != existing.amount || currency != existing.currency {
                self.converter.convert(draft.amount, &currency).await
            } else {
                debug!("Amount and currency unchanged, keeping converted amount");
                existing.amount_in_storage_currency
            };

        let updated = Transaction {
            id: existing.id,
            user: existing.user,
            category_id: draft.category_id,
            kind: draft.kind,
            amount: draft.amount,
            currency,
            amount_in_storage_currency,
            date: draft.date,
        };
        if !self.store.update_transaction(&updated).await? {
            return Err(LedgerError::TransactionNotFound(id));
        }
        info!("Updated transaction {}", id);
        Ok(updated)
    }

    pub async fn delete_transaction(
        &self,
        user: &UserId,
        id: TransactionId,
    ) -> LedgerResult<Transaction> {
        let deleted = self
            .store
            .delete_transaction(user, id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))?;
        info!(
            "Deleted transaction of {} {} on {}",
            deleted.amount_in_storage_currency,
            self.converter.storage_currency(),
            deleted.date
        );
        Ok(deleted)
    }

    pub async fn transaction(&self, user: &UserId, id: TransactionId) -> LedgerResult<Transaction> {
        self.store
            .transaction(user, id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    pub async fn list_transactions(
        &self,
        user: &UserId,
        query: &TransactionQuery,
    ) -> LedgerResult<TransactionListing> {
        let rows = self.store.transactions(user, &query.filter).await?;
        let totals = analytics::totals(&rows);
        let page = paginate(rows, query.page, self.page_size)?;
        Ok(TransactionListing { page, totals })
    }

    pub async fn overview(&self, user: &UserId, query: &TransactionQuery) -> LedgerResult<Overview> {
        let all = self.store.transactions(user, &TransactionFilter::all()).await?;
        let overall = analytics::totals(&all);

        let filtered: Vec<Transaction> = all
            .into_iter()
            .filter(|tx| query.filter.matches(tx))
            .collect();
        let filtered_totals = analytics::totals(&filtered);
        let page = paginate(filtered, query.page, self.page_size)?;

        Ok(Overview {
            overall,
            filtered: filtered_totals,
            page,
        })
    }

    /// Aggregates over the user's rows matching `filter`.
    pub async fn aggregate(
        &self,
        user: &UserId,
        filter: &TransactionFilter,
    ) -> LedgerResult<StatisticsSnapshot> {
        let rows = self.store.transactions(user, filter).await?;
        let categories = self.store.categories().await?;
        Ok(analytics::snapshot(&rows, &categories, filter))
    }

    /// The statistics view: the trailing thirty days ending today.
    pub async fn statistics(&self, user: &UserId, today: NaiveDate) -> LedgerResult<StatisticsSnapshot> {
        self.aggregate(user, &TransactionFilter::statistics_window(today))
            .await
    }
}
