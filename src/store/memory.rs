use crate::core::filter::TransactionFilter;
use crate::core::transaction::{Category, CategoryId, NewTransaction, Transaction, TransactionId, UserId};
use crate::store::{TransactionStore, sort_newest_first};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    transactions: BTreeMap<TransactionId, Transaction>,
    last_category_id: u64,
    last_transaction_id: u64,
}

/// Store that keeps everything in process memory. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn create_category(&self, name: &str) -> Result<Option<Category>> {
        let mut tables = self.inner.lock().await;
        if tables.categories.values().any(|c| c.name == name) {
            debug!("Category name already taken: {}", name);
            return Ok(None);
        }
        tables.last_category_id += 1;
        let category = Category {
            id: CategoryId(tables.last_category_id),
            name: name.to_string(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(Some(category))
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let tables = self.inner.lock().await;
        Ok(tables.categories.values().cloned().collect())
    }

    async fn category(&self, id: CategoryId) -> Result<Option<Category>> {
        let tables = self.inner.lock().await;
        Ok(tables.categories.get(&id).cloned())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<Option<usize>> {
        let mut tables = self.inner.lock().await;
        if tables.categories.remove(&id).is_none() {
            return Ok(None);
        }
        let before = tables.transactions.len();
        tables.transactions.retain(|_, tx| tx.category_id != id);
        Ok(Some(before - tables.transactions.len()))
    }

    async fn insert_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Option<Transaction>> {
        let mut tables = self.inner.lock().await;
        if !tables.categories.contains_key(&transaction.category_id) {
            return Ok(None);
        }
        tables.last_transaction_id += 1;
        let transaction = transaction.with_id(TransactionId(tables.last_transaction_id));
        tables
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(Some(transaction))
    }

    async fn update_transaction(&self, transaction: &Transaction) -> Result<bool> {
        let mut tables = self.inner.lock().await;
        match tables.transactions.get_mut(&transaction.id) {
            Some(existing) if existing.user == transaction.user => {
                *existing = transaction.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn transaction(&self, user: &UserId, id: TransactionId) -> Result<Option<Transaction>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .transactions
            .get(&id)
            .filter(|tx| &tx.user == user)
            .cloned())
    }

    async fn delete_transaction(
        &self,
        user: &UserId,
        id: TransactionId,
    ) -> Result<Option<Transaction>> {
        let mut tables = self.inner.lock().await;
        if tables.transactions.get(&id).is_some_and(|tx| &tx.user == user) {
            Ok(tables.transactions.remove(&id))
        } else {
            Ok(None)
        }
    }

    async fn transactions(
        &self,
        user: &UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let tables = self.inner.lock().await;
        let mut rows: Vec<Transaction> = tables
            .transactions
            .values()
            .filter(|tx| &tx.user == user && filter.matches(tx))
            .cloned()
            .collect();
        sort_newest_first(&mut rows);
        Ok(rows)
    }
}
