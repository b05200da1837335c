pub mod disk;
pub mod memory;

use crate::core::filter::TransactionFilter;
use crate::core::transaction::{Category, CategoryId, NewTransaction, Transaction, TransactionId, UserId};
use anyhow::Result;
use async_trait::async_trait;
use std::cmp::Reverse;

pub use disk::FjallStore;
pub use memory::MemoryStore;

/// Persistence for categories and transactions.
///
/// Transaction reads and deletes take the owning user; a row owned by someone
/// else is reported exactly like a missing one.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Creates a category, or returns `None` if the name is already taken.
    async fn create_category(&self, name: &str) -> Result<Option<Category>>;

    /// All categories, ordered by id.
    async fn categories(&self) -> Result<Vec<Category>>;

    async fn category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Deletes a category and every transaction that references it. Returns the
    /// number of transactions removed, or `None` if there was no such category.
    async fn delete_category(&self, id: CategoryId) -> Result<Option<usize>>;

    /// Stores a new row under the next id. Returns `None` without storing
    /// anything if its category no longer exists.
    async fn insert_transaction(&self, transaction: NewTransaction)
    -> Result<Option<Transaction>>;

    /// Overwrites an existing row. Returns `false` if the row does not exist
    /// for `transaction.user`.
    async fn update_transaction(&self, transaction: &Transaction) -> Result<bool>;

    async fn transaction(&self, user: &UserId, id: TransactionId) -> Result<Option<Transaction>>;

    async fn delete_transaction(&self, user: &UserId, id: TransactionId)
    -> Result<Option<Transaction>>;

    /// Rows owned by `user` that match `filter`, newest date first and then
    /// highest id first.
    async fn transactions(&self, user: &UserId, filter: &TransactionFilter)
    -> Result<Vec<Transaction>>;
}

/// Orders rows the way listings show them.
pub(crate) fn sort_newest_first(rows: &mut [Transaction]) {
    rows.sort_by_key(|tx| (Reverse(tx.date), Reverse(tx.id)));
}

#[cfg(test)]
pub(crate) mod tests {
    //! Behaviour every store must share. Each implementation runs these
    //! against a fresh instance.
    use super::*;
    use crate::core::transaction::TransactionType;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub(crate) fn new_transaction(
        user: &str,
        category_id: CategoryId,
        amount: Decimal,
        on: NaiveDate,
    ) -> NewTransaction {
        NewTransaction {
            user: UserId::from(user),
            category_id,
            kind: TransactionType::Expense,
            amount,
            currency: "EUR".to_string(),
            amount_in_storage_currency: amount,
            date: on,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    pub(crate) async fn check_categories(store: &dyn TransactionStore) {
        let food = store.create_category("Food").await.unwrap().unwrap();
        let rent = store.create_category("Rent").await.unwrap().unwrap();
        assert!(food.id < rent.id);

        assert!(store.create_category("Food").await.unwrap().is_none());
        assert_eq!(store.categories().await.unwrap(), vec![food.clone(), rent]);
        assert_eq!(store.category(food.id).await.unwrap(), Some(food));
        assert_eq!(store.category(CategoryId(999)).await.unwrap(), None);
    }

    pub(crate) async fn check_owner_scoping(store: &dyn TransactionStore) {
        let food = store.create_category("Food").await.unwrap().unwrap();
        let tx = store
            .insert_transaction(new_transaction("alice", food.id, dec!(10), date(1)))
            .await
            .unwrap()
            .unwrap();

        let bob = UserId::from("bob");
        assert_eq!(store.transaction(&bob, tx.id).await.unwrap(), None);
        assert_eq!(store.delete_transaction(&bob, tx.id).await.unwrap(), None);

        let mut stolen = tx.clone();
        stolen.user = bob.clone();
        assert!(!store.update_transaction(&stolen).await.unwrap());

        assert_eq!(
            store.transaction(&tx.user, tx.id).await.unwrap(),
            Some(tx.clone())
        );
        assert_eq!(
            store.delete_transaction(&tx.user, tx.id).await.unwrap(),
            Some(tx.clone())
        );
        assert_eq!(store.transaction(&tx.user, tx.id).await.unwrap(), None);
    }

    pub(crate) async fn check_listing_order_and_filter(store: &dyn TransactionStore) {
        let food = store.create_category("Food").await.unwrap().unwrap();
        let rent = store.create_category("Rent").await.unwrap().unwrap();
        let alice = UserId::from("alice");

        let a = store
            .insert_transaction(new_transaction("alice", food.id, dec!(1), date(2)))
            .await
            .unwrap()
            .unwrap();
        let b = store
            .insert_transaction(new_transaction("alice", rent.id, dec!(2), date(5)))
            .await
            .unwrap()
            .unwrap();
        let c = store
            .insert_transaction(new_transaction("alice", food.id, dec!(3), date(2)))
            .await
            .unwrap()
            .unwrap();
        store
            .insert_transaction(new_transaction("bob", food.id, dec!(4), date(9)))
            .await
            .unwrap()
            .unwrap();

        let ids: Vec<_> = store
            .transactions(&alice, &TransactionFilter::all())
            .await
            .unwrap()
            .into_iter()
            .map(|tx| tx.id)
            .collect();
        assert_eq!(ids, vec![b.id, c.id, a.id]);

        let food_only = store
            .transactions(&alice, &TransactionFilter::all().with_categories([food.id]))
            .await
            .unwrap();
        assert_eq!(food_only.len(), 2);
        assert!(food_only.iter().all(|tx| tx.category_id == food.id));
    }

    pub(crate) async fn check_update(store: &dyn TransactionStore) {
        let food = store.create_category("Food").await.unwrap().unwrap();
        let mut tx = store
            .insert_transaction(new_transaction("alice", food.id, dec!(10), date(1)))
            .await
            .unwrap()
            .unwrap();

        tx.amount = dec!(12.5);
        tx.amount_in_storage_currency = dec!(12.5);
        assert!(store.update_transaction(&tx).await.unwrap());
        assert_eq!(store.transaction(&tx.user, tx.id).await.unwrap(), Some(tx));
    }

    pub(crate) async fn check_category_cascade(store: &dyn TransactionStore) {
        let food = store.create_category("Food").await.unwrap().unwrap();
        let rent = store.create_category("Rent").await.unwrap().unwrap();
        for (user, category) in [("alice", food.id), ("bob", food.id), ("alice", rent.id)] {
            store
                .insert_transaction(new_transaction(user, category, dec!(1), date(3)))
                .await
                .unwrap()
                .unwrap();
        }

        assert_eq!(store.delete_category(food.id).await.unwrap(), Some(2));
        assert_eq!(store.delete_category(food.id).await.unwrap(), None);
        assert_eq!(store.categories().await.unwrap(), vec![rent.clone()]);

        // A row filed under the deleted category is refused, not orphaned.
        let late = store
            .insert_transaction(new_transaction("alice", food.id, dec!(1), date(4)))
            .await
            .unwrap();
        assert_eq!(late, None);

        for user in ["alice", "bob"] {
            let rows = store
                .transactions(&UserId::from(user), &TransactionFilter::all())
                .await
                .unwrap();
            assert!(rows.iter().all(|tx| tx.category_id == rent.id));
        }
    }
}
