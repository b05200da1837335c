use crate::core::filter::TransactionFilter;
use crate::core::transaction::{Category, CategoryId, NewTransaction, Transaction, TransactionId, UserId};
use crate::store::{TransactionStore, sort_newest_first};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

const CATEGORIES: &str = "categories";
const TRANSACTIONS: &str = "transactions";
const META: &str = "meta";
const LAST_CATEGORY_ID: &[u8] = b"last_category_id";
const LAST_TRANSACTION_ID: &[u8] = b"last_transaction_id";

/// On-disk store backed by a fjall keyspace.
///
/// Transaction keys start with the owning user, so a lookup for one user can
/// never reach another user's rows. Values are JSON.
pub struct FjallStore {
    keyspace: Keyspace,
    categories: PartitionHandle,
    transactions: PartitionHandle,
    meta: PartitionHandle,
    // Serialises id allocation and the category name check.
    write_lock: Mutex<()>,
}

impl FjallStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let categories = keyspace.open_partition(CATEGORIES, PartitionCreateOptions::default())?;
        let transactions =
            keyspace.open_partition(TRANSACTIONS, PartitionCreateOptions::default())?;
        let meta = keyspace.open_partition(META, PartitionCreateOptions::default())?;
        debug!("Opened store at {}", path.display());

        Ok(Self {
            keyspace,
            categories,
            transactions,
            meta,
            write_lock: Mutex::new(()),
        })
    }

    fn user_prefix(user: &UserId) -> Vec<u8> {
        let user = user.0.as_bytes();
        let mut prefix = Vec::with_capacity(4 + user.len());
        prefix.extend_from_slice(&(user.len() as u32).to_be_bytes());
        prefix.extend_from_slice(user);
        prefix
    }

    fn transaction_key(user: &UserId, id: TransactionId) -> Vec<u8> {
        let mut key = Self::user_prefix(user);
        key.extend_from_slice(&id.0.to_be_bytes());
        key
    }

    fn next_id(&self, counter: &[u8]) -> Result<u64> {
        let last = match self.meta.get(counter)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes[..]
                    .try_into()
                    .context("Corrupt id counter in store")?;
                u64::from_be_bytes(bytes)
            }
            None => 0,
        };
        Ok(last + 1)
    }

    fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to flush store to disk")
    }

    fn decode_category(value: &[u8]) -> Result<Category> {
        serde_json::from_slice(value).context("Failed to decode stored category")
    }

    fn decode_transaction(value: &[u8]) -> Result<Transaction> {
        serde_json::from_slice(value).context("Failed to decode stored transaction")
    }
}

#[async_trait]
impl TransactionStore for FjallStore {
    async fn create_category(&self, name: &str) -> Result<Option<Category>> {
        let _guard = self.write_lock.lock().await;
        for category in self.categories().await? {
            if category.name == name {
                debug!("Category name already taken: {}", name);
                return Ok(None);
            }
        }

        let id = self.next_id(LAST_CATEGORY_ID)?;
        let category = Category {
            id: CategoryId(id),
            name: name.to_string(),
        };
        let mut batch = self.keyspace.batch();
        batch.insert(
            &self.categories,
            id.to_be_bytes().to_vec(),
            serde_json::to_vec(&category)?,
        );
        batch.insert(&self.meta, LAST_CATEGORY_ID, id.to_be_bytes().to_vec());
        batch.commit()?;
        self.persist()?;

        info!("Created category {} ({})", category.name, category.id);
        Ok(Some(category))
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        // Big-endian keys iterate in id order.
        self.categories
            .iter()
            .map(|kv| {
                let (_, value) = kv?;
                Self::decode_category(&value)
            })
            .collect()
    }

    async fn category(&self, id: CategoryId) -> Result<Option<Category>> {
        self.categories
            .get(id.0.to_be_bytes())?
            .map(|value| Self::decode_category(&value))
            .transpose()
    }

    async fn delete_category(&self, id: CategoryId) -> Result<Option<usize>> {
        let _guard = self.write_lock.lock().await;
        if self.categories.get(id.0.to_be_bytes())?.is_none() {
            return Ok(None);
        }

        let mut batch = self.keyspace.batch();
        let mut removed = 0;
        for kv in self.transactions.iter() {
            let (key, value) = kv?;
            if Self::decode_transaction(&value)?.category_id == id {
                batch.remove(&self.transactions, key);
                removed += 1;
            }
        }
        batch.remove(&self.categories, id.0.to_be_bytes().to_vec());
        batch.commit()?;
        self.persist()?;

        Ok(Some(removed))
    }

    async fn insert_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Option<Transaction>> {
        let _guard = self.write_lock.lock().await;
        if self
            .categories
            .get(transaction.category_id.0.to_be_bytes())?
            .is_none()
        {
            return Ok(None);
        }
        let id = self.next_id(LAST_TRANSACTION_ID)?;
        let transaction = transaction.with_id(TransactionId(id));

        let mut batch = self.keyspace.batch();
        batch.insert(
            &self.transactions,
            Self::transaction_key(&transaction.user, transaction.id),
            serde_json::to_vec(&transaction)?,
        );
        batch.insert(&self.meta, LAST_TRANSACTION_ID, id.to_be_bytes().to_vec());
        batch.commit()?;
        self.persist()?;

        debug!("Stored transaction {} for {}", transaction.id, transaction.user);
        Ok(Some(transaction))
    }

    async fn update_transaction(&self, transaction: &Transaction) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let key = Self::transaction_key(&transaction.user, transaction.id);
        if self.transactions.get(&key)?.is_none() {
            return Ok(false);
        }
        self.transactions
            .insert(key, serde_json::to_vec(transaction)?)?;
        self.persist()?;
        Ok(true)
    }

    async fn transaction(&self, user: &UserId, id: TransactionId) -> Result<Option<Transaction>> {
        self.transactions
            .get(Self::transaction_key(user, id))?
            .map(|value| Self::decode_transaction(&value))
            .transpose()
    }

    async fn delete_transaction(
        &self,
        user: &UserId,
        id: TransactionId,
    ) -> Result<Option<Transaction>> {
        let _guard = self.write_lock.lock().await;
        let key = Self::transaction_key(user, id);
        let Some(value) = self.transactions.get(&key)? else {
            return Ok(None);
        };
        let transaction = Self::decode_transaction(&value)?;
        self.transactions.remove(key)?;
        self.persist()?;
        Ok(Some(transaction))
    }

    async fn transactions(
        &self,
        user: &UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut rows = Vec::new();
        for kv in self.transactions.prefix(Self::user_prefix(user)) {
            let (_, value) = kv?;
            let transaction = Self::decode_transaction(&value)?;
            if filter.matches(&transaction) {
                rows.push(transaction);
            }
        }
        sort_newest_first(&mut rows);
        Ok(rows)
    }
}
