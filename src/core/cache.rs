use crate::core::rates::{RateFetcher, RateTable};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};

/// How long a fetched table is served before the next lookup refetches it.
pub const DEFAULT_RATE_TTL: Duration = Duration::from_secs(3600);

struct CachedRates {
    table: RateTable,
    expires_at: Instant,
}

/// Single-slot cache in front of a [`RateFetcher`].
///
/// The slot holds one immutable snapshot which is replaced as a whole. Refreshes
/// are serialised, so any number of concurrent lookups against an empty or
/// expired slot results in a single fetch.
pub struct RateCache {
    fetcher: Arc<dyn RateFetcher>,
    ttl: Duration,
    slot: RwLock<Option<Arc<CachedRates>>>,
    refresh: Mutex<()>,
}

impl RateCache {
    pub fn new(fetcher: Arc<dyn RateFetcher>) -> Self {
        Self::with_ttl(fetcher, DEFAULT_RATE_TTL)
    }

    pub fn with_ttl(fetcher: Arc<dyn RateFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    async fn current(&self) -> Option<RateTable> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|cached| Instant::now() < cached.expires_at)
            .map(|cached| cached.table.clone())
    }

    /// Returns the cached table, fetching a new one when the slot is empty or
    /// expired. `None` means no rates are available right now.
    pub async fn get_table(&self) -> Option<RateTable> {
        if let Some(table) = self.current().await {
            debug!("Rate cache HIT");
            return Some(table);
        }

        let _refresh = self.refresh.lock().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(table) = self.current().await {
            debug!("Rate cache HIT after waiting for refresh");
            return Some(table);
        }

        debug!("Rate cache MISS, fetching exchange rates");
        match self.fetcher.fetch().await {
            Ok(table) => {
                let cached = Arc::new(CachedRates {
                    table: table.clone(),
                    expires_at: Instant::now() + self.ttl,
                });
                *self.slot.write().await = Some(cached);
                debug!(currencies = table.len(), "Rate cache PUT");
                Some(table)
            }
            Err(e) => {
                warn!(error = %e, "Exchange rates unavailable");
                None
            }
        }
    }

    /// Rate for `currency`, or `None` when there is no table or the table has
    /// no entry for it.
    pub async fn lookup_rate(&self, currency: &str) -> Option<Decimal> {
        self.get_table().await?.get(currency)
    }

    /// Rate for `currency` with the degraded-mode fallback: when no table can
    /// be obtained the identity rate `1` is returned. A table that lacks the
    /// currency still yields `None`.
    pub async fn get_rate_for(&self, currency: &str) -> Option<Decimal> {
        match self.get_table().await {
            Some(table) => table.get(currency),
            None => {
                debug!(currency, "No exchange rates, using identity rate");
                Some(Decimal::ONE)
            }
        }
    }

    /// Drops the cached table so the next lookup fetches again.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
        debug!("Rate cache CLEAR");
    }
}
