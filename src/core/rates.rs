//! Exchange rate abstractions

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Currency code to rate, relative to the base currency of the source that
/// produced it. Cloning is cheap and the contents never change after creation;
/// a refresh produces a new table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RateTable {
    rates: Arc<BTreeMap<String, Decimal>>,
}

impl RateTable {
    pub fn new(rates: BTreeMap<String, Decimal>) -> Self {
        Self {
            rates: Arc::new(rates),
        }
    }

    pub fn get(&self, currency: &str) -> Option<Decimal> {
        self.rates.get(currency).copied()
    }

    /// Currency codes in ascending order.
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Decimal)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (S, Decimal)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A source of exchange rate tables. One call is one attempt; implementations
/// must not retry.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch(&self) -> Result<RateTable>;
}
