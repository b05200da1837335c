//! Currency conversion into the storage currency

use crate::core::cache::RateCache;
use crate::core::rates::RateTable;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tracing::{debug, warn};

/// Currencies offered when no rate table is available.
pub const DEFAULT_CURRENCIES: [(&str, &str); 9] = [
    ("USD", "US Dollar"),
    ("EUR", "Euro"),
    ("GBP", "British Pound"),
    ("JPY", "Japanese Yen"),
    ("AUD", "Australian Dollar"),
    ("CAD", "Canadian Dollar"),
    ("CHF", "Swiss Franc"),
    ("CNY", "Chinese Yuan"),
    ("INR", "Indian Rupee"),
];

/// Decimal places kept for converted amounts.
pub const MONEY_SCALE: u32 = 2;

/// Rounds a monetary value to cents, ties to the even neighbour.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// `amount / rate` in the storage currency. `None` for a zero rate.
pub fn convert_with_rate(amount: Decimal, rate: Decimal) -> Option<Decimal> {
    amount.checked_div(rate).map(round_money)
}

/// Converts amounts using the shared rate cache.
#[derive(Clone)]
pub struct CurrencyConverter {
    rates: Arc<RateCache>,
    storage_currency: String,
}

impl CurrencyConverter {
    pub fn new(rates: Arc<RateCache>, storage_currency: &str) -> Self {
        Self {
            rates,
            storage_currency: storage_currency.to_string(),
        }
    }

    pub fn storage_currency(&self) -> &str {
        &self.storage_currency
    }

    /// Converts `amount` in `currency` into the storage currency.
    ///
    /// When no rate is known for `currency` (no table, unknown code, or a zero
    /// rate) the result is `0`, not the unconverted amount.
    pub async fn convert(&self, amount: Decimal, currency: &str) -> Decimal {
        let converted = match self.rates.lookup_rate(currency).await {
            Some(rate) => convert_with_rate(amount, rate),
            None => None,
        };

        match converted {
            Some(value) => {
                debug!(
                    "Converted {amount} {currency} to {value} {}",
                    self.storage_currency
                );
                value
            }
            None => {
                warn!(
                    currency,
                    "No usable exchange rate, storing converted amount as 0"
                );
                Decimal::ZERO
            }
        }
    }

    pub async fn get_rates(&self) -> Option<RateTable> {
        self.rates.get_table().await
    }

    pub async fn get_rate_for(&self, currency: &str) -> Option<Decimal> {
        self.rates.get_rate_for(currency).await
    }

    /// Currency codes a transaction may be entered in: the codes of the
    /// current rate table, or [`DEFAULT_CURRENCIES`] when rates are unavailable.
    pub async fn currency_choices(&self) -> Vec<String> {
        match self.rates.get_table().await {
            Some(table) => table.currencies().map(str::to_string).collect(),
            None => DEFAULT_CURRENCIES
                .iter()
                .map(|(code, _)| code.to_string())
                .collect(),
        }
    }
}
