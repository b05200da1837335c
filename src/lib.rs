pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::error::{LedgerError, ValidationErrors};
use crate::core::transaction::{CategoryId, TransactionDraft, TransactionId, UserId};
use crate::core::{CurrencyConverter, Ledger, RateCache};
use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

/// Commands that need a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Rates,
    Convert { amount: Decimal, currency: String },
    AddCategory { name: String },
    ListCategories,
    DeleteCategory { id: CategoryId },
    Add(TransactionDraft),
    Edit { id: TransactionId, draft: TransactionDraft },
    Show { id: TransactionId },
    Delete { id: TransactionId },
    /// `query` uses the URL query-string syntax, e.g. `transaction_type=expense&page=2`.
    List { query: Option<String> },
    Overview { query: Option<String> },
    Stats { today: NaiveDate },
}

/// Wires the configured store, rate fetcher and cache into a ledger.
pub fn build_ledger(config: &AppConfig) -> Result<Ledger> {
    let fetcher = providers::ExchangeRateApiFetcher::from_config(&config.exchange_rates)?;
    let cache = Arc::new(RateCache::with_ttl(
        Arc::new(fetcher),
        config.exchange_rates.cache_ttl(),
    ));
    let converter = CurrencyConverter::new(cache, &config.storage_currency);

    let data_path = config.default_data_path()?;
    debug!("Using data path {}", data_path.display());
    let store = store::FjallStore::open(&data_path.join("ledger"))?;

    Ok(Ledger::new(Arc::new(store), converter, config.page_size))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>, user: &str) -> Result<()> {
    info!("fintrack starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        storage_currency = %config.storage_currency,
        page_size = config.page_size,
        "Loaded config"
    );

    let ledger = build_ledger(&config)?;
    let user = UserId::from(user);

    match command {
        AppCommand::Rates => cli::rates::show_rates(ledger.converter()).await,
        AppCommand::Convert { amount, currency } => {
            cli::rates::convert(ledger.converter(), amount, &currency).await
        }
        AppCommand::AddCategory { name } => cli::categories::add(&ledger, &name).await,
        AppCommand::ListCategories => cli::categories::list(&ledger).await,
        AppCommand::DeleteCategory { id } => cli::categories::delete(&ledger, id).await,
        AppCommand::Add(draft) => cli::transactions::add(&ledger, &user, draft).await,
        AppCommand::Edit { id, draft } => cli::transactions::edit(&ledger, &user, id, draft).await,
        AppCommand::Show { id } => cli::transactions::show(&ledger, &user, id).await,
        AppCommand::Delete { id } => cli::transactions::delete(&ledger, &user, id).await,
        AppCommand::List { query } => {
            cli::transactions::list(&ledger, &user, query.as_deref()).await
        }
        AppCommand::Overview { query } => {
            cli::transactions::overview(&ledger, &user, query.as_deref()).await
        }
        AppCommand::Stats { today } => cli::stats::run(&ledger, &user, today).await,
    }
}

/// Field errors carried by `err`, if it is a validation failure.
pub fn validation_errors(err: &anyhow::Error) -> Option<&ValidationErrors> {
    err.downcast_ref::<LedgerError>()
        .and_then(LedgerError::validation_errors)
        .or_else(|| err.downcast_ref::<ValidationErrors>())
}
