use crate::core::cache::DEFAULT_RATE_TTL;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

/// Environment variable consulted when the config file has no API key.
pub const API_KEY_ENV: &str = "FINTRACK_API_KEY";

const DEFAULT_PAGE_SIZE: usize = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_RATE_TTL.as_secs()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_storage_currency() -> String {
    "EUR".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ExchangeRateConfig {
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub api_endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for ExchangeRateConfig {
    fn default() -> Self {
        ExchangeRateConfig {
            api_url: "https://v6.exchangerate-api.com/v6/".to_string(),
            api_key: None,
            api_endpoint: "/latest/EUR".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_RATE_TTL.as_secs(),
        }
    }
}

impl ExchangeRateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Fills in a missing or blank key from `fallback`.
    fn apply_api_key_fallback(&mut self, fallback: Option<String>) {
        let missing = self.api_key.as_deref().is_none_or(|k| k.trim().is_empty());
        if missing {
            self.api_key = fallback.filter(|k| !k.trim().is_empty());
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub exchange_rates: ExchangeRateConfig,
    #[serde(default = "default_storage_currency")]
    pub storage_currency: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            exchange_rates: ExchangeRateConfig::default(),
            storage_currency: default_storage_currency(),
            page_size: DEFAULT_PAGE_SIZE,
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("", "", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::from_yaml(&config_str, std::env::var(API_KEY_ENV).ok())
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Parses and validates a config document. `api_key_fallback` is used when
    /// the document has no key of its own.
    pub fn from_yaml(yaml: &str, api_key_fallback: Option<String>) -> Result<Self> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.exchange_rates.apply_api_key_fallback(api_key_fallback);
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("page_size must be a positive integer");
        }
        if self.storage_currency.trim().is_empty() {
            bail!("storage_currency must not be empty");
        }
        Ok(())
    }
}
