use crate::core::config::ExchangeRateConfig;
use crate::core::rates::{RateFetcher, RateTable};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = "fintrack/0.1";

/// Fetches the full rate table from an ExchangeRate-API style endpoint.
///
/// The request URL is the plain concatenation `api_url + api_key + api_endpoint`.
pub struct ExchangeRateApiFetcher {
    api_url: String,
    api_key: String,
    api_endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    conversion_rates: HashMap<String, f64>,
}

impl ExchangeRateApiFetcher {
    pub fn new(api_url: &str, api_key: &str, api_endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            api_endpoint: api_endpoint.to_string(),
            client,
        })
    }

    pub fn from_config(config: &ExchangeRateConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("No exchange rate API key configured"))?;
        Self::new(
            &config.api_url,
            api_key,
            &config.api_endpoint,
            config.timeout(),
        )
    }

    fn url(&self) -> String {
        format!("{}{}{}", self.api_url, self.api_key, self.api_endpoint)
    }

    /// The request URL with the key masked, for logs and errors.
    fn redacted_url(&self) -> String {
        format!("{}***{}", self.api_url, self.api_endpoint)
    }

    /// reqwest errors print the full URL, key included.
    fn transport_error(&self, what: &str, e: reqwest::Error) -> anyhow::Error {
        anyhow!("{}: {} for URL: {}", what, e.without_url(), self.redacted_url())
    }
}

/// Converts the JSON numbers through their shortest decimal text so that
/// `0.9` becomes exactly `0.9`. Rates that do not fit a `Decimal` are skipped.
fn to_rate_table(rates: HashMap<String, f64>) -> RateTable {
    rates
        .into_iter()
        .filter_map(|(code, rate)| {
            match Decimal::from_str(&rate.to_string())
                .or_else(|_| Decimal::from_scientific(&format!("{rate:e}")))
            {
                Ok(value) => Some((code, value)),
                Err(e) => {
                    warn!("Skipping rate {} for {}: {}", rate, code, e);
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl RateFetcher for ExchangeRateApiFetcher {
    #[instrument(name = "ExchangeRateFetch", skip(self))]
    async fn fetch(&self) -> Result<RateTable> {
        debug!("Requesting exchange rates from {}", self.redacted_url());

        let response = self
            .client
            .get(self.url())
            .send()
            .await
            .map_err(|e| self.transport_error("Request error", e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for URL: {}",
                response.status(),
                self.redacted_url()
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error("Failed to read response", e))?;
        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response: {}", e))?;

        let table = to_rate_table(data.conversion_rates);
        if table.is_empty() {
            return Err(anyhow!("Exchange rate response contained no rates"));
        }
        debug!("Received {} exchange rates", table.len());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/test-key/latest/EUR"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn fetcher_for(server: &MockServer) -> ExchangeRateApiFetcher {
        ExchangeRateApiFetcher::new(
            &format!("{}/v6/", server.uri()),
            "test-key",
            "/latest/EUR",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_successful_rates_fetch() {
        let body = r#"{
            "result": "success",
            "base_code": "EUR",
            "conversion_rates": {"EUR": 1, "USD": 1.0837, "GBP": 0.8561, "JPY": 162.5}
        }"#;
        let server = create_mock_server(200, body).await;

        let table = fetcher_for(&server).fetch().await.unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.get("EUR"), Some(dec!(1)));
        assert_eq!(table.get("USD"), Some(dec!(1.0837)));
        assert_eq!(table.get("JPY"), Some(dec!(162.5)));
        assert_eq!(table.get("XYZ"), None);
    }

    #[tokio::test]
    async fn test_http_error_is_failure() {
        let server = create_mock_server(500, "oops").await;
        let err = fetcher_for(&server).fetch().await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("HTTP error: 500"));
        assert!(!message.contains("test-key"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_failure() {
        let server = create_mock_server(200, "{not json").await;
        let err = fetcher_for(&server).fetch().await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse JSON response"));
    }

    #[tokio::test]
    async fn test_missing_rates_field_is_failure() {
        let server = create_mock_server(200, r#"{"result": "error", "error-type": "invalid-key"}"#).await;
        assert!(fetcher_for(&server).fetch().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_rates_is_failure() {
        let server = create_mock_server(200, r#"{"conversion_rates": {}}"#).await;
        let err = fetcher_for(&server).fetch().await.unwrap_err();
        assert_eq!(err.to_string(), "Exchange rate response contained no rates");
    }

    #[tokio::test]
    async fn test_unrepresentable_rate_is_skipped() {
        let body = r#"{"conversion_rates": {"EUR": 1, "USD": 1.08, "XXX": 1e29}}"#;
        let server = create_mock_server(200, body).await;

        let table = fetcher_for(&server).fetch().await.unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("USD"), Some(dec!(1.08)));
        assert_eq!(table.get("XXX"), None);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_failure() {
        let fetcher = ExchangeRateApiFetcher::new(
            "http://127.0.0.1:9/v6/",
            "test-key",
            "/latest/EUR",
            Duration::from_millis(200),
        )
        .unwrap();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(err.to_string().starts_with("Request error"));
        assert!(!err.to_string().contains("test-key"));
        assert!(err.to_string().contains("/v6/***/latest/EUR"));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = ExchangeRateConfig {
            api_key: None,
            ..ExchangeRateConfig::default()
        };
        assert!(ExchangeRateApiFetcher::from_config(&config).is_err());
    }
}
