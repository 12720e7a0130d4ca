//! Market rate provider backed by the Yahoo Finance chart API.
//!
//! Fetches gold futures and the six USD crosses. Any quote that cannot be
//! fetched is replaced by its conventional default, so callers always get a
//! complete snapshot.

use std::time::Duration;

use anyhow::{anyhow, Context};
use backoff::ExponentialBackoffBuilder;
use chrono::Utc;
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::models::RateSnapshot;

use super::types::ChartResponse;

const CHART_API_BASE: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RETRY_BUDGET: Duration = Duration::from_secs(20);
const USER_AGENT: &str = "Mozilla/5.0 (compatible; goldgrid/0.1)";

/// Quotes that make up a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ticker {
    Gold,
    EurUsd,
    GbpUsd,
    AudUsd,
    UsdCad,
    UsdChf,
    UsdJpy,
}

impl Ticker {
    const ALL: [Ticker; 7] = [
        Ticker::Gold,
        Ticker::EurUsd,
        Ticker::GbpUsd,
        Ticker::AudUsd,
        Ticker::UsdCad,
        Ticker::UsdChf,
        Ticker::UsdJpy,
    ];

    fn symbol(&self) -> &'static str {
        match self {
            Ticker::Gold => "GC=F",
            Ticker::EurUsd => "EURUSD=X",
            Ticker::GbpUsd => "GBPUSD=X",
            Ticker::AudUsd => "AUDUSD=X",
            Ticker::UsdCad => "CAD=X",
            Ticker::UsdChf => "CHF=X",
            Ticker::UsdJpy => "JPY=X",
        }
    }

    fn field<'a>(&self, snapshot: &'a mut RateSnapshot) -> &'a mut Decimal {
        match self {
            Ticker::Gold => &mut snapshot.gold_price_usd,
            Ticker::EurUsd => &mut snapshot.eur_usd,
            Ticker::GbpUsd => &mut snapshot.gbp_usd,
            Ticker::AudUsd => &mut snapshot.aud_usd,
            Ticker::UsdCad => &mut snapshot.usd_cad,
            Ticker::UsdChf => &mut snapshot.usd_chf,
            Ticker::UsdJpy => &mut snapshot.usd_jpy,
        }
    }
}

/// Connection settings for the rate provider.
#[derive(Debug, Clone)]
pub struct RatesConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Total time spent retrying one quote before using its default
    pub retry_budget: Duration,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_url: CHART_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

/// Client for current gold and FX quotes (read-only).
pub struct RatesClient {
    client: Client,
    config: RatesConfig,
}

impl RatesClient {
    /// Create a new rates client with default settings.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(RatesConfig::default())
    }

    /// Create with custom settings (for testing).
    pub fn with_config(config: RatesConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Fetch a complete snapshot. Never fails: quotes that cannot be
    /// fetched fall back to their defaults individually.
    pub async fn snapshot(&self) -> RateSnapshot {
        let results = join_all(Ticker::ALL.iter().map(|t| self.fetch_price(t.symbol()))).await;

        let mut snapshot = RateSnapshot::fallback();
        let mut live = 0;

        for (ticker, result) in Ticker::ALL.iter().zip(results) {
            match result {
                Ok(price) => {
                    *ticker.field(&mut snapshot) = price;
                    live += 1;
                }
                Err(e) => {
                    let default = *ticker.field(&mut snapshot);
                    warn!(
                        symbol = ticker.symbol(),
                        error = %e,
                        default = %default,
                        "Quote unavailable, using default"
                    );
                }
            }
        }

        snapshot.captured_at = Utc::now();
        snapshot.is_fallback = live == 0;

        info!(live = live, total = Ticker::ALL.len(), "Rate snapshot captured");
        snapshot
    }

    /// Fetch the latest price for one symbol, retrying transient failures.
    pub async fn fetch_price(&self, symbol: &str) -> anyhow::Result<Decimal> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(250))
            .with_max_elapsed_time(Some(self.config.retry_budget))
            .build();

        backoff::future::retry(policy, || async { self.fetch_price_once(symbol).await }).await
    }

    async fn fetch_price_once(&self, symbol: &str) -> Result<Decimal, backoff::Error<anyhow::Error>> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1m&range=1d",
            self.config.base_url, symbol
        );

        debug!(url = %url, "Fetching quote");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch quote for {}", symbol))
            .map_err(backoff::Error::transient)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = anyhow!("Quote request for {} failed: {} - {}", symbol, status, body);
            return Err(if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            });
        }

        let chart: ChartResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse quote response for {}", symbol))
            .map_err(backoff::Error::permanent)?;

        let price = chart
            .last_price()
            .ok_or_else(|| match chart.error_message() {
                Some(msg) => anyhow!("Quote provider rejected {}: {}", symbol, msg),
                None => anyhow!("No price in quote response for {}", symbol),
            })
            .map_err(backoff::Error::permanent)?;

        debug!(
            symbol = chart.symbol().unwrap_or(symbol),
            price = price,
            "Quote received"
        );

        Decimal::try_from(price)
            .map(|d| d.round_dp(6))
            .with_context(|| format!("Price for {} out of range: {}", symbol, price))
            .map_err(backoff::Error::permanent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_provider_yields_defaults() {
        let client = RatesClient::with_config(RatesConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(500),
            retry_budget: Duration::ZERO,
        })
        .unwrap();

        let snapshot = tokio_test::block_on(client.snapshot());
        let defaults = RateSnapshot::fallback();

        assert!(snapshot.is_fallback);
        assert_eq!(snapshot.gold_price_usd, defaults.gold_price_usd);
        assert_eq!(snapshot.eur_usd, defaults.eur_usd);
        assert_eq!(snapshot.usd_jpy, defaults.usd_jpy);
    }

    #[test]
    fn test_ticker_symbols_cover_every_field() {
        let mut snapshot = RateSnapshot::fallback();
        for (i, ticker) in Ticker::ALL.iter().enumerate() {
            *ticker.field(&mut snapshot) = Decimal::from(i as u32 + 1);
        }

        assert_eq!(snapshot.gold_price_usd, Decimal::from(1));
        assert_eq!(snapshot.usd_jpy, Decimal::from(7));
    }
}
