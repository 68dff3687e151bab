//! Exchange-rate cache for approximate USD totals.
//!
//! An explicit cache object injected through `AppState`: it holds the last
//! fetched quote table together with its fetch time, refreshes through the
//! configured endpoint when stale, and falls back to the stale table when a
//! refresh fails. Disabled (the default) it answers None and responses simply
//! omit the USD approximation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::config::RatesConfig;

#[derive(Debug, Clone)]
struct Quotes {
    /// Currency code (uppercase) to units-per-USD
    rates: HashMap<String, Decimal>,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RatesDocument {
    rates: HashMap<String, Decimal>,
}

pub struct RateCache {
    config: RatesConfig,
    client: reqwest::Client,
    inner: RwLock<Option<Quotes>>,
}

impl RateCache {
    pub fn new(config: RatesConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            inner: RwLock::new(None),
        }
    }

    /// Approximate `amount` of `currency` in USD, or None when disabled, the
    /// currency is unknown, or no quotes could be fetched.
    pub async fn usd_total(&self, amount: Decimal, currency: &str) -> Option<Decimal> {
        if !self.config.enabled {
            return None;
        }
        if currency.eq_ignore_ascii_case("usd") {
            return Some(amount.round_dp(2));
        }
        let rate = self.rate_for(currency).await?;
        if rate <= Decimal::ZERO {
            return None;
        }
        Some((amount / rate).round_dp(2))
    }

    async fn rate_for(&self, currency: &str) -> Option<Decimal> {
        let key = currency.to_ascii_uppercase();

        {
            let guard = self.inner.read().await;
            if let Some(quotes) = guard.as_ref() {
                if self.is_fresh(quotes) {
                    return quotes.rates.get(&key).copied();
                }
            }
        }

        let mut guard = self.inner.write().await;
        // Another task may have refreshed while we waited for the write lock
        if let Some(quotes) = guard.as_ref() {
            if self.is_fresh(quotes) {
                return quotes.rates.get(&key).copied();
            }
        }

        match self.fetch().await {
            Ok(rates) => {
                *guard = Some(Quotes {
                    rates,
                    fetched_at: Utc::now(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh exchange rates, keeping stale quotes");
            }
        }

        guard.as_ref().and_then(|quotes| quotes.rates.get(&key).copied())
    }

    fn is_fresh(&self, quotes: &Quotes) -> bool {
        let age = Utc::now().signed_duration_since(quotes.fetched_at);
        age.to_std().map(|age| age < self.config.refresh_interval).unwrap_or(false)
    }

    async fn fetch(&self) -> Result<HashMap<String, Decimal>, reqwest::Error> {
        let document: RatesDocument = self.client.get(&self.config.url).send().await?.error_for_status()?.json().await?;
        Ok(document.rates)
    }

    /// Seed the cache directly, for tests.
    #[cfg(test)]
    pub async fn set_quotes_for_test(&self, rates: HashMap<String, Decimal>) {
        let mut guard = self.inner.write().await;
        *guard = Some(Quotes {
            rates,
            fetched_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn enabled_config() -> RatesConfig {
        RatesConfig {
            enabled: true,
            url: "http://localhost:0/unreachable".to_string(),
            refresh_interval: Duration::from_secs(3600),
        }
    }

    #[tokio::test]
    async fn test_disabled_cache_answers_none() {
        let cache = RateCache::new(RatesConfig::default());
        assert_eq!(cache.usd_total(Decimal::new(10000, 2), "thb").await, None);
    }

    #[tokio::test]
    async fn test_usd_passes_through_without_quotes() {
        let cache = RateCache::new(enabled_config());
        assert_eq!(
            cache.usd_total(Decimal::new(10000, 2), "USD").await,
            Some(Decimal::new(10000, 2))
        );
    }

    #[tokio::test]
    async fn test_fresh_quotes_convert() {
        let cache = RateCache::new(enabled_config());
        cache
            .set_quotes_for_test(HashMap::from([("THB".to_string(), Decimal::new(35, 0))]))
            .await;

        // 3500 THB at 35 THB/USD = 100 USD
        assert_eq!(
            cache.usd_total(Decimal::new(350000, 2), "thb").await,
            Some(Decimal::new(10000, 2))
        );
        // Unknown currency stays unknown
        assert_eq!(cache.usd_total(Decimal::ONE, "xyz").await, None);
    }
}
