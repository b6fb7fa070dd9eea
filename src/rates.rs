//! Currency exchange rates relative to EUR
//!
//! [`ExchangeRateService`] is an owned cache: it starts out with built-in
//! fallback rates, replaces them with fetched values when a refresh
//! succeeds, and keeps whatever it has when a refresh fails.

use crate::config::ExchangeRateConfig;
use crate::error::{HelioError, Result};
use crate::logging::{StructuredLogger, get_logger};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Rates used until the first successful fetch
pub const FALLBACK_RATES: &[(&str, f64)] = &[
    ("CZK", 25.0),
    ("PLN", 4.3),
    ("SEK", 11.5),
    ("NOK", 11.5),
    ("DKK", 7.45),
    ("HUF", 400.0),
    ("BGN", 1.96),
    ("RON", 5.0),
    ("CHF", 0.95),
    ("GBP", 0.85),
    ("EUR", 1.0),
];

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: BTreeMap<String, f64>,
}

/// Parse a `{"rates": {"CZK": 25.1, ...}}` body, keeping finite positive rates
pub fn parse_rates(body: &str) -> Result<BTreeMap<String, f64>> {
    let response: RatesResponse = serde_json::from_str(body)
        .map_err(|e| HelioError::protocol(format!("Invalid rates body: {}", e)))?;
    Ok(response
        .rates
        .into_iter()
        .filter(|(_, rate)| rate.is_finite() && *rate > 0.0)
        .map(|(code, rate)| (code.to_uppercase(), rate))
        .collect())
}

pub struct ExchangeRateService {
    config: ExchangeRateConfig,
    client: reqwest::Client,
    logger: StructuredLogger,
    rates: BTreeMap<String, f64>,
    last_update: Option<DateTime<Utc>>,
    last_attempt: Option<DateTime<Utc>>,
}

impl ExchangeRateService {
    pub fn new(config: ExchangeRateConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;
        let rates = FALLBACK_RATES
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect();
        Ok(Self {
            config,
            client,
            logger: get_logger("rates"),
            rates,
            last_update: None,
            last_attempt: None,
        })
    }

    /// EUR -> `currency` rate. EUR and unknown currencies yield 1.0.
    pub fn get_rate(&self, currency: &str) -> f64 {
        self.rates
            .get(&currency.trim().to_uppercase())
            .copied()
            .unwrap_or(1.0)
    }

    pub fn rates(&self) -> &BTreeMap<String, f64> {
        &self.rates
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Time of the most recent fetch, successful or not
    pub fn last_attempt(&self) -> Option<DateTime<Utc>> {
        self.last_attempt
    }

    /// Whether any rates have been fetched (as opposed to fallbacks only)
    pub fn has_fetched_rates(&self) -> bool {
        self.last_update.is_some()
    }

    /// A failed fetch is retried after `retry_minutes`, a successful one is
    /// kept for `refresh_hours`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if let Some(attempt) = self.last_attempt {
            let failed = self.last_update.is_none_or(|ok| ok < attempt);
            if failed {
                let backoff = Duration::minutes(i64::from(self.config.retry_minutes));
                return now - attempt >= backoff;
            }
        }
        match self.last_update {
            Some(last) => now - last >= Duration::hours(i64::from(self.config.refresh_hours)),
            None => true,
        }
    }

    pub async fn refresh_if_due(&mut self) -> bool {
        self.refresh_if_due_at(Utc::now()).await
    }

    /// Refresh when [`is_due`](Self::is_due) says so.
    ///
    /// Returns true when fetched rates are held afterwards, fresh or cached.
    /// Failures are logged and the previous rates stay in place.
    pub async fn refresh_if_due_at(&mut self, now: DateTime<Utc>) -> bool {
        if !self.config.enabled {
            return false;
        }
        if !self.is_due(now) {
            self.logger.debug("Using cached exchange rates");
            return self.has_fetched_rates();
        }
        match self.fetch_at(now).await {
            Ok(count) => {
                self.logger
                    .info(&format!("Updated {} exchange rates", count));
                true
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Exchange rate refresh failed: {}", e));
                self.has_fetched_rates()
            }
        }
    }

    /// Fetch unconditionally and merge the result into the cache
    pub async fn fetch_at(&mut self, now: DateTime<Utc>) -> Result<usize> {
        self.last_attempt = Some(now);
        let resp = self.client.get(&self.config.url).send().await?;
        if !resp.status().is_success() {
            return Err(HelioError::http(resp.status().as_u16()));
        }
        let body = resp.text().await?;
        let fetched = parse_rates(&body)?;
        let count = fetched.len();
        self.rates.extend(fetched);
        self.rates.insert("EUR".to_string(), 1.0);
        self.last_update = Some(now);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ExchangeRateService {
        ExchangeRateService::new(ExchangeRateConfig::default()).unwrap()
    }

    #[test]
    fn fallbacks_before_first_fetch() {
        let svc = service();
        assert_eq!(svc.get_rate("CZK"), 25.0);
        assert_eq!(svc.get_rate("gbp"), 0.85);
        assert_eq!(svc.get_rate("EUR"), 1.0);
        assert_eq!(svc.get_rate("XYZ"), 1.0);
        assert!(!svc.has_fetched_rates());
    }

    #[test]
    fn parse_rates_filters_garbage() {
        let rates = parse_rates(r#"{"amount":1.0,"base":"EUR","rates":{"CZK":24.6,"pln":4.25,"BAD":-1}}"#)
            .unwrap();
        assert_eq!(rates.get("CZK"), Some(&24.6));
        assert_eq!(rates.get("PLN"), Some(&4.25));
        assert!(!rates.contains_key("BAD"));

        assert!(matches!(
            parse_rates(r#"{"base":"EUR"}"#),
            Err(HelioError::Protocol { .. })
        ));
    }

    #[test]
    fn due_after_refresh_window() {
        let mut svc = service();
        let t0 = Utc::now();
        assert!(svc.is_due(t0));
        svc.last_update = Some(t0);
        assert!(!svc.is_due(t0 + Duration::hours(23)));
        assert!(svc.is_due(t0 + Duration::hours(24)));
    }

    #[test]
    fn failed_attempt_backs_off() {
        let mut svc = service();
        let t0 = Utc::now();
        svc.last_attempt = Some(t0);
        assert!(!svc.is_due(t0 + Duration::minutes(59)));
        assert!(svc.is_due(t0 + Duration::minutes(60)));

        // a failure after a good fetch also waits out the backoff
        svc.last_update = Some(t0 - Duration::hours(30));
        assert!(!svc.is_due(t0 + Duration::minutes(10)));
    }

    #[tokio::test]
    async fn disabled_service_never_fetches() {
        let mut svc = service();
        assert!(!svc.refresh_if_due().await);
        assert_eq!(svc.get_rate("CZK"), 25.0);
    }
}
