//! USD prices for the chains' reference assets.
//!
//! [`PriceCache`] holds one snapshot of the last successful batched lookup.
//! A refresh replaces the whole snapshot or leaves it alone; readers never
//! observe a half-updated mapping.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::FetchError;

/// Price id → price in the quote currency
pub type Prices = HashMap<String, f64>;

/// One batched price lookup for a set of asset ids.
///
/// Ids missing from the upstream response are simply absent from the result.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(&self, ids: &[String]) -> Result<Prices, FetchError>;
}

/// CoinGecko-compatible `/simple/price` source
pub struct CoinGeckoSource {
    client: Client,
    base: Url,
    currency: String,
}

impl CoinGeckoSource {
    pub fn new(endpoint: &str, currency: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base = Url::parse(endpoint)?;
        Ok(Self {
            client,
            base,
            currency: currency.to_lowercase(),
        })
    }

    fn parse_response(&self, body: &[u8]) -> Result<Prices, FetchError> {
        // { "bitcoin": {"usd": 64000.5}, "ethereum": {"usd": 3100.2} }
        let parsed: HashMap<String, HashMap<String, f64>> = serde_json::from_slice(body)
            .map_err(|e| FetchError::network(format!("malformed price response: {e}")))?;

        Ok(parsed
            .into_iter()
            .filter_map(|(id, quotes)| quotes.get(&self.currency).map(|px| (id, *px)))
            .collect())
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn fetch_prices(&self, ids: &[String]) -> Result<Prices, FetchError> {
        if ids.is_empty() {
            return Ok(Prices::new());
        }

        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("ids", &ids.join(","))
            .append_pair("vs_currencies", &self.currency);

        debug!(%url, "price lookup");
        let resp = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("price endpoint returned HTTP {status}")));
        }

        let body = resp.bytes().await?;
        self.parse_response(&body)
    }
}

/// Time source for cache freshness checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
///
/// Public so callers can drive a [`PriceCache`] through its TTL in their own
/// tests without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now: StdMutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: StdMutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct Snapshot {
    prices: Arc<Prices>,
    fetched_at: Option<Instant>,
}

/// Time-bounded cache over a [`PriceSource`]
pub struct PriceCache {
    source: Arc<dyn PriceSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    always_include: Vec<String>,
    // Held across the refresh so concurrent callers wait for one lookup.
    snapshot: Mutex<Snapshot>,
}

impl PriceCache {
    pub fn new(source: Arc<dyn PriceSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            always_include: vec!["bitcoin".to_string()],
            snapshot: Mutex::new(Snapshot {
                prices: Arc::new(Prices::new()),
                fetched_at: None,
            }),
        }
    }

    /// Ids quoted on every refresh regardless of the requested set
    pub fn with_always_include(mut self, ids: Vec<String>) -> Self {
        self.always_include = ids;
        self
    }

    /// Return prices for `ids`, refreshing in one batched call when stale.
    ///
    /// A fresh, non-empty snapshot is returned as-is even if it was fetched for
    /// a different id set. A failed refresh keeps and returns the previous
    /// snapshot, which may be empty.
    pub async fn get_prices<I, S>(&self, ids: I) -> Arc<Prices>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut snapshot = self.snapshot.lock().await;
        let now = self.clock.now();

        let fresh = snapshot
            .fetched_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.ttl);
        if fresh && !snapshot.prices.is_empty() {
            debug!(cached = snapshot.prices.len(), "price cache hit");
            return Arc::clone(&snapshot.prices);
        }

        let wanted: BTreeSet<String> = ids
            .into_iter()
            .map(Into::into)
            .chain(self.always_include.iter().cloned())
            .collect();
        let wanted: Vec<String> = wanted.into_iter().collect();

        match self.source.fetch_prices(&wanted).await {
            Ok(prices) => {
                info!(requested = wanted.len(), received = prices.len(), "price cache refreshed");
                *snapshot = Snapshot {
                    prices: Arc::new(prices),
                    fetched_at: Some(now),
                };
            }
            Err(e) => {
                warn!(error = %e, "price refresh failed, keeping previous prices");
            }
        }

        Arc::clone(&snapshot.prices)
    }
}
