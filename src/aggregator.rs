use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

use crate::bitcoin::BitcoinProvider;
use crate::chain::ChainProvider;
use crate::classify::classify;
use crate::config::{ChainType, Config, InferencePolicy};
use crate::error::FetchError;
use crate::ethereum::EthereumProvider;
use crate::price::{CoinGeckoSource, PriceCache, Prices, SystemClock};
use crate::report::Report;
use crate::solana::SolanaProvider;
use crate::types::{BalanceResult, WalletRef};

/// A registered chain: how to fetch it and which asset prices it
pub struct ChainEntry {
    pub provider: Arc<dyn ChainProvider>,
    pub price_id: Option<String>,
}

/// Fans wallet lookups out over the chain providers and joins them with prices
pub struct Aggregator {
    chains: HashMap<String, ChainEntry>,
    prices: PriceCache,
    policy: InferencePolicy,
    max_concurrency: usize,
}

impl Aggregator {
    pub fn new(chains: HashMap<String, ChainEntry>, prices: PriceCache) -> Self {
        Self {
            chains,
            prices,
            policy: InferencePolicy::default(),
            max_concurrency: 8,
        }
    }

    pub fn with_policy(mut self, policy: InferencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Build providers for every configured chain plus the shared price cache
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.timeout();
        let mut chains = HashMap::new();

        for (id, chain) in &config.chains {
            let provider: Arc<dyn ChainProvider> = match chain.chain_type {
                ChainType::Evm => Arc::new(EthereumProvider::new(
                    chain.rpc.clone(),
                    chain.native_token.symbol.clone(),
                    chain.native_token.decimals,
                    timeout,
                )),
                ChainType::Bitcoin => Arc::new(
                    BitcoinProvider::new(chain.rpc.clone(), timeout)
                        .with_context(|| format!("failed to set up provider for {id}"))?,
                ),
                ChainType::Solana => Arc::new(SolanaProvider::new(chain.rpc.clone(), timeout)),
            };
            chains.insert(
                id.to_lowercase(),
                ChainEntry {
                    provider,
                    price_id: chain.price_id.clone(),
                },
            );
        }

        let source = CoinGeckoSource::new(&config.price.endpoint, &config.price.currency, timeout)
            .context("failed to set up price source")?;
        let prices = PriceCache::new(Arc::new(source), Arc::new(SystemClock), config.price_ttl())
            .with_always_include(config.price.always_include.clone());

        Ok(Self::new(chains, prices)
            .with_policy(config.inference)
            .with_max_concurrency(config.max_concurrency))
    }

    pub fn classify_all(&self, tokens: &[String]) -> Vec<WalletRef> {
        tokens.iter().map(|raw| classify(raw, self.policy)).collect()
    }

    /// Classify, price and fetch every token; one result per token in input order.
    pub async fn run(&self, tokens: &[String]) -> Report {
        let wallets = self.classify_all(tokens);
        let results = self.aggregate(wallets).await;
        let report = Report::new(results);
        info!(
            wallets = report.results.len(),
            failed = report.failures(),
            usd_total = report.total.usd,
            "aggregation finished"
        );
        report
    }

    pub async fn aggregate(&self, wallets: Vec<WalletRef>) -> Vec<BalanceResult> {
        let price_ids: BTreeSet<String> = wallets
            .iter()
            .filter_map(|w| self.chains.get(&w.chain)?.price_id.clone())
            .collect();

        // every wallet in this run values against the same snapshot
        let prices = self.prices.get_prices(price_ids).await;

        stream::iter(wallets)
            .map(|wallet| self.fetch_one(wallet, &prices))
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    async fn fetch_one(&self, wallet: WalletRef, prices: &Prices) -> BalanceResult {
        let Some(entry) = self.chains.get(&wallet.chain) else {
            warn!(chain = %wallet.chain, address = %wallet.address, "unsupported chain");
            let err = FetchError::UnsupportedChain(wallet.chain.clone());
            return BalanceResult {
                wallet,
                balance: Err(err),
                usd_value: None,
            };
        };

        let balance = entry.provider.get_native_balance(&wallet.address).await;

        let usd_value = match &balance {
            Ok(balance) => entry
                .price_id
                .as_ref()
                .and_then(|id| prices.get(id))
                .map(|price| balance.native_amount() * price),
            Err(e) => {
                warn!(chain = %wallet.chain, address = %wallet.address, error = %e, "balance fetch failed");
                None
            }
        };

        BalanceResult {
            wallet,
            balance,
            usd_value,
        }
    }
}
