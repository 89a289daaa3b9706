use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Configuration for the tracker and all supported chains
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub inference: InferencePolicy,
    #[serde(default)]
    pub native_subtotals: bool,
    pub price: PriceConfig,
    pub chains: HashMap<String, ChainConfig>,
}

/// How a bare address (no `chain:` prefix) is assigned to a chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InferencePolicy {
    /// `0x` → eth, bitcoin shapes → btc, everything else → eth.
    Basic,
    /// Like `Basic`, plus a Solana step before the eth fallback.
    #[default]
    Extended,
}

/// Batched price lookup endpoint and cache policy
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceConfig {
    pub endpoint: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_always_include")]
    pub always_include: Vec<String>,
}

/// Protocol family used to query a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Evm,
    Bitcoin,
    Solana,
}

/// Configuration for a single chain
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
    #[serde(rename = "type")]
    pub chain_type: ChainType,
    pub name: String,
    pub rpc: String,
    #[serde(rename = "nativeToken")]
    pub native_token: TokenInfo,
    #[serde(rename = "priceId", skip_serializing_if = "Option::is_none")]
    pub price_id: Option<String>,
}

/// Native token information from config
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

/// Largest accepted `nativeToken.decimals`
pub const MAX_DECIMALS: u8 = 38;

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_concurrency() -> usize {
    8
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_always_include() -> Vec<String> {
    vec!["bitcoin".to_string()]
}

impl Config {
    /// Load configuration from embedded JSON
    pub fn load() -> Result<Self> {
        let config_str = include_str!("../config.json");
        Self::from_json(config_str).context("embedded config.json is invalid")
    }

    /// Load configuration from a JSON file with the same shape as the embedded one
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&config_str)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(config_str: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (id, chain) in &self.chains {
            if chain.native_token.decimals > MAX_DECIMALS {
                bail!(
                    "chain {id}: nativeToken.decimals {} exceeds {MAX_DECIMALS}",
                    chain.native_token.decimals
                );
            }
        }
        Ok(())
    }

    /// Get a specific chain configuration
    pub fn get_chain(&self, chain_name: &str) -> Option<&ChainConfig> {
        self.chains.get(chain_name)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn price_ttl(&self) -> Duration {
        Duration::from_secs(self.price.ttl_secs)
    }
}
