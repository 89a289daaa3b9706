use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::chain::ChainProvider;
use crate::error::FetchError;
use crate::types::Balance;

/// Bitcoin provider backed by an Esplora-style block explorer REST API
pub struct BitcoinProvider {
    client: Client,
    base_url: String,
}

/// Subset of `GET /address/{address}` we rely on
#[derive(Debug, Deserialize)]
struct AddressInfo {
    chain_stats: ChainStats,
}

#[derive(Debug, Deserialize)]
struct ChainStats {
    funded_txo_sum: u64,
}

impl BitcoinProvider {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn new_blockstream() -> Result<Self, FetchError> {
        Self::new(
            "https://blockstream.info/api".to_string(),
            Duration::from_secs(10),
        )
    }
}

/// Balance is the cumulative funded amount, not net of spent outputs.
fn parse_address_info(body: &[u8]) -> Result<Balance, FetchError> {
    let info: AddressInfo = serde_json::from_slice(body)
        .map_err(|e| FetchError::network(format!("malformed explorer response: {e}")))?;

    Ok(Balance::new(
        "BTC".to_string(),
        info.chain_stats.funded_txo_sum.to_string(),
        8,
    ))
}

#[async_trait]
impl ChainProvider for BitcoinProvider {
    async fn get_native_balance(&self, address: &str) -> Result<Balance, FetchError> {
        let url = format!("{}/address/{}", self.base_url, address);
        debug!(%url, "explorer address lookup");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("explorer returned HTTP {status}")));
        }

        let body = resp.bytes().await?;
        parse_address_info(&body)
    }
}
