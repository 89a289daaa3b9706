mod aggregator;
mod bitcoin;
mod chain;
mod classify;
mod config;
mod error;
mod ethereum;
pub mod logging;
mod price;
mod report;
mod solana;
#[cfg(test)]
mod test_support;
mod types;

pub use aggregator::{Aggregator, ChainEntry};
pub use bitcoin::BitcoinProvider;
pub use chain::ChainProvider;
pub use classify::{classify, DEFAULT_CHAIN};
pub use config::{ChainConfig, ChainType, Config, InferencePolicy, PriceConfig, TokenInfo};
pub use error::{ErrorKind, FetchError};
pub use ethereum::EthereumProvider;
pub use price::{Clock, CoinGeckoSource, ManualClock, PriceCache, PriceSource, Prices, SystemClock};
pub use report::{elide_address, format_line, truncate_message, Report, MAX_ERROR_LEN};
pub use solana::SolanaProvider;
pub use types::{Balance, BalanceResult, NativeSubtotal, PortfolioTotal, WalletRef};

use anyhow::Result;

/// Check balances for raw wallet tokens using the given configuration
pub async fn check_wallets(config: &Config, tokens: &[String]) -> Result<Report> {
    let aggregator = Aggregator::from_config(config)?;
    Ok(aggregator.run(tokens).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_loads() {
        let config = Config::load();
        assert!(config.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_chain_reported_without_balance_fetch() {
        let mut config = Config::load().unwrap();
        // unroutable price endpoint: the refresh fails fast and degrades
        config.price.endpoint = "http://127.0.0.1:1/simple/price".to_string();

        let report = check_wallets(&config, &["xrp:abc123".to_string()])
            .await
            .unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(
            report.results[0].error().map(FetchError::kind),
            Some(ErrorKind::UnsupportedChain)
        );
        assert_eq!(report.total.usd, 0.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_check_mainnet_wallets() {
        let config = Config::load().unwrap();
        let report = check_wallets(
            &config,
            &[
                "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".to_string(),
                "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq".to_string(),
            ],
        )
        .await
        .unwrap();

        assert_eq!(report.failures(), 0);
        assert!(report.total.usd > 0.0);
    }
}
