use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::BlockNumberOrTag;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::chain::ChainProvider;
use crate::error::FetchError;
use crate::types::Balance;

/// EVM chain provider using `eth_getBalance` over JSON-RPC.
///
/// Serves every EVM-compatible chain; only the endpoint and the native
/// symbol differ between them.
pub struct EthereumProvider {
    rpc_url: String,
    symbol: String,
    decimals: u8,
    timeout: Duration,
}

impl EthereumProvider {
    pub fn new(rpc_url: String, symbol: String, decimals: u8, timeout: Duration) -> Self {
        Self {
            rpc_url,
            symbol,
            decimals,
            timeout,
        }
    }

    pub fn new_mainnet() -> Self {
        Self::new(
            "https://eth.llamarpc.com".to_string(),
            "ETH".to_string(),
            18,
            Duration::from_secs(10),
        )
    }
}

#[async_trait]
impl ChainProvider for EthereumProvider {
    async fn get_native_balance(&self, address: &str) -> Result<Balance, FetchError> {
        let url = reqwest::Url::parse(&self.rpc_url).map_err(FetchError::network)?;
        let provider = ProviderBuilder::new().on_http(url);

        let addr: Address = address
            .parse()
            .map_err(|e| FetchError::network(format!("invalid address: {e}")))?;

        debug!(rpc = %self.rpc_url, %address, "eth_getBalance");
        let balance = tokio::time::timeout(
            self.timeout,
            provider
                .get_balance(addr)
                .block_id(BlockNumberOrTag::Latest.into()),
        )
        .await?
        .map_err(FetchError::network)?;

        Ok(Balance::new(
            self.symbol.clone(),
            balance.to_string(),
            self.decimals,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{canned_server, silent_server};

    const ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    fn local_provider(rpc_url: String) -> EthereumProvider {
        EthereumProvider::new(rpc_url, "ETH".to_string(), 18, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_invalid_address_is_network_error() {
        let provider = EthereumProvider::new(
            "http://127.0.0.1:1".to_string(),
            "ETH".to_string(),
            18,
            Duration::from_secs(1),
        );
        let err = provider.get_native_balance("not-an-address").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("invalid address"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let provider = EthereumProvider::new(
            "http://127.0.0.1:1".to_string(),
            "ETH".to_string(),
            18,
            Duration::from_secs(2),
        );
        let err = provider
            .get_native_balance("0x742d35Cc6634C0532925a3b844Bc454e4438f44e")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_hex_result_converted_from_wei() {
        let url =
            canned_server(200, r#"{"jsonrpc":"2.0","id":{id},"result":"0x22b1c8c1227a0000"}"#).await;

        let balance = local_provider(url).get_native_balance(ADDRESS).await.unwrap();
        assert_eq!(balance.symbol, "ETH");
        assert_eq!(balance.raw, "2500000000000000000");
        assert_eq!(balance.native_amount(), 2.5);
    }

    #[tokio::test]
    async fn test_rpc_error_object_is_network_error() {
        let url = canned_server(
            200,
            r#"{"jsonrpc":"2.0","id":{id},"error":{"code":-32602,"message":"Invalid param"}}"#,
        )
        .await;

        let err = local_provider(url).get_native_balance(ADDRESS).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("Invalid param"));
    }

    #[tokio::test]
    async fn test_missing_result_is_network_error() {
        let url = canned_server(200, r#"{"jsonrpc":"2.0","id":{id}}"#).await;

        let err = local_provider(url).get_native_balance(ADDRESS).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_unanswered_call_times_out() {
        let url = silent_server().await;

        let started = std::time::Instant::now();
        let err = local_provider(url).get_native_balance(ADDRESS).await.unwrap_err();
        assert_eq!(err, FetchError::Network("request timed out".to_string()));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_mainnet_balance() {
        let provider = EthereumProvider::new_mainnet();
        let address = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

        let balance = provider.get_native_balance(address).await.unwrap();
        assert_eq!(balance.symbol, "ETH");
        assert!(balance.native_amount() >= 0.0);
    }
}
