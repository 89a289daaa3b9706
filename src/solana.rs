use async_trait::async_trait;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::chain::ChainProvider;
use crate::error::FetchError;
use crate::types::Balance;

/// Solana chain provider using JSON-RPC `getBalance`
pub struct SolanaProvider {
    client: RpcClient,
}

impl SolanaProvider {
    pub fn new(rpc_url: String, timeout: Duration) -> Self {
        Self {
            client: RpcClient::new_with_timeout(rpc_url, timeout),
        }
    }

    pub fn new_mainnet() -> Self {
        Self::new(
            "https://api.mainnet-beta.solana.com".to_string(),
            Duration::from_secs(10),
        )
    }
}

impl From<ClientError> for FetchError {
    fn from(err: ClientError) -> Self {
        // ClientError's Display carries the RPC error message when one was returned
        FetchError::network(err)
    }
}

#[async_trait]
impl ChainProvider for SolanaProvider {
    async fn get_native_balance(&self, address: &str) -> Result<Balance, FetchError> {
        let pubkey = Pubkey::from_str(address)
            .map_err(|e| FetchError::network(format!("invalid address: {e}")))?;

        debug!(rpc = %self.client.url(), %address, "getBalance");
        let lamports = self.client.get_balance(&pubkey).await?;

        Ok(Balance::new(
            "SOL".to_string(),
            lamports.to_string(),
            9, // SOL has 9 decimals
        ))
    }
}
