use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::Balance;

/// Trait for chain providers - implement this for each blockchain family
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Get the native token balance for an address
    async fn get_native_balance(&self, address: &str) -> Result<Balance, FetchError>;
}
