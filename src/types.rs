use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::FetchError;

/// A wallet tagged with the chain it should be queried on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletRef {
    pub chain: String,
    pub address: String,
}

impl WalletRef {
    pub fn new(chain: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            address: address.into(),
        }
    }
}

/// Native balance with raw smallest-unit amount and decimals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub symbol: String,
    pub raw: String,
    pub decimals: u8,
}

impl Balance {
    pub fn new(symbol: String, raw: String, decimals: u8) -> Self {
        Self {
            symbol,
            raw,
            decimals,
        }
    }

    /// Amount in display denomination (ETH, BTC, SOL, ...)
    pub fn native_amount(&self) -> f64 {
        self.raw
            .parse::<f64>()
            .map(|units| units / 10f64.powi(self.decimals as i32))
            .unwrap_or(0.0)
    }
}

/// Outcome of one wallet lookup. `balance` holds either the amount or the error.
#[derive(Debug, Clone)]
pub struct BalanceResult {
    pub wallet: WalletRef,
    pub balance: Result<Balance, FetchError>,
    /// Present only when the balance was fetched and a price is known.
    pub usd_value: Option<f64>,
}

impl BalanceResult {
    pub fn native_amount(&self) -> Option<f64> {
        self.balance.as_ref().ok().map(Balance::native_amount)
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.balance.as_ref().err()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NativeSubtotal {
    pub amount: f64,
    /// At least one contributing wallet had no USD price.
    pub unpriced: bool,
}

/// Running totals over successful wallet results
#[derive(Debug, Clone, Default, Serialize)]
pub struct PortfolioTotal {
    pub usd: f64,
    /// Keyed by native symbol, so chains sharing a unit (ETH on L2s) add up together.
    pub native: BTreeMap<String, NativeSubtotal>,
}

impl PortfolioTotal {
    pub fn add(&mut self, result: &BalanceResult) {
        let Ok(balance) = &result.balance else {
            return;
        };

        let subtotal = self.native.entry(balance.symbol.clone()).or_default();
        subtotal.amount += balance.native_amount();

        match result.usd_value {
            Some(usd) => self.usd += usd,
            None => subtotal.unpriced = true,
        }
    }

    pub fn has_unpriced(&self) -> bool {
        self.native.values().any(|s| s.unpriced)
    }
}
