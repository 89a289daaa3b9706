//! Turns raw command-line tokens into [`WalletRef`]s.
//!
//! Classification never fails. An explicit `chain:address` prefix is taken
//! verbatim (lower-cased chain id); unknown chain ids are rejected later by the
//! aggregator. Bare addresses are matched against known shapes and anything
//! unrecognised lands on [`DEFAULT_CHAIN`].

use crate::config::InferencePolicy;
use crate::types::WalletRef;

/// Chain assumed for bare addresses that match no known shape.
pub const DEFAULT_CHAIN: &str = "eth";

/// Legacy and P2SH bitcoin addresses are 26 or 34 characters long.
const BTC_ADDRESS_LENGTHS: [usize; 2] = [26, 34];

/// Split an explicit prefix or infer the chain from the address shape.
pub fn classify(raw: &str, policy: InferencePolicy) -> WalletRef {
    if let Some((chain, address)) = raw.split_once(':') {
        return WalletRef::new(chain.to_lowercase(), address);
    }

    WalletRef::new(infer_chain(raw, policy), raw)
}

fn infer_chain(address: &str, policy: InferencePolicy) -> &'static str {
    let len = address.chars().count();

    if address.starts_with("0x") {
        return "eth";
    }
    if address.starts_with("bc1") || BTC_ADDRESS_LENGTHS.contains(&len) {
        return "btc";
    }
    if policy == InferencePolicy::Extended && (address.starts_with("sol") || len > 30) {
        return "sol";
    }

    DEFAULT_CHAIN
}
