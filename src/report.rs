use chrono::{DateTime, Local};

use crate::types::{BalanceResult, PortfolioTotal};

/// Longest error message shown on a wallet line
pub const MAX_ERROR_LEN: usize = 50;

const SEPARATOR_WIDTH: usize = 60;

/// Shorten an address to `prefix...suffix` form (6 leading, 4 trailing chars).
pub fn elide_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 13 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Cut a message to at most `max` characters, marking the cut with `...`.
pub fn truncate_message(msg: &str, max: usize) -> String {
    if msg.chars().count() <= max {
        return msg.to_string();
    }
    let kept: String = msg.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Render one wallet line.
pub fn format_line(result: &BalanceResult) -> String {
    let label = format!(
        "{:<9} {}",
        result.wallet.chain,
        elide_address(&result.wallet.address)
    );

    match &result.balance {
        Ok(balance) => {
            let usd = match result.usd_value {
                Some(v) => format!("(${v:.2})"),
                None => "(price n/a)".to_string(),
            };
            format!(
                "+ {label}: {:.4} {} {usd}",
                balance.native_amount(),
                balance.symbol
            )
        }
        Err(e) => format!(
            "! {label}: ERROR {}",
            truncate_message(&e.to_string(), MAX_ERROR_LEN)
        ),
    }
}

/// Result of one aggregation run, in input order
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub results: Vec<BalanceResult>,
    pub total: PortfolioTotal,
}

impl Report {
    pub fn new(results: Vec<BalanceResult>) -> Self {
        let mut total = PortfolioTotal::default();
        for result in &results {
            total.add(result);
        }
        Self {
            generated_at: Local::now(),
            results,
            total,
        }
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.error().is_some()).count()
    }

    /// Summary lines. Native subtotals appear when requested or when some
    /// native unit could not be valued in USD.
    pub fn summary_lines(&self, native_subtotals: bool) -> Vec<String> {
        let mut lines = vec![format!(
            "Total: ${:.2} across {} wallet(s), {} failed",
            self.total.usd,
            self.results.len(),
            self.failures()
        )];

        if native_subtotals || self.total.has_unpriced() {
            for (symbol, subtotal) in &self.total.native {
                if native_subtotals || subtotal.unpriced {
                    let marker = if subtotal.unpriced { " (no price)" } else { "" };
                    lines.push(format!("  {:.4} {symbol}{marker}", subtotal.amount));
                }
            }
        }

        lines
    }

    pub fn render(&self, native_subtotals: bool) -> String {
        let separator = "=".repeat(SEPARATOR_WIDTH);
        let mut out = vec![
            format!(
                "Wallet balances - {}",
                self.generated_at.format("%Y-%m-%d %H:%M")
            ),
            separator.clone(),
        ];
        out.extend(self.results.iter().map(format_line));
        out.push(separator);
        out.extend(self.summary_lines(native_subtotals));
        out.join("\n")
    }
}
