use crate::models::Ticker24h;

use std::collections::HashSet;

/// 跌幅榜: the `n` worst 24h performers among `valid_symbols`.
///
/// An empty `valid_symbols` disables the filter.
pub fn top_losers(tickers: Vec<Ticker24h>, valid_symbols: &HashSet<String>, n: usize) -> Vec<Ticker24h> {
    let mut losers: Vec<Ticker24h> = tickers
        .into_iter()
        .filter(|t| valid_symbols.is_empty() || valid_symbols.contains(&t.symbol))
        .collect();

    losers.sort_by(|a, b| a.price_change_percent.total_cmp(&b.price_change_percent));
    losers.truncate(n);
    losers
}
