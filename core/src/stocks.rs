use serde::{Deserialize, Serialize};

/// Maximum number of suggestions returned by [`search`].
pub const MAX_RESULTS: usize = 5;

// The shape of one ticker suggestion (matches what the search box renders)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
}

// Demo data only; prices are frozen.
const CATALOG: [(&str, &str, f64, f64); 10] = [
    ("AAPL", "Apple Inc.", 175.84, 2.4),
    ("MSFT", "Microsoft Corporation", 420.67, 1.8),
    ("AMZN", "Amazon.com Inc.", 151.23, -0.5),
    ("GOOGL", "Alphabet Inc.", 178.35, 3.2),
    ("TSLA", "Tesla Inc.", 248.92, -0.9),
    ("META", "Meta Platforms Inc.", 352.19, 1.2),
    ("NVDA", "NVIDIA Corporation", 875.45, 4.1),
    ("BRK.A", "Berkshire Hathaway Inc.", 542000.00, 0.3),
    ("JPM", "JPMorgan Chase & Co.", 178.92, 0.8),
    ("JNJ", "Johnson & Johnson", 156.78, -0.2),
];

/// Case-insensitive substring match on name or symbol, in catalog order,
/// capped at [`MAX_RESULTS`]. An empty query matches everything.
pub fn search(query: &str) -> Vec<Stock> {
    let needle = query.to_lowercase();
    CATALOG
        .iter()
        .filter(|(symbol, name, _, _)| {
            name.to_lowercase().contains(&needle) || symbol.to_lowercase().contains(&needle)
        })
        .take(MAX_RESULTS)
        .map(|&(symbol, name, price, change)| Stock {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            change,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(results: &[Stock]) -> Vec<&str> {
        results.iter().map(|s| s.symbol.as_str()).collect()
    }

    #[test]
    fn apple_matches_one() {
        let results = search("apple");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "AAPL");
        assert_eq!(results[0].name, "Apple Inc.");
    }

    #[test]
    fn inc_is_capped_at_five() {
        assert_eq!(symbols(&search("inc")), ["AAPL", "AMZN", "GOOGL", "TSLA", "META"]);
    }

    #[test]
    fn symbol_match_ignores_case() {
        assert_eq!(symbols(&search("nvda")), ["NVDA"]);
        assert_eq!(symbols(&search("brk.")), ["BRK.A"]);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(search("zzz").is_empty());
    }

    #[test]
    fn empty_query_returns_first_five() {
        assert_eq!(symbols(&search("")), ["AAPL", "MSFT", "AMZN", "GOOGL", "TSLA"]);
    }
}
