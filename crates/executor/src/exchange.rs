use crate::error::ExecutorError;
use crate::filter::{ExchangeFilters, SymbolFilter};
use std::collections::HashMap;

/// A source of per-symbol exchange rules.
///
/// Implementations are expected to cache; validation calls this on every order.
pub trait ExchangeInfo: Send + Sync {
    fn symbol_filter(&self, symbol: &str) -> Result<SymbolFilter, ExecutorError>;
}

/// An `ExchangeInfo` backed by a map, filled up front.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExchangeInfo {
    filters: HashMap<String, SymbolFilter>,
}

impl InMemoryExchangeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: SymbolFilter) -> Self {
        self.insert(filter);
        self
    }

    pub fn insert(&mut self, filter: SymbolFilter) {
        self.filters.insert(filter.symbol().to_uppercase(), filter);
    }

    /// Parses a JSON array of raw exchange filter groups.
    ///
    /// A symbol whose constraints are unusable is skipped with a warning, so looking
    /// it up later fails like any other unknown symbol.
    pub fn from_json(json: &str) -> Result<Self, ExecutorError> {
        let raw: Vec<ExchangeFilters> =
            serde_json::from_str(json).map_err(|e| ExecutorError::Metadata(e.to_string()))?;
        let mut info = Self::new();
        for filters in &raw {
            match SymbolFilter::from_exchange_filters(filters) {
                Ok(filter) => info.insert(filter),
                Err(e) => tracing::warn!(symbol = %filters.symbol, error = %e, "Skipping unusable exchange metadata"),
            }
        }
        tracing::debug!(symbols = info.len(), "Exchange metadata loaded");
        Ok(info)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl ExchangeInfo for InMemoryExchangeInfo {
    fn symbol_filter(&self, symbol: &str) -> Result<SymbolFilter, ExecutorError> {
        self.filters
            .get(&symbol.to_uppercase())
            .cloned()
            .ok_or_else(|| ExecutorError::SymbolNotFound(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let filter = SymbolFilter::new("BTCUSDT", 0.00001, 9000.0, 0.00001, 0.01, 1e6, 0.01, 5.0).unwrap();
        let info = InMemoryExchangeInfo::new().with_filter(filter.clone());
        assert_eq!(info.symbol_filter("btcusdt").unwrap(), filter);
        assert_eq!(
            info.symbol_filter("ETHUSDT").unwrap_err(),
            ExecutorError::SymbolNotFound("ETHUSDT".into())
        );
    }

    #[test]
    fn parses_partial_metadata() {
        let info = InMemoryExchangeInfo::from_json(
            r#"[
                {"symbol": "SOLUSDT",
                 "lotSize": {"minQty": 0.01, "maxQty": 90000, "stepSize": 0.01},
                 "minNotional": 5.0},
                {"symbol": "XRPUSDT"}
            ]"#,
        )
        .unwrap();
        assert_eq!(info.len(), 2);
        let sol = info.symbol_filter("SOLUSDT").unwrap();
        assert_eq!(sol.step_size(), 0.01);
        assert_eq!(sol.tick_size(), 0.01);
        assert_eq!(sol.min_notional(), 5.0);
        assert_eq!(info.symbol_filter("XRPUSDT").unwrap().step_size(), 1.0);
    }

    #[test]
    fn one_broken_symbol_does_not_drop_the_others() {
        let info = InMemoryExchangeInfo::from_json(
            r#"[
                {"symbol": "BTCUSDT",
                 "lotSize": {"minQty": 0.00001, "maxQty": 9000, "stepSize": 0.00001},
                 "priceFilter": {"minPrice": 0.01, "maxPrice": 1000000, "tickSize": 0.01}},
                {"symbol": "ODDUSDT",
                 "priceFilter": {"minPrice": 0, "maxPrice": 0, "tickSize": 0}},
                {"symbol": "BADUSDT",
                 "lotSize": {"minQty": 5, "maxQty": 1, "stepSize": 1}}
            ]"#,
        )
        .unwrap();
        assert_eq!(info.len(), 2);
        assert_eq!(info.symbol_filter("BTCUSDT").unwrap().step_size(), 0.00001);
        assert_eq!(info.symbol_filter("ODDUSDT").unwrap().max_price(), f64::MAX);
        assert_eq!(
            info.symbol_filter("BADUSDT").unwrap_err(),
            ExecutorError::SymbolNotFound("BADUSDT".into())
        );
    }

    #[test]
    fn malformed_json_is_a_metadata_error() {
        assert!(matches!(
            InMemoryExchangeInfo::from_json("{"),
            Err(ExecutorError::Metadata(_))
        ));
    }
}
