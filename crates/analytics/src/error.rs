use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid trade: {0}")]
    InvalidTrade(String),

    #[error("Trade {0} is already closed")]
    TradeAlreadyClosed(String),

    #[error("Cannot add open trade {0} to a backtest result")]
    OpenTrade(String),

    #[error("Invalid backtest result: {0}")]
    InvalidResult(String),
}
