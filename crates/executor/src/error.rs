use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("Invalid symbol filter: {0}")]
    InvalidFilter(String),

    #[error("No exchange metadata for symbol: {0}")]
    SymbolNotFound(String),

    #[error("Failed to parse exchange metadata: {0}")]
    Metadata(String),

    #[error("Order validation failed for {symbol}: {}", errors.join("; "))]
    OrderRejected { symbol: String, errors: Vec<String> },
}

/// A single exchange-rule violation. Its `Display` output is what ends up in the
/// validation error list.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterViolation {
    #[error("quantity {quantity:.8} is below minimum {min:.8} for {symbol}")]
    QuantityBelowMinimum { symbol: String, quantity: f64, min: f64 },

    #[error("quantity {quantity:.8} exceeds maximum {max:.8} for {symbol}")]
    QuantityAboveMaximum { symbol: String, quantity: f64, max: f64 },

    #[error("quantity {quantity:.8} does not comply with step size {step:.8} for {symbol}")]
    StepSize { symbol: String, quantity: f64, step: f64 },

    #[error("price {price:.8} is below minimum {min:.8} for {symbol}")]
    PriceBelowMinimum { symbol: String, price: f64, min: f64 },

    #[error("price {price:.8} exceeds maximum {max:.8} for {symbol}")]
    PriceAboveMaximum { symbol: String, price: f64, max: f64 },

    #[error("price {price:.8} does not comply with tick size {tick:.8} for {symbol}")]
    TickSize { symbol: String, price: f64, tick: f64 },

    #[error("notional value {notional:.2} is below minimum {min:.2} for {symbol}")]
    Notional { symbol: String, notional: f64, min: f64 },
}
