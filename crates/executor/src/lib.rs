//! # Crypgo Executor Crate
//!
//! Order pre-flight checks against exchange trading rules. Before any order leaves
//! the process its quantity and price are validated against the symbol's lot size,
//! price filter and minimum notional.
//!
//! ## Public API
//!
//! - `SymbolFilter`: the immutable trading rules for one symbol.
//! - `OrderValidator` / `OrderValidationResult`: validate, auto-correct the quantity
//!   onto the step grid, and format it for the order payload.
//! - `ExchangeInfo`: the metadata source trait, with `InMemoryExchangeInfo` as a cache.
//! - `ExecutorError`, `FilterViolation`: the error types of this crate.

pub mod error;
pub mod exchange;
pub mod filter;
pub mod validator;

pub use error::{ExecutorError, FilterViolation};
pub use exchange::{ExchangeInfo, InMemoryExchangeInfo};
pub use filter::{ExchangeFilters, LotSizeFilter, PriceFilter, SymbolFilter};
pub use validator::{OrderValidationResult, OrderValidator};
