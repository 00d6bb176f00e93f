//! # Crypgo Analytics
//!
//! The "unbiased judge" of a backtest: closed trades go in, performance statistics
//! come out.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` (Layer 0).
//! - **Incremental, never retroactive:** `BacktestResult` updates its statistics once per
//!   added trade. Drawdown is recomputed from the full capital history each time, which
//!   keeps it trivially monotonic.
//!
//! ## Public API
//!
//! - `BacktestTrade`: one simulated round trip.
//! - `BacktestResult`: the aggregator; `BacktestSummary` is its flat, serializable report.
//! - `WinRate`, `Drawdown`: the derived metrics.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod metrics;
pub mod report;
pub mod result;
pub mod trade;

// Re-export the key components to create a clean, public-facing API.
pub use error::AnalyticsError;
pub use metrics::{Drawdown, WinRate};
pub use report::BacktestSummary;
pub use result::BacktestResult;
pub use trade::BacktestTrade;
