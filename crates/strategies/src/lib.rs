//! # Crypgo Strategy Library
//!
//! This crate contains the trading decision logic. It defines a universal `Strategy`
//! trait and provides the concrete evaluators behind it.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of exchanges,
//!   persistence or execution. It depends only on `core-types` and `configuration`.
//! - **Read-only position:** Strategies receive a `PositionView` snapshot. They cannot
//!   mutate the bot; only the bot's own transitions can.
//! - **Always a decision:** Invalid parameters are rejected at construction. After that,
//!   `decide` never fails; short windows degrade to `Hold` with a diagnostic reason.
//!
//! ## Public API
//!
//! - `Strategy`: The core trait all strategies implement.
//! - `StrategyAnalysis` / `Diagnostics`: the decision plus its structured explanation.
//! - `TradingStrategy` and `create_strategy`: the closed variant set and its factory.
//! - The concrete strategy structs themselves (e.g., `MovingAverageStrategy`).

// Declare all the modules that constitute this crate.
pub mod analysis;
pub mod breakout;
pub mod error;
pub mod factory;
pub mod ma_crossover;
pub mod rsi;
pub mod spread;

// Re-export the key components to create a clean, public-facing API.
pub use analysis::{Diagnostics, StrategyAnalysis};
pub use breakout::BreakoutStrategy;
pub use error::StrategyError;
pub use factory::{create_strategy, default_config_for, TradingStrategy};
pub use ma_crossover::MovingAverageStrategy;
pub use rsi::{RsiSignal, RsiStrategy};
pub use spread::MinimumSpread;

pub use core_types::StrategyId;

use core_types::{Candle, PositionView};

/// The core trait that all trading strategies must implement.
///
/// This trait defines a common interface for the backtester and live trading engine,
/// allowing them to be strategy-agnostic. The `Send + Sync` bounds let one strategy
/// instance be shared by a bot's polling task.
pub trait Strategy: Send + Sync {
    /// Stable strategy name, recorded with every decision.
    fn name(&self) -> &'static str;

    /// The construction parameters, in the same map shape as the diagnostics.
    fn params(&self) -> Diagnostics;

    /// Number of candles needed before the strategy can do more than hold.
    fn min_candles(&self) -> usize;

    /// Evaluates the strategy over `window` (oldest first) and the current position.
    ///
    /// Deterministic for identical inputs. Never fails.
    fn decide(&self, window: &[Candle], position: &PositionView) -> StrategyAnalysis;
}
