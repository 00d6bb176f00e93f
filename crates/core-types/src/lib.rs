//! # Crypgo Core Types
//!
//! Layer 0 of the workspace. Every other crate speaks in these types: the
//! immutable `Candle`, the `Decision` a strategy produces, and the `TradingBot`
//! that owns position state.
//!
//! ## Public API
//!
//! - `Candle`: a validated OHLCV bar.
//! - `Decision`, `BotStatus`, `OrderSide`, `StrategyId`: closed enums shared by all layers.
//! - `TradingBot`: the bot's lifecycle and position state machine.
//! - `PositionView`: a read-only snapshot of the bot handed to strategies.
//! - `TradingDecisionLog`: one record per evaluated decision, for persistence.

pub mod bot;
pub mod candle;
pub mod decision_log;
pub mod enums;
pub mod error;

pub use bot::{BotSettings, PositionView, TradingBot};
pub use candle::Candle;
pub use decision_log::TradingDecisionLog;
pub use enums::{BotStatus, Decision, OrderSide, StrategyId};
pub use error::CoreError;
