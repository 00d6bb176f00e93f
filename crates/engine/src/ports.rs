//! The boundaries the live engine talks through. Exchange connectivity and
//! persistence live behind these traits.

use crate::error::EngineError;
use async_trait::async_trait;
use core_types::{Candle, OrderSide, TradingBot, TradingDecisionLog};
use uuid::Uuid;

/// What the exchange reports back for a filled market order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub order_id: String,
    pub side: OrderSide,
    pub executed_quantity: f64,
    /// Average fill price; `None` when the exchange did not report one.
    pub average_price: Option<f64>,
}

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// The most recent `limit` candles, oldest first.
    async fn fetch_window(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>, EngineError>;
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Places a market order. `quantity` is already formatted to the symbol's step size.
    async fn place_market_order(&self, symbol: &str, side: OrderSide, quantity: &str) -> Result<OrderReceipt, EngineError>;
}

#[async_trait]
pub trait BotRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<TradingBot>, EngineError>;
    async fn update(&self, bot: &TradingBot) -> Result<(), EngineError>;
    /// Persists only the position state of `bot`; the stored status is left as is,
    /// so a concurrent stop is never overwritten by a trading cycle.
    async fn save_position(&self, bot: &TradingBot) -> Result<(), EngineError>;
}

#[async_trait]
pub trait DecisionLogRepository: Send + Sync {
    async fn save(&self, log: &TradingDecisionLog) -> Result<(), EngineError>;
}
