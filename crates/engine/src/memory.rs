//! In-memory collaborators for paper runs and tests.

use crate::error::EngineError;
use crate::ports::{BotRepository, DecisionLogRepository, MarketDataSource, OrderGateway, OrderReceipt};
use async_trait::async_trait;
use core_types::{Candle, OrderSide, TradingBot, TradingDecisionLog};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Serves fixed candle series keyed by symbol.
///
/// With `advance` enabled each fetch moves the visible end of the series one candle
/// forward, which replays history as if it were arriving live.
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    series: Mutex<HashMap<String, Vec<Candle>>>,
    cursor: Mutex<HashMap<String, usize>>,
    advance: bool,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that reveals one more candle per fetch, starting from `initial` candles.
    pub fn replaying(symbol: &str, candles: Vec<Candle>, initial: usize) -> Self {
        let key = symbol.to_uppercase();
        Self {
            cursor: Mutex::new(HashMap::from([(key.clone(), initial.max(1))])),
            series: Mutex::new(HashMap::from([(key, candles)])),
            advance: true,
        }
    }

    pub async fn set_candles(&self, symbol: &str, candles: Vec<Candle>) {
        self.series.lock().await.insert(symbol.to_uppercase(), candles);
    }
}

#[async_trait]
impl MarketDataSource for InMemoryMarketData {
    async fn fetch_window(&self, symbol: &str, _interval: &str, limit: usize) -> Result<Vec<Candle>, EngineError> {
        let key = symbol.to_uppercase();
        let series = self.series.lock().await;
        let candles = series
            .get(&key)
            .ok_or_else(|| EngineError::MarketData(format!("no market data for {symbol}")))?;

        let end = if self.advance {
            let mut cursor = self.cursor.lock().await;
            let position = cursor.entry(key).or_insert(1);
            let end = (*position).min(candles.len());
            *position += 1;
            end
        } else {
            candles.len()
        };
        let start = end.saturating_sub(limit);
        Ok(candles[start..end].to_vec())
    }
}

/// An order as it reached the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: String,
}

/// Fills every market order immediately and keeps a record of it.
#[derive(Debug, Default)]
pub struct RecordingOrderGateway {
    placed: Mutex<Vec<PlacedOrder>>,
    fail_with: Option<String>,
}

impl RecordingOrderGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that refuses every order with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            placed: Mutex::default(),
            fail_with: Some(message.into()),
        }
    }

    pub async fn placed(&self) -> Vec<PlacedOrder> {
        self.placed.lock().await.clone()
    }
}

#[async_trait]
impl OrderGateway for RecordingOrderGateway {
    async fn place_market_order(&self, symbol: &str, side: OrderSide, quantity: &str) -> Result<OrderReceipt, EngineError> {
        if let Some(message) = &self.fail_with {
            return Err(EngineError::Order(message.clone()));
        }
        let executed_quantity: f64 = quantity
            .parse()
            .map_err(|_| EngineError::Order(format!("invalid quantity '{quantity}'")))?;

        let mut placed = self.placed.lock().await;
        placed.push(PlacedOrder {
            symbol: symbol.to_string(),
            side,
            quantity: quantity.to_string(),
        });
        Ok(OrderReceipt {
            order_id: format!("paper-{}", placed.len()),
            side,
            executed_quantity,
            average_price: None,
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBotRepository {
    bots: Mutex<HashMap<Uuid, TradingBot>>,
}

impl InMemoryBotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, bot: TradingBot) {
        self.bots.lock().await.insert(bot.id(), bot);
    }
}

#[async_trait]
impl BotRepository for InMemoryBotRepository {
    async fn get(&self, id: Uuid) -> Result<Option<TradingBot>, EngineError> {
        Ok(self.bots.lock().await.get(&id).cloned())
    }

    async fn update(&self, bot: &TradingBot) -> Result<(), EngineError> {
        let mut bots = self.bots.lock().await;
        match bots.get_mut(&bot.id()) {
            Some(stored) => {
                *stored = bot.clone();
                Ok(())
            }
            None => Err(EngineError::BotNotFound(bot.id())),
        }
    }

    async fn save_position(&self, bot: &TradingBot) -> Result<(), EngineError> {
        let mut bots = self.bots.lock().await;
        let stored = bots.get_mut(&bot.id()).ok_or(EngineError::BotNotFound(bot.id()))?;
        stored.adopt_position(bot)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDecisionLog {
    logs: Mutex<Vec<TradingDecisionLog>>,
}

impl InMemoryDecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<TradingDecisionLog> {
        self.logs.lock().await.clone()
    }

    pub async fn for_bot(&self, bot_id: Uuid) -> Vec<TradingDecisionLog> {
        self.logs
            .lock()
            .await
            .iter()
            .filter(|log| log.bot_id == bot_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DecisionLogRepository for InMemoryDecisionLog {
    async fn save(&self, log: &TradingDecisionLog) -> Result<(), EngineError> {
        self.logs.lock().await.push(log.clone());
        Ok(())
    }
}
