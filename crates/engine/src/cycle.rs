use crate::error::EngineError;
use crate::ports::{BotRepository, DecisionLogRepository, MarketDataSource, OrderGateway};
use chrono::Utc;
use configuration::{BacktestSettings, LiveSettings};
use core_types::{Decision, OrderSide, TradingBot, TradingDecisionLog};
use executor::{ExchangeInfo, OrderValidator};
use std::sync::Arc;
use strategies::{Strategy, TradingStrategy};

/// Upper bound on the candles requested per cycle.
pub const MAX_WINDOW: usize = 100;

/// What one cycle ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No order: the decision was Hold, or it did not apply to the bot's position.
    Held { decision: Decision },
    /// A buy was filled and the bot is now positioned.
    Bought { quantity: f64, price: f64 },
    /// A sell was filled and the bot is flat again.
    Sold { quantity: f64, price: f64, profit_pct: f64 },
    /// The order failed pre-flight validation and was not sent.
    Rejected { side: OrderSide, errors: Vec<String> },
}

/// The shared collaborators of a live bot.
#[derive(Clone)]
pub struct CyclePorts {
    pub market_data: Arc<dyn MarketDataSource>,
    pub orders: Arc<dyn OrderGateway>,
    pub exchange: Arc<dyn ExchangeInfo>,
    pub bots: Arc<dyn BotRepository>,
    pub decisions: Arc<dyn DecisionLogRepository>,
}

/// One decide-validate-execute pass for a live bot.
///
/// The cycle owns no bot state. The caller hands in the bot, the cycle mutates it
/// only after an order was accepted by the gateway and persists its position right
/// away. The stored status belongs to `start_bot`/`stop_bot`.
pub struct TradingCycle {
    strategy: TradingStrategy,
    validator: OrderValidator,
    ports: CyclePorts,
    interval: String,
    window_limit: usize,
}

impl TradingCycle {
    pub fn new(strategy: TradingStrategy, ports: CyclePorts, interval: impl Into<String>, window_limit: usize) -> Self {
        Self {
            strategy,
            validator: OrderValidator::new(),
            ports,
            interval: interval.into(),
            window_limit: window_limit.clamp(1, MAX_WINDOW),
        }
    }

    /// Uses the configured candle interval and the live window limit.
    pub fn from_settings(
        strategy: TradingStrategy,
        ports: CyclePorts,
        market: &BacktestSettings,
        live: &LiveSettings,
    ) -> Self {
        Self::new(strategy, ports, market.interval.clone(), live.window_limit)
    }

    pub fn strategy(&self) -> &TradingStrategy {
        &self.strategy
    }

    pub fn ports(&self) -> &CyclePorts {
        &self.ports
    }

    pub fn window_limit(&self) -> usize {
        self.window_limit
    }

    pub async fn execute(&self, bot: &mut TradingBot) -> Result<CycleOutcome, EngineError> {
        let symbol = bot.symbol().to_string();
        let window = self
            .ports
            .market_data
            .fetch_window(&symbol, &self.interval, self.window_limit)
            .await?;
        let Some(last) = window.last() else {
            return Err(EngineError::MarketData(format!("no candles returned for {symbol}")));
        };
        let price = last.close();

        let analysis = self.strategy.decide(&window, &bot.view());
        let decision = analysis.decision;
        tracing::info!(
            bot_id = %bot.id(),
            %symbol,
            %decision,
            reason = analysis.reason().unwrap_or("unknown"),
            price,
            "Decision evaluated"
        );

        let log = TradingDecisionLog::new(
            bot.id(),
            decision,
            self.strategy.name(),
            analysis.diagnostics.into_map(),
            price,
            window.len(),
            Utc::now(),
        );
        self.ports.decisions.save(&log).await?;

        match decision {
            Decision::Buy if !bot.is_positioned() => self.buy(bot, price).await,
            Decision::Sell if bot.is_positioned() => self.sell(bot, price).await,
            Decision::Hold => Ok(CycleOutcome::Held { decision }),
            _ => {
                tracing::debug!(bot_id = %bot.id(), %decision, "Decision does not apply to the current position");
                Ok(CycleOutcome::Held { decision })
            }
        }
    }

    async fn buy(&self, bot: &mut TradingBot, price: f64) -> Result<CycleOutcome, EngineError> {
        let requested = bot.order_quantity(price);
        let validation = self
            .validator
            .validate_symbol(self.ports.exchange.as_ref(), bot.symbol(), requested, price);
        if !validation.is_valid {
            tracing::warn!(bot_id = %bot.id(), errors = ?validation.errors, "Buy order rejected by pre-flight validation");
            return Ok(CycleOutcome::Rejected {
                side: OrderSide::Buy,
                errors: validation.errors,
            });
        }
        for warning in &validation.warnings {
            tracing::info!(bot_id = %bot.id(), "{warning}");
        }

        let receipt = self
            .ports
            .orders
            .place_market_order(bot.symbol(), OrderSide::Buy, &validation.formatted_quantity)
            .await?;
        let fill_price = receipt.average_price.unwrap_or(price);
        let filled = if receipt.executed_quantity > 0.0 {
            receipt.executed_quantity
        } else {
            validation.adjusted_quantity
        };
        let held = filled * (1.0 - bot.trading_fees() / 100.0);

        bot.enter_position(fill_price)?;
        bot.record_quantity_held(held)?;
        self.ports.bots.save_position(bot).await?;

        tracing::info!(
            bot_id = %bot.id(),
            order_id = %receipt.order_id,
            quantity = filled,
            held,
            price = fill_price,
            "Position opened"
        );
        Ok(CycleOutcome::Bought {
            quantity: filled,
            price: fill_price,
        })
    }

    async fn sell(&self, bot: &mut TradingBot, price: f64) -> Result<CycleOutcome, EngineError> {
        let requested = bot.quantity_for_sell();
        let validation = self
            .validator
            .validate_symbol(self.ports.exchange.as_ref(), bot.symbol(), requested, price);
        if !validation.is_valid {
            tracing::warn!(bot_id = %bot.id(), errors = ?validation.errors, "Sell order rejected by pre-flight validation");
            return Ok(CycleOutcome::Rejected {
                side: OrderSide::Sell,
                errors: validation.errors,
            });
        }

        let receipt = self
            .ports
            .orders
            .place_market_order(bot.symbol(), OrderSide::Sell, &validation.formatted_quantity)
            .await?;
        let fill_price = receipt.average_price.unwrap_or(price);
        let entry = bot.entry_price();
        let profit_pct = (fill_price - entry) / entry * 100.0;

        bot.exit_position()?;
        self.ports.bots.save_position(bot).await?;

        tracing::info!(
            bot_id = %bot.id(),
            order_id = %receipt.order_id,
            quantity = validation.adjusted_quantity,
            entry,
            price = fill_price,
            profit_pct,
            "Position closed"
        );
        Ok(CycleOutcome::Sold {
            quantity: validation.adjusted_quantity,
            price: fill_price,
            profit_pct,
        })
    }
}
