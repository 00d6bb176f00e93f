use crate::error::BacktestError;
use crate::market_data::interval_seconds;
use analytics::{BacktestResult, BacktestTrade};
use chrono::{DateTime, Utc};
use configuration::BacktestSettings;
use core_types::{BotSettings, Candle, Decision, OrderSide, TradingBot};
use std::fmt;
use strategies::{Strategy, StrategyAnalysis, TradingStrategy};

/// Lifecycle of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Idle,
    /// Consuming candles in time order.
    Running,
    /// The last open position has been force-closed.
    Closed,
    /// The result has been handed out.
    Finished,
}

impl fmt::Display for SimulatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SimulatorState::Idle => "idle",
            SimulatorState::Running => "running",
            SimulatorState::Closed => "closed",
            SimulatorState::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Replays a strategy over historical candles against a simulated long-only ledger.
///
/// The simulator drives a real `TradingBot` through its position transitions, so the
/// strategy sees exactly the position state a live bot would. Its own positioned flag
/// must agree with the bot's before every decision.
pub struct BacktestSimulator {
    strategy: TradingStrategy,
    bot: TradingBot,
    state: SimulatorState,
    is_positioned: bool,
    current_trade: Option<BacktestTrade>,
    result: BacktestResult,
    trade_amount: f64,
    trading_fees: f64,
    last_candle: Option<Candle>,
    skipped_buys: usize,
}

impl BacktestSimulator {
    pub fn new(
        strategy: TradingStrategy,
        settings: &BacktestSettings,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, BacktestError> {
        let bot = TradingBot::new(BotSettings {
            symbol: settings.symbol.clone(),
            strategy_id: strategy.id(),
            quantity: 0.0,
            interval_seconds: interval_seconds(&settings.interval)?,
            initial_capital: settings.initial_capital,
            trade_amount: settings.trade_amount,
            currency: settings.currency.clone(),
            trading_fees: settings.trading_fees,
            minimum_profit_threshold: settings.minimum_profit_threshold,
            use_fixed_quantity: false,
        })?;
        let result = BacktestResult::new(
            strategy.name(),
            settings.symbol.clone(),
            start,
            end,
            settings.initial_capital,
        )?;

        Ok(Self {
            strategy,
            bot,
            state: SimulatorState::Idle,
            is_positioned: false,
            current_trade: None,
            result,
            trade_amount: settings.trade_amount,
            trading_fees: settings.trading_fees,
            last_candle: None,
            skipped_buys: 0,
        })
    }

    pub fn state(&self) -> SimulatorState {
        self.state
    }

    pub fn is_positioned(&self) -> bool {
        self.is_positioned
    }

    pub fn bot(&self) -> &TradingBot {
        &self.bot
    }

    pub fn result(&self) -> &BacktestResult {
        &self.result
    }

    /// Buys skipped because the capital could not cover the fixed trade amount.
    pub fn skipped_buys(&self) -> usize {
        self.skipped_buys
    }

    pub fn start(&mut self) -> Result<(), BacktestError> {
        self.expect_state(SimulatorState::Idle, "start")?;
        self.bot.start()?;
        self.state = SimulatorState::Running;
        tracing::info!(
            strategy = self.strategy.name(),
            symbol = self.bot.symbol(),
            capital = self.result.initial_capital(),
            "Backtest started"
        );
        Ok(())
    }

    /// Feeds one trailing window (ending at the current candle) to the strategy and
    /// applies its decision. Windows shorter than the strategy's warm-up only advance
    /// the clock.
    pub fn step(&mut self, window: &[Candle]) -> Result<Decision, BacktestError> {
        self.expect_state(SimulatorState::Running, "process a candle")?;
        let Some(&candle) = window.last() else {
            return Ok(Decision::Hold);
        };
        self.last_candle = Some(candle);

        if window.len() < self.strategy.min_candles() {
            return Ok(Decision::Hold);
        }
        if self.is_positioned != self.bot.is_positioned() {
            return Err(BacktestError::PositionMismatch {
                simulator: self.is_positioned,
                bot: self.bot.is_positioned(),
            });
        }

        let analysis = self.strategy.decide(window, &self.bot.view());
        tracing::debug!(
            close_time = candle.close_time(),
            price = candle.close(),
            decision = %analysis.decision,
            reason = analysis.reason().unwrap_or_default(),
            "Candle evaluated"
        );

        match analysis.decision {
            Decision::Buy if !self.is_positioned => self.open_position(&candle, &analysis)?,
            Decision::Sell if self.is_positioned => self.close_position(&candle, &analysis)?,
            _ => {}
        }
        Ok(analysis.decision)
    }

    /// Force-closes any open trade at the last seen candle's price and time.
    pub fn close_open_position(&mut self) -> Result<(), BacktestError> {
        self.expect_state(SimulatorState::Running, "close out")?;
        if let (Some(mut trade), Some(candle)) = (self.current_trade.take(), self.last_candle) {
            let pnl = trade.close(candle.close(), candle.close_datetime())?;
            tracing::info!(price = candle.close(), pnl, "Open position force-closed at end of data");
            self.result.add_trade(trade)?;
            self.bot.exit_position()?;
            self.is_positioned = false;
        }
        self.bot.stop()?;
        self.state = SimulatorState::Closed;
        Ok(())
    }

    /// Hands out the final result. The simulator accepts no further input afterwards.
    pub fn finish(&mut self) -> Result<BacktestResult, BacktestError> {
        self.expect_state(SimulatorState::Closed, "finish")?;
        self.state = SimulatorState::Finished;
        let summary = self.result.summary();
        tracing::info!(
            trades = summary.total_trades,
            win_rate = summary.win_rate_pct,
            roi = summary.roi_pct,
            max_drawdown = summary.max_drawdown_pct,
            skipped_buys = self.skipped_buys,
            "Backtest finished"
        );
        Ok(self.result.clone())
    }

    fn open_position(&mut self, candle: &Candle, analysis: &StrategyAnalysis) -> Result<(), BacktestError> {
        let price = candle.close();
        if price <= 0.0 {
            tracing::warn!(close_time = candle.close_time(), "Buy skipped: non-positive price");
            return Ok(());
        }

        let available = self.result.final_capital();
        let amount = if self.trade_amount > 0.0 {
            if available < self.trade_amount {
                self.skipped_buys += 1;
                tracing::info!(price, available, required = self.trade_amount, "Buy skipped: insufficient capital");
                return Ok(());
            }
            self.trade_amount
        } else {
            available
        };

        let quantity = amount / (price * (1.0 + self.trading_fees / 100.0));
        let trade = BacktestTrade::open(
            self.bot.symbol(),
            OrderSide::Buy,
            price,
            quantity,
            candle.close_datetime(),
            analysis.reason().unwrap_or_default(),
        )?;
        self.bot.enter_position(price)?;
        self.bot.record_quantity_held(quantity)?;
        self.current_trade = Some(trade);
        self.is_positioned = true;

        tracing::info!(price, quantity, amount, reason = analysis.reason().unwrap_or_default(), "BUY");
        Ok(())
    }

    fn close_position(&mut self, candle: &Candle, analysis: &StrategyAnalysis) -> Result<(), BacktestError> {
        let Some(mut trade) = self.current_trade.take() else {
            return Err(BacktestError::PositionMismatch {
                simulator: self.is_positioned,
                bot: self.bot.is_positioned(),
            });
        };

        let exit_price = candle.close() * (1.0 - self.trading_fees / 100.0);
        let pnl = trade.close(exit_price, candle.close_datetime())?;
        self.result.add_trade(trade)?;
        self.bot.exit_position()?;
        self.is_positioned = false;

        tracing::info!(
            price = candle.close(),
            exit_price,
            pnl,
            capital = self.result.final_capital(),
            reason = analysis.reason().unwrap_or_default(),
            "SELL"
        );
        Ok(())
    }

    fn expect_state(&self, expected: SimulatorState, action: &'static str) -> Result<(), BacktestError> {
        if self.state != expected {
            return Err(BacktestError::InvalidState {
                action,
                state: self.state.to_string(),
            });
        }
        Ok(())
    }
}
