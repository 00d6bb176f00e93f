use crate::analysis::{Diagnostics, StrategyAnalysis};
use crate::breakout::BreakoutStrategy;
use crate::error::StrategyError;
use crate::ma_crossover::MovingAverageStrategy;
use crate::rsi::RsiStrategy;
use crate::Strategy;
use configuration::StrategyConfig;
use core_types::{Candle, PositionView, StrategyId};

/// The closed set of strategies a bot can run.
///
/// Dispatch is an exhaustive `match`, so adding a variant fails to compile until
/// every call site handles it.
#[derive(Debug, Clone)]
pub enum TradingStrategy {
    MovingAverage(MovingAverageStrategy),
    Rsi(RsiStrategy),
    Breakout(BreakoutStrategy),
}

impl TradingStrategy {
    pub fn id(&self) -> StrategyId {
        match self {
            TradingStrategy::MovingAverage(_) => StrategyId::MovingAverage,
            TradingStrategy::Rsi(_) => StrategyId::Rsi,
            TradingStrategy::Breakout(_) => StrategyId::Breakout,
        }
    }

    fn inner(&self) -> &dyn Strategy {
        match self {
            TradingStrategy::MovingAverage(s) => s,
            TradingStrategy::Rsi(s) => s,
            TradingStrategy::Breakout(s) => s,
        }
    }
}

impl Strategy for TradingStrategy {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn params(&self) -> Diagnostics {
        self.inner().params()
    }

    fn min_candles(&self) -> usize {
        self.inner().min_candles()
    }

    fn decide(&self, window: &[Candle], position: &PositionView) -> StrategyAnalysis {
        self.inner().decide(window, position)
    }
}

/// Creates a new strategy instance from its configuration.
///
/// Parameters are validated here, so a strategy that was built never fails to decide.
pub fn create_strategy(config: &StrategyConfig) -> Result<TradingStrategy, StrategyError> {
    let strategy = match config {
        StrategyConfig::MovingAverage(params) => {
            TradingStrategy::MovingAverage(MovingAverageStrategy::new(params.clone())?)
        }
        StrategyConfig::Rsi(params) => TradingStrategy::Rsi(RsiStrategy::new(params.clone())?),
        StrategyConfig::Breakout(params) => {
            TradingStrategy::Breakout(BreakoutStrategy::new(params.clone())?)
        }
    };
    tracing::debug!(strategy = strategy.name(), params = ?strategy.params(), "Strategy created");
    Ok(strategy)
}

/// Resolves a strategy name (`"MovingAverage"`, `"RSI"`, `"Breakout"`, ...) to its
/// default configuration.
pub fn default_config_for(name: &str) -> Result<StrategyConfig, StrategyError> {
    let id: StrategyId = name
        .parse()
        .map_err(|_| StrategyError::StrategyNotFound(name.to_string()))?;
    Ok(StrategyConfig::default_for(id))
}
