use crate::error::ConfigError;
use core_types::StrategyId;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backtest: BacktestSettings,
    pub strategy: StrategyConfig,
    pub live: LiveSettings,
    pub logging: LoggingSettings,
}

impl Config {
    /// Checks the cross-field rules serde cannot express.
    ///
    /// Strategy parameters are validated by the strategy constructors themselves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.backtest;
        if b.symbol.trim().is_empty() {
            return Err(ConfigError::ValidationError("backtest.symbol cannot be empty".into()));
        }
        if !b.initial_capital.is_finite() || b.initial_capital <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "backtest.initial_capital must be positive (got {})",
                b.initial_capital
            )));
        }
        if b.trade_amount < 0.0 {
            return Err(ConfigError::ValidationError("backtest.trade_amount cannot be negative".into()));
        }
        if !(0.0..100.0).contains(&b.trading_fees) {
            return Err(ConfigError::ValidationError(format!(
                "backtest.trading_fees must be within [0, 100) percent (got {})",
                b.trading_fees
            )));
        }
        if self.live.poll_interval_seconds == 0 {
            return Err(ConfigError::ValidationError("live.poll_interval_seconds must be greater than zero".into()));
        }
        if b.window_size == 0 || self.live.window_limit == 0 {
            return Err(ConfigError::ValidationError("window sizes must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Contains parameters for a single backtest run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    /// The symbol to use for the backtest (e.g., "BTCUSDT").
    pub symbol: String,
    /// The timeframe interval of the candle data (e.g., "1h").
    pub interval: String,
    /// The initial starting capital for the simulation.
    pub initial_capital: f64,
    /// Fixed quote amount per trade. `0` means every buy uses all available capital.
    pub trade_amount: f64,
    pub currency: String,
    /// The trading fee charged on each side, in percent. 0.1 corresponds to 0.1%.
    pub trading_fees: f64,
    /// Minimum unrealized profit (percent) before a strategy may sell.
    pub minimum_profit_threshold: f64,
    /// Maximum number of trailing candles handed to the strategy, as in live trading.
    pub window_size: usize,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".into(),
            interval: "1h".into(),
            initial_capital: 10_000.0,
            trade_amount: 0.0,
            currency: "USDT".into(),
            trading_fees: 0.1,
            minimum_profit_threshold: 0.0,
            window_size: 100,
        }
    }
}

/// Live polling parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiveSettings {
    /// Seconds between two decision cycles of a running bot.
    pub poll_interval_seconds: u64,
    /// Number of candles requested from the market data source per cycle.
    pub window_limit: usize,
    /// Orders use the bot's fixed quantity instead of `trade_amount / price`.
    pub use_fixed_quantity: bool,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 60,
            window_limit: 100,
            use_fixed_quantity: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub filter: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            directory: None,
            file_prefix: "crypgo.log".into(),
        }
    }
}

/// Strategy selection plus its parameters, tagged by `name`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name")]
pub enum StrategyConfig {
    MovingAverage(MovingAverageParams),
    #[serde(rename = "RSI", alias = "Rsi")]
    Rsi(RsiParams),
    Breakout(BreakoutParams),
}

impl StrategyConfig {
    pub fn id(&self) -> StrategyId {
        match self {
            StrategyConfig::MovingAverage(_) => StrategyId::MovingAverage,
            StrategyConfig::Rsi(_) => StrategyId::Rsi,
            StrategyConfig::Breakout(_) => StrategyId::Breakout,
        }
    }

    /// The default parameter set for a strategy family.
    pub fn default_for(id: StrategyId) -> Self {
        match id {
            StrategyId::MovingAverage => StrategyConfig::MovingAverage(MovingAverageParams::default()),
            StrategyId::Rsi => StrategyConfig::Rsi(RsiParams::default()),
            StrategyId::Breakout => StrategyConfig::Breakout(BreakoutParams::default()),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::MovingAverage(MovingAverageParams::default())
    }
}

/// Parameters for the Moving-Average strategy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovingAverageParams {
    pub fast_window: usize,
    pub slow_window: usize,
    /// Minimum percentage gap between the averages; filters out whipsaw markets.
    pub minimum_spread: f64,
    /// Loss percentage that forces an exit. `0` disables the stoploss.
    pub stoploss_threshold: f64,
}

impl Default for MovingAverageParams {
    fn default() -> Self {
        Self {
            fast_window: 7,
            slow_window: 40,
            minimum_spread: 0.1,
            stoploss_threshold: 0.0,
        }
    }
}

/// Parameters for the RSI strategy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RsiParams {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub stoploss_threshold: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
            stoploss_threshold: 0.0,
        }
    }
}

/// Parameters for the channel Breakout strategy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BreakoutParams {
    pub lookback: usize,
    pub stoploss_threshold: f64,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self {
            lookback: 20,
            stoploss_threshold: 0.0,
        }
    }
}
