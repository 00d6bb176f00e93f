use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The output of every strategy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Hold,
    Buy,
    Sell,
}

impl Decision {
    /// Returns the order side this decision maps to, `None` for `Hold`.
    pub fn side(&self) -> Option<OrderSide> {
        match self {
            Decision::Hold => None,
            Decision::Buy => Some(OrderSide::Buy),
            Decision::Sell => Some(OrderSide::Sell),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Hold => "HOLD",
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
        };
        f.write_str(s)
    }
}

impl FromStr for Decision {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HOLD" => Ok(Decision::Hold),
            "BUY" => Ok(Decision::Buy),
            "SELL" => Ok(Decision::Sell),
            _ => Err(CoreError::UnknownVariant("decision", s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side of the order
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("BUY"),
            OrderSide::Sell => f.write_str("SELL"),
        }
    }
}

/// Lifecycle status of a trading bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BotStatus {
    Stopped,
    Running,
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotStatus::Stopped => f.write_str("STOPPED"),
            BotStatus::Running => f.write_str("RUNNING"),
        }
    }
}

/// Identifies which strategy family a bot or backtest runs.
///
/// The set is closed: adding a variant forces every `match` in the factory to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyId {
    MovingAverage,
    #[serde(rename = "RSI")]
    Rsi,
    Breakout,
}

impl StrategyId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::MovingAverage => "MovingAverage",
            StrategyId::Rsi => "RSI",
            StrategyId::Breakout => "Breakout",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-', ' '], "").as_str() {
            "movingaverage" | "ma" => Ok(StrategyId::MovingAverage),
            "rsi" => Ok(StrategyId::Rsi),
            "breakout" => Ok(StrategyId::Breakout),
            _ => Err(CoreError::UnknownVariant("strategy", s.to_string())),
        }
    }
}
