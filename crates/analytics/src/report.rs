use crate::result::BacktestResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A flat, serializable report of a finished backtest.
///
/// This is the data transfer object handed to persistence and printed by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub id: Uuid,
    pub strategy_name: String,
    pub symbol: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,

    // I. Core Profitability Metrics
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_profit_loss: f64,
    pub roi_pct: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub profit_factor: Option<f64>, // None when there are no losses

    // II. Risk and Drawdown
    pub max_drawdown_pct: f64,
    pub max_drawdown_duration: usize,

    // III. Trade-Level Statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: f64,
    pub average_win: f64,
    pub average_loss: f64,

    // IV. Time-Based Metrics
    pub average_holding_secs: i64,
}

impl BacktestSummary {
    pub fn from_result(result: &BacktestResult) -> Self {
        let pnls: Vec<f64> = result.trades().iter().filter_map(|t| t.profit_loss()).collect();
        let gross_profit: f64 = pnls.iter().filter(|p| **p > 0.0).sum();
        let gross_loss: f64 = pnls.iter().filter(|p| **p < 0.0).map(|p| p.abs()).sum();

        let average = |total: f64, count: usize| if count > 0 { total / count as f64 } else { 0.0 };

        let holding: Vec<i64> = result
            .trades()
            .iter()
            .filter_map(|t| t.holding_period())
            .map(|d| d.num_seconds())
            .collect();
        let average_holding_secs = if holding.is_empty() {
            0
        } else {
            holding.iter().sum::<i64>() / holding.len() as i64
        };

        let drawdown = result.max_drawdown();
        Self {
            id: result.id(),
            strategy_name: result.strategy_name().to_string(),
            symbol: result.symbol().to_string(),
            start: result.start(),
            end: result.end(),
            initial_capital: result.initial_capital(),
            final_capital: result.final_capital(),
            total_profit_loss: result.total_profit_loss(),
            roi_pct: result.roi(),
            gross_profit,
            gross_loss,
            profit_factor: (gross_loss > 0.0).then(|| gross_profit / gross_loss),
            max_drawdown_pct: drawdown.value,
            max_drawdown_duration: drawdown.duration,
            total_trades: result.total_trades(),
            winning_trades: result.winning_trades(),
            losing_trades: result.losing_trades(),
            win_rate_pct: result.win_rate().percentage(),
            average_win: average(gross_profit, result.winning_trades()),
            average_loss: average(gross_loss, result.losing_trades()),
            average_holding_secs,
        }
    }
}
