use crate::error::AnalyticsError;
use crate::metrics::{Drawdown, WinRate};
use crate::report::BacktestSummary;
use crate::trade::BacktestTrade;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Aggregated outcome of one backtest run.
///
/// Every closed trade is added exactly once; totals, win rate, capital history and
/// drawdown are updated on each addition and never revised afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    id: Uuid,
    strategy_name: String,
    symbol: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    initial_capital: f64,
    final_capital: f64,
    total_profit_loss: f64,
    winning_trades: usize,
    losing_trades: usize,
    win_rate: WinRate,
    max_drawdown: Drawdown,
    trades: Vec<BacktestTrade>,
    /// Seeded with the initial capital, then one entry per closed trade.
    capital_history: Vec<f64>,
}

impl BacktestResult {
    pub fn new(
        strategy_name: impl Into<String>,
        symbol: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        initial_capital: f64,
    ) -> Result<Self, AnalyticsError> {
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err(AnalyticsError::InvalidResult(format!(
                "initial capital must be positive (got {initial_capital})"
            )));
        }
        if end < start {
            return Err(AnalyticsError::InvalidResult("period end precedes its start".into()));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            strategy_name: strategy_name.into(),
            symbol: symbol.into(),
            start,
            end,
            initial_capital,
            final_capital: initial_capital,
            total_profit_loss: 0.0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: WinRate::default(),
            max_drawdown: Drawdown::default(),
            trades: Vec::new(),
            capital_history: vec![initial_capital],
        })
    }

    /// Records a closed trade and refreshes every derived statistic.
    pub fn add_trade(&mut self, trade: BacktestTrade) -> Result<(), AnalyticsError> {
        let Some(pnl) = trade.profit_loss().filter(|_| !trade.is_open()) else {
            return Err(AnalyticsError::OpenTrade(trade.id().to_string()));
        };

        if trade.is_winning() {
            self.winning_trades += 1;
        } else if trade.is_losing() {
            self.losing_trades += 1;
        }
        self.trades.push(trade);

        self.total_profit_loss += pnl;
        self.final_capital = self.initial_capital + self.total_profit_loss;
        self.capital_history.push(self.final_capital);
        self.win_rate = WinRate::new(self.winning_trades, self.trades.len());
        self.max_drawdown = Drawdown::from_history(&self.capital_history);
        tracing::trace!(pnl, capital = self.final_capital, trades = self.trades.len(), "Trade recorded");
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn final_capital(&self) -> f64 {
        self.final_capital
    }

    pub fn total_profit_loss(&self) -> f64 {
        self.total_profit_loss
    }

    pub fn total_trades(&self) -> usize {
        self.trades.len()
    }

    pub fn winning_trades(&self) -> usize {
        self.winning_trades
    }

    pub fn losing_trades(&self) -> usize {
        self.losing_trades
    }

    pub fn win_rate(&self) -> WinRate {
        self.win_rate
    }

    pub fn max_drawdown(&self) -> Drawdown {
        self.max_drawdown
    }

    pub fn trades(&self) -> &[BacktestTrade] {
        &self.trades
    }

    pub fn capital_history(&self) -> &[f64] {
        &self.capital_history
    }

    /// Return on investment in percent.
    pub fn roi(&self) -> f64 {
        (self.final_capital - self.initial_capital) / self.initial_capital * 100.0
    }

    pub fn summary(&self) -> BacktestSummary {
        BacktestSummary::from_result(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_types::OrderSide;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn closed(entry: f64, exit: f64, qty: f64) -> BacktestTrade {
        let mut trade = BacktestTrade::open("BTCUSDT", OrderSide::Buy, entry, qty, t0(), "test").unwrap();
        trade.close(exit, t0() + Duration::hours(1)).unwrap();
        trade
    }

    fn result() -> BacktestResult {
        BacktestResult::new("MovingAverage", "BTCUSDT", t0(), t0() + Duration::days(1), 1000.0).unwrap()
    }

    #[test]
    fn empty_result_has_zero_statistics() {
        let r = result();
        assert_eq!(r.total_trades(), 0);
        assert_eq!(r.win_rate().value(), 0.0);
        assert_eq!(r.max_drawdown().value, 0.0);
        assert_eq!(r.capital_history(), &[1000.0]);
        assert_eq!(r.roi(), 0.0);
    }

    #[test]
    fn statistics_follow_each_trade() {
        let mut r = result();
        r.add_trade(closed(100.0, 110.0, 5.0)).unwrap(); // +50
        r.add_trade(closed(100.0, 80.0, 5.0)).unwrap(); // -100
        r.add_trade(closed(100.0, 105.0, 2.0)).unwrap(); // +10

        assert_eq!(r.total_trades(), 3);
        assert_eq!(r.winning_trades(), 2);
        assert_eq!(r.losing_trades(), 1);
        assert!((r.win_rate().value() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(r.capital_history(), &[1000.0, 1050.0, 950.0, 960.0]);
        assert!((r.total_profit_loss() - -40.0).abs() < 1e-9);
        assert!((r.roi() - -4.0).abs() < 1e-9);

        let dd = r.max_drawdown();
        assert!((dd.value - 100.0 / 1050.0 * 100.0).abs() < 1e-9);
        assert_eq!(dd.duration, 1);
    }

    #[test]
    fn rejects_open_trades() {
        let mut r = result();
        let open = BacktestTrade::open("BTCUSDT", OrderSide::Buy, 100.0, 1.0, t0(), "x").unwrap();
        assert!(matches!(r.add_trade(open), Err(AnalyticsError::OpenTrade(_))));
        assert_eq!(r.total_trades(), 0);
        assert_eq!(r.capital_history().len(), 1);
    }

    #[test]
    fn drawdown_never_decreases() {
        let mut r = result();
        let mut previous = 0.0;
        for (entry, exit) in [(100.0, 90.0), (100.0, 130.0), (100.0, 95.0), (100.0, 101.0), (100.0, 70.0)] {
            r.add_trade(closed(entry, exit, 1.0)).unwrap();
            let current = r.max_drawdown().value;
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn rejects_non_positive_capital() {
        assert!(BacktestResult::new("x", "y", t0(), t0(), 0.0).is_err());
        assert!(BacktestResult::new("x", "y", t0(), t0() - Duration::hours(1), 10.0).is_err());
    }
}
