use backtester::{run_backtest, BacktestError, HistoricalMarketData};
use configuration::{BacktestSettings, MovingAverageParams, RsiParams, StrategyConfig};
use core_types::Candle;
use strategies::{create_strategy, TradingStrategy};

fn series(closes: impl IntoIterator<Item = f64>) -> Vec<Candle> {
    closes
        .into_iter()
        .enumerate()
        .map(|(i, c)| Candle::new(c, c, c * 1.001, c * 0.999, 100.0, 1_704_067_200_000 + i as i64 * 3_600_000).unwrap())
        .collect()
}

fn ma(fast: usize, slow: usize) -> TradingStrategy {
    create_strategy(&StrategyConfig::MovingAverage(MovingAverageParams {
        fast_window: fast,
        slow_window: slow,
        ..MovingAverageParams::default()
    }))
    .unwrap()
}

fn settings() -> BacktestSettings {
    BacktestSettings {
        initial_capital: 10_000.0,
        trading_fees: 0.1,
        ..BacktestSettings::default()
    }
}

fn assert_invariants(result: &analytics::BacktestResult) {
    let total = result.total_trades();
    assert_eq!(result.capital_history().len(), total + 1);
    assert!(result.trades().iter().all(|t| !t.is_open()));
    if total > 0 {
        assert_eq!(result.win_rate().value(), result.winning_trades() as f64 / total as f64);
    } else {
        assert_eq!(result.win_rate().value(), 0.0);
    }
    let pnl: f64 = result.trades().iter().filter_map(|t| t.profit_loss()).sum();
    assert!((pnl - result.total_profit_loss()).abs() < 1e-6);
    assert!((result.final_capital() - (result.initial_capital() + pnl)).abs() < 1e-6);
}

#[test]
fn ascending_market_with_slow_moving_average() {
    let candles = series((0..50).map(|i| 100.0 + i as f64));
    let result = run_backtest(ma(7, 40), candles, &settings(), false).unwrap();
    assert_invariants(&result);
}

#[test]
fn oscillating_market_produces_consistent_statistics() {
    let candles = series((0..400).map(|i| 100.0 + (i as f64 / 9.0).sin() * 12.0));
    for strategy in [
        ma(7, 40),
        ma(3, 12),
        create_strategy(&StrategyConfig::Rsi(RsiParams::default())).unwrap(),
    ] {
        let result = run_backtest(strategy, candles.clone(), &settings(), false).unwrap();
        assert_invariants(&result);
    }
}

#[test]
fn open_position_is_force_closed_at_last_candle() {
    // A steady decline: buy once, then hold forever below the slow average.
    let candles = series((0..30).map(|i| 200.0 - i as f64 * 2.0));
    let last_close = candles[candles.len() - 1].close();
    let result = run_backtest(ma(3, 5), candles, &settings(), false).unwrap();

    assert_eq!(result.total_trades(), 1);
    let trade = &result.trades()[0];
    assert_eq!(trade.exit_price(), Some(last_close));
    assert!(trade.profit_loss().unwrap() < 0.0);
    assert_invariants(&result);
}

#[test]
fn stoploss_exits_losing_positions() {
    let strategy = create_strategy(&StrategyConfig::MovingAverage(MovingAverageParams {
        fast_window: 3,
        slow_window: 5,
        minimum_spread: 0.1,
        stoploss_threshold: 5.0,
    }))
    .unwrap();
    let candles = series((0..30).map(|i| 200.0 - i as f64 * 2.0));
    let result = run_backtest(strategy, candles, &settings(), false).unwrap();

    assert!(result.total_trades() > 1);
    assert_eq!(result.winning_trades(), 0);
    assert_invariants(&result);
}

#[test]
fn window_is_bounded_to_configured_size() {
    let data = HistoricalMarketData::new(series((0..250).map(|i| 50.0 + i as f64)), 100).unwrap();
    assert!(data.windows().all(|w| w.len() <= 100));
    assert_eq!(data.window_at(249).len(), 100);
}

#[test]
fn empty_history_is_rejected() {
    assert!(matches!(
        run_backtest(ma(7, 40), Vec::new(), &settings(), false),
        Err(BacktestError::DataUnavailable)
    ));
}
