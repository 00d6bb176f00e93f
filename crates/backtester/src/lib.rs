//! # Crypgo Backtester
//!
//! Replays a strategy over historical candles and produces a `BacktestResult`.
//!
//! Candles are processed strictly in chronological order on one thread: each decision
//! depends on the position left behind by the previous one.

use analytics::BacktestResult;
use configuration::BacktestSettings;
use core_types::Candle;
use indicatif::{ProgressBar, ProgressStyle};
use strategies::TradingStrategy;

pub mod error;
pub mod market_data;
pub mod simulator;

pub use error::BacktestError;
pub use market_data::{interval_seconds, load_candles, parse_candles, HistoricalMarketData};
pub use simulator::{BacktestSimulator, SimulatorState};

/// Runs a complete backtest: Idle -> Running -> Closed -> Finished.
///
/// Each candle is evaluated with a trailing window of at most `settings.window_size`
/// candles. A position still open after the last candle is closed at its price.
pub fn run_backtest(
    strategy: TradingStrategy,
    candles: Vec<Candle>,
    settings: &BacktestSettings,
    show_progress: bool,
) -> Result<BacktestResult, BacktestError> {
    let data = HistoricalMarketData::new(candles, settings.window_size)?;
    let mut simulator = BacktestSimulator::new(strategy, settings, data.start(), data.end())?;
    simulator.start()?;

    let progress_bar = if show_progress {
        let bar = ProgressBar::new(data.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("=>-"),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    for window in data.windows() {
        simulator.step(window)?;
        progress_bar.inc(1);
    }
    progress_bar.finish_with_message("Simulation complete.");

    simulator.close_open_position()?;
    simulator.finish()
}
