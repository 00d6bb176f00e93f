use crate::error::BacktestError;
use chrono::{DateTime, Utc};
use core_types::Candle;
use std::path::Path;

/// An ordered candle history replayed one close at a time.
///
/// The window handed out at index `i` ends at candle `i` and holds at most
/// `window_size` candles, which mirrors what a live bot fetches per cycle.
#[derive(Debug, Clone)]
pub struct HistoricalMarketData {
    candles: Vec<Candle>,
    window_size: usize,
}

impl HistoricalMarketData {
    pub fn new(candles: Vec<Candle>, window_size: usize) -> Result<Self, BacktestError> {
        if candles.is_empty() {
            return Err(BacktestError::DataUnavailable);
        }
        if window_size == 0 {
            return Err(BacktestError::InvalidSequence("window size must be greater than zero".into()));
        }
        if let Some(pair) = candles.windows(2).find(|w| w[1].close_time() <= w[0].close_time()) {
            return Err(BacktestError::InvalidSequence(format!(
                "close times must increase strictly ({} followed by {})",
                pair[0].close_time(),
                pair[1].close_time()
            )));
        }
        Ok(Self { candles, window_size })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Trailing window ending at `index` (inclusive).
    pub fn window_at(&self, index: usize) -> &[Candle] {
        let end = (index + 1).min(self.candles.len());
        let start = end.saturating_sub(self.window_size);
        &self.candles[start..end]
    }

    /// Every trailing window in chronological order.
    pub fn windows(&self) -> impl Iterator<Item = &[Candle]> + '_ {
        (0..self.candles.len()).map(move |i| self.window_at(i))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.candles[0].close_datetime()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.candles[self.candles.len() - 1].close_datetime()
    }
}

/// Parses a JSON array of candles (`open, close, high, low, volume, closeTime`).
///
/// Every row goes through `Candle` validation; one bad row fails the whole file.
pub fn parse_candles(json: &str) -> Result<Vec<Candle>, BacktestError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_candles(path: impl AsRef<Path>) -> Result<Vec<Candle>, BacktestError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| BacktestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let candles = parse_candles(&json)?;
    tracing::info!(path = %path.display(), count = candles.len(), "Loaded historical candles");
    Ok(candles)
}

/// Converts an exchange interval such as `"15m"`, `"1h"` or `"1d"` to seconds.
pub fn interval_seconds(interval: &str) -> Result<u64, BacktestError> {
    let invalid = || BacktestError::InvalidInterval(interval.to_string());
    let trimmed = interval.trim();
    let (split, _) = trimmed.char_indices().last().ok_or_else(invalid)?;
    let (amount, unit) = trimmed.split_at(split);
    let amount: u64 = amount.parse().map_err(|_| invalid())?;
    let unit_seconds = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        _ => return Err(invalid()),
    };
    match amount.checked_mul(unit_seconds) {
        Some(0) | None => Err(invalid()),
        Some(seconds) => Ok(seconds),
    }
}
