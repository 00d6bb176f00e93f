use crate::error::CoreError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV bar for a fixed interval.
///
/// A `Candle` can only be obtained through [`Candle::new`] (or deserialization, which
/// routes through it), so every instance in the system satisfies the price ordering
/// invariants. It is immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCandle", into = "RawCandle")]
pub struct Candle {
    open: f64,
    close: f64,
    high: f64,
    low: f64,
    volume: f64,
    /// Close time in milliseconds since the Unix epoch.
    close_time: i64,
}

impl Candle {
    pub fn new(
        open: f64,
        close: f64,
        high: f64,
        low: f64,
        volume: f64,
        close_time: i64,
    ) -> Result<Self, CoreError> {
        let fields = [("open", open), ("close", close), ("high", high), ("low", low), ("volume", volume)];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::InvalidInput(
                    name.to_string(),
                    format!("must be a finite, non-negative number (got {value})"),
                ));
            }
        }
        if close_time <= 0 {
            return Err(CoreError::InvalidInput(
                "close_time".to_string(),
                format!("must be positive (got {close_time})"),
            ));
        }
        if high < open || high < close || high < low {
            return Err(CoreError::InvalidInput(
                "high".to_string(),
                format!("{high} must be >= open, close and low"),
            ));
        }
        if low > open || low > close {
            return Err(CoreError::InvalidInput(
                "low".to_string(),
                format!("{low} must be <= open, close and high"),
            ));
        }

        Ok(Self {
            open,
            close,
            high,
            low,
            volume,
            close_time,
        })
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn close_time(&self) -> i64 {
        self.close_time
    }

    /// The close time as a UTC timestamp.
    pub fn close_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.close_time)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Wire shape of a candle, matching the exchange's kline JSON field names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCandle {
    open: f64,
    close: f64,
    high: f64,
    low: f64,
    volume: f64,
    close_time: i64,
}

impl TryFrom<RawCandle> for Candle {
    type Error = CoreError;

    fn try_from(raw: RawCandle) -> Result<Self, Self::Error> {
        Candle::new(raw.open, raw.close, raw.high, raw.low, raw.volume, raw.close_time)
    }
}

impl From<Candle> for RawCandle {
    fn from(c: Candle) -> Self {
        Self {
            open: c.open,
            close: c.close,
            high: c.high,
            low: c.low,
            volume: c.volume,
            close_time: c.close_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_bar() {
        let c = Candle::new(100.0, 105.0, 110.0, 95.0, 12.5, 1_700_000_000_000).unwrap();
        assert_eq!(c.close(), 105.0);
        assert_eq!(c.close_datetime().timestamp(), 1_700_000_000);
    }

    #[test]
    fn rejects_high_below_close() {
        assert!(Candle::new(100.0, 105.0, 104.0, 95.0, 1.0, 1).is_err());
    }

    #[test]
    fn rejects_low_above_open() {
        assert!(Candle::new(100.0, 105.0, 110.0, 101.0, 1.0, 1).is_err());
    }

    #[test]
    fn rejects_negative_volume_and_zero_time() {
        assert!(Candle::new(1.0, 1.0, 1.0, 1.0, -1.0, 1).is_err());
        assert!(Candle::new(1.0, 1.0, 1.0, 1.0, 1.0, 0).is_err());
        assert!(Candle::new(f64::NAN, 1.0, 1.0, 1.0, 1.0, 1).is_err());
    }

    #[test]
    fn deserialization_runs_validation() {
        let ok = r#"{"open":1.0,"close":2.0,"high":2.0,"low":1.0,"volume":3.0,"closeTime":60000}"#;
        let c: Candle = serde_json::from_str(ok).unwrap();
        assert_eq!(c.close_time(), 60_000);

        let bad = r#"{"open":1.0,"close":2.0,"high":1.5,"low":1.0,"volume":3.0,"closeTime":60000}"#;
        assert!(serde_json::from_str::<Candle>(bad).is_err());
    }
}
