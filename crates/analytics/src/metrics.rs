use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of closed trades with a positive P&L.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WinRate {
    wins: usize,
    total: usize,
}

impl WinRate {
    /// `wins` is clamped to `total`.
    pub fn new(wins: usize, total: usize) -> Self {
        Self {
            wins: wins.min(total),
            total,
        }
    }

    /// Fraction in `[0, 1]`; `0.0` when there are no trades.
    pub fn value(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.wins as f64 / self.total as f64
    }

    pub fn percentage(&self) -> f64 {
        self.value() * 100.0
    }

    pub fn wins(&self) -> usize {
        self.wins
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl fmt::Display for WinRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}% ({}/{})", self.percentage(), self.wins, self.total)
    }
}

/// The largest peak-to-trough decline of a capital series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Drawdown {
    /// Decline from `peak` to `trough`, in percent of the peak.
    pub value: f64,
    pub peak: f64,
    pub trough: f64,
    /// Number of entries since the peak when the trough was reached.
    pub duration: usize,
}

impl Drawdown {
    /// Scans the whole series from the start.
    ///
    /// A new peak resets the running duration. Returns the zero drawdown when the
    /// series never falls below a previous peak.
    pub fn from_history(history: &[f64]) -> Self {
        let Some(&first) = history.first() else {
            return Self::default();
        };

        let mut worst = Self {
            value: 0.0,
            peak: first,
            trough: first,
            duration: 0,
        };
        let mut peak = first;
        let mut running = 0;

        for &capital in history {
            if capital > peak {
                peak = capital;
                running = 0;
            } else if capital < peak {
                running += 1;
                if peak > 0.0 {
                    let value = (peak - capital) / peak * 100.0;
                    if value > worst.value {
                        worst = Self {
                            value,
                            peak,
                            trough: capital,
                            duration: running,
                        };
                    }
                }
            }
        }
        worst
    }
}

impl fmt::Display for Drawdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}% ({:.2} -> {:.2} over {} periods)",
            self.value, self.peak, self.trough, self.duration
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_rate_is_zero_without_trades() {
        assert_eq!(WinRate::new(0, 0).value(), 0.0);
        assert_eq!(WinRate::new(3, 4).value(), 0.75);
        assert_eq!(WinRate::new(3, 4).to_string(), "75.00% (3/4)");
    }

    #[test]
    fn drawdown_tracks_deepest_decline_and_duration() {
        let dd = Drawdown::from_history(&[100.0, 120.0, 110.0, 90.0, 130.0, 125.0]);
        assert!((dd.value - 25.0).abs() < 1e-9);
        assert_eq!(dd.peak, 120.0);
        assert_eq!(dd.trough, 90.0);
        assert_eq!(dd.duration, 2);
    }

    #[test]
    fn rising_series_has_no_drawdown() {
        assert_eq!(Drawdown::from_history(&[100.0, 101.0, 105.0]).value, 0.0);
        assert_eq!(Drawdown::from_history(&[]), Drawdown::default());
    }
}
