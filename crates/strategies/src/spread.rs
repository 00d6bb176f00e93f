use crate::error::StrategyError;

/// Minimum percentage gap between two averages before a crossover is trusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumSpread(f64);

impl MinimumSpread {
    pub fn new(percent: f64) -> Result<Self, StrategyError> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(StrategyError::InvalidParameters(format!(
                "minimum spread must be within [0, 100] percent (got {percent})"
            )));
        }
        Ok(Self(percent))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `|fast - slow| / slow * 100`; `0.0` when `slow` is zero.
    pub fn actual(fast: f64, slow: f64) -> f64 {
        if slow == 0.0 {
            return 0.0;
        }
        ((fast - slow) / slow * 100.0).abs()
    }

    /// A zero slow average never has a sufficient spread.
    pub fn is_sufficient(&self, fast: f64, slow: f64) -> bool {
        slow != 0.0 && Self::actual(fast, slow) >= self.0
    }
}
