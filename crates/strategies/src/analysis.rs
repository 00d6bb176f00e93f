use core_types::{Candle, Decision, PositionView};
use serde::Serialize;
use serde_json::{Map, Value};

/// Reason code shared by every strategy when the window is too short.
pub const INSUFFICIENT_DATA: &str = "insufficient_data";
/// Reason code shared by every strategy when the stoploss forces an exit.
pub const STOPLOSS_TRIGGERED: &str = "stoploss_triggered";

/// Structured diagnostics attached to every decision.
///
/// Keys are stable camelCase identifiers (`fast`, `slow`, `rsi`, `reason`,
/// `possibleProfit`, ...) so logs and decision records can be read without
/// re-running the computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Map<String, Value>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// The outcome of one strategy evaluation: a decision and its mandatory diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyAnalysis {
    pub decision: Decision,
    pub diagnostics: Diagnostics,
}

impl StrategyAnalysis {
    pub fn new(decision: Decision, diagnostics: Diagnostics) -> Self {
        Self {
            decision,
            diagnostics,
        }
    }

    pub fn hold(diagnostics: Diagnostics) -> Self {
        Self::new(Decision::Hold, diagnostics)
    }

    pub fn reason(&self) -> Option<&str> {
        self.diagnostics.get_str("reason")
    }
}

/// The position-related diagnostics every strategy reports.
pub(crate) fn position_diagnostics(
    diagnostics: Diagnostics,
    current_price: f64,
    position: &PositionView,
    stoploss_threshold: f64,
) -> Diagnostics {
    diagnostics
        .with("currentPrice", current_price)
        .with("isPositioned", position.is_positioned)
        .with("entryPrice", position.entry_price)
        .with("possibleProfit", position.unrealized_profit_pct(current_price))
        .with("minimumProfitThreshold", position.minimum_profit_threshold)
        .with("stoplossThreshold", stoploss_threshold)
}

/// Stoploss check: positioned, enabled (`threshold > 0`) and the loss reached the threshold.
pub(crate) fn stoploss_hit(position: &PositionView, possible_profit: f64, threshold: f64) -> bool {
    position.is_positioned && threshold > 0.0 && possible_profit <= -threshold
}

pub(crate) fn validate_stoploss(threshold: f64) -> Result<(), crate::StrategyError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(crate::StrategyError::InvalidParameters(format!(
            "stoploss threshold must be a non-negative percentage (got {threshold})"
        )));
    }
    Ok(())
}

pub(crate) fn closes(window: &[Candle]) -> Vec<f64> {
    window.iter().map(Candle::close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_builder_and_getters() {
        let d = Diagnostics::new()
            .with("reason", "neutral")
            .with("fast", 1.5)
            .with("isPositioned", true);

        assert_eq!(d.get_str("reason"), Some("neutral"));
        assert_eq!(d.get_f64("fast"), Some(1.5));
        assert_eq!(d.get_bool("isPositioned"), Some(true));
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn stoploss_requires_position_and_enabled_threshold() {
        let flat = PositionView::flat(0.0);
        let long = PositionView::positioned(100.0, 0.0);

        assert!(!stoploss_hit(&flat, -50.0, 5.0));
        assert!(!stoploss_hit(&long, -50.0, 0.0));
        assert!(!stoploss_hit(&long, -4.9, 5.0));
        assert!(stoploss_hit(&long, -5.0, 5.0));
    }
}
