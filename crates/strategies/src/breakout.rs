use crate::analysis::{
    position_diagnostics, stoploss_hit, validate_stoploss, Diagnostics, StrategyAnalysis,
    INSUFFICIENT_DATA, STOPLOSS_TRIGGERED,
};
use crate::error::StrategyError;
use crate::Strategy;
use configuration::BreakoutParams;
use core_types::{Candle, Decision, PositionView};

/// Channel breakout: buy when the last close clears the highest high of the previous
/// `lookback` candles, sell when it drops under their lowest low.
#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    lookback: usize,
    stoploss_threshold: f64,
}

impl BreakoutStrategy {
    pub fn new(params: BreakoutParams) -> Result<Self, StrategyError> {
        if params.lookback == 0 {
            return Err(StrategyError::InvalidParameters(
                "Breakout lookback must be greater than zero".to_string(),
            ));
        }
        validate_stoploss(params.stoploss_threshold)?;
        Ok(Self {
            lookback: params.lookback,
            stoploss_threshold: params.stoploss_threshold,
        })
    }
}

impl Strategy for BreakoutStrategy {
    fn name(&self) -> &'static str {
        "Breakout"
    }

    fn params(&self) -> Diagnostics {
        Diagnostics::new()
            .with("lookback", self.lookback)
            .with("stoplossThreshold", self.stoploss_threshold)
    }

    fn min_candles(&self) -> usize {
        self.lookback + 1
    }

    fn decide(&self, window: &[Candle], position: &PositionView) -> StrategyAnalysis {
        let Some((last, history)) = window.split_last() else {
            return StrategyAnalysis::hold(Diagnostics::new().with("reason", INSUFFICIENT_DATA));
        };
        if history.len() < self.lookback {
            return StrategyAnalysis::hold(Diagnostics::new().with("reason", INSUFFICIENT_DATA));
        }

        let channel = &history[history.len() - self.lookback..];
        let highest_high = channel.iter().map(Candle::high).fold(f64::MIN, f64::max);
        let lowest_low = channel.iter().map(Candle::low).fold(f64::MAX, f64::min);
        let current_price = last.close();
        let possible_profit = position.unrealized_profit_pct(current_price);

        let mut diagnostics = position_diagnostics(
            Diagnostics::new()
                .with("highestHigh", highest_high)
                .with("lowestLow", lowest_low)
                .with("lookback", self.lookback),
            current_price,
            position,
            self.stoploss_threshold,
        );

        if stoploss_hit(position, possible_profit, self.stoploss_threshold) {
            diagnostics.set("reason", STOPLOSS_TRIGGERED);
            return StrategyAnalysis::new(Decision::Sell, diagnostics);
        }

        let above = current_price > highest_high;
        let below = current_price < lowest_low;
        let (decision, reason) = match (position.is_positioned, above, below) {
            (false, true, _) => (Decision::Buy, "breakout_above_high_buy"),
            (true, _, true) => (Decision::Sell, "breakdown_below_low_sell"),
            (true, true, _) => (Decision::Hold, "breakout_positioned_holding"),
            (false, _, true) => (Decision::Hold, "breakdown_not_positioned_wait"),
            _ => (Decision::Hold, "within_channel_hold"),
        };

        diagnostics.set("reason", reason);
        StrategyAnalysis::new(decision, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(high: f64, low: f64, close: f64, t: i64) -> Candle {
        Candle::new(close, close, high, low, 1.0, t).unwrap()
    }

    fn channel_then(close: f64) -> Vec<Candle> {
        let mut candles: Vec<Candle> = (1..=3).map(|t| bar(12.0, 8.0, 10.0, t)).collect();
        candles.push(bar(close.max(12.0), close.min(8.0), close, 4));
        candles
    }

    fn strategy(stoploss: f64) -> BreakoutStrategy {
        BreakoutStrategy::new(BreakoutParams {
            lookback: 3,
            stoploss_threshold: stoploss,
        })
        .unwrap()
    }

    #[test]
    fn zero_lookback_is_rejected() {
        assert!(BreakoutStrategy::new(BreakoutParams { lookback: 0, stoploss_threshold: 0.0 }).is_err());
    }

    #[test]
    fn needs_lookback_plus_one_candles() {
        let analysis = strategy(0.0).decide(&channel_then(13.0)[1..], &PositionView::flat(0.0));
        assert_eq!(analysis.reason(), Some("insufficient_data"));
        assert_eq!(strategy(0.0).decide(&[], &PositionView::flat(0.0)).decision, Decision::Hold);
    }

    #[test]
    fn breakout_and_breakdown() {
        let s = strategy(0.0);
        let up = s.decide(&channel_then(13.0), &PositionView::flat(0.0));
        assert_eq!(up.decision, Decision::Buy);
        assert_eq!(up.diagnostics.get_f64("highestHigh"), Some(12.0));

        let down = s.decide(&channel_then(7.0), &PositionView::positioned(10.0, 0.0));
        assert_eq!(down.decision, Decision::Sell);
        assert_eq!(down.reason(), Some("breakdown_below_low_sell"));
    }

    #[test]
    fn holds_inside_the_channel() {
        let s = strategy(0.0);
        assert_eq!(
            s.decide(&channel_then(10.0), &PositionView::flat(0.0)).reason(),
            Some("within_channel_hold")
        );
        assert_eq!(
            s.decide(&channel_then(7.0), &PositionView::flat(0.0)).reason(),
            Some("breakdown_not_positioned_wait")
        );
    }

    #[test]
    fn stoploss_has_priority() {
        let analysis = strategy(5.0).decide(&channel_then(10.0), &PositionView::positioned(11.0, 0.0));
        assert_eq!(analysis.decision, Decision::Sell);
        assert_eq!(analysis.reason(), Some("stoploss_triggered"));
    }
}
