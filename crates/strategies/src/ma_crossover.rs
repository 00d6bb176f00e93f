use crate::analysis::{
    closes, position_diagnostics, stoploss_hit, validate_stoploss, Diagnostics, StrategyAnalysis,
    INSUFFICIENT_DATA, STOPLOSS_TRIGGERED,
};
use crate::error::StrategyError;
use crate::spread::MinimumSpread;
use crate::Strategy;
use configuration::MovingAverageParams;
use core_types::{Candle, Decision, PositionView};
use ta::indicators::SimpleMovingAverage as Sma;
use ta::{Next, Reset};

/// Moving-Average strategy: buy the dip below the slow average, sell above it with profit.
///
/// The two means are taken over the trailing `fast_window` and `slow_window` closes.
/// A buy additionally needs the gap between the means to reach the minimum spread,
/// which keeps the bot out of flat, whipsawing markets.
#[derive(Debug, Clone)]
pub struct MovingAverageStrategy {
    fast_window: usize,
    slow_window: usize,
    minimum_spread: MinimumSpread,
    stoploss_threshold: f64,
    // Indicator prototypes; each decision works on a reset clone.
    ma_fast: Sma,
    ma_slow: Sma,
}

impl MovingAverageStrategy {
    /// Creates a new `MovingAverageStrategy` instance with the given parameters.
    ///
    /// It performs validation to ensure the parameters are logical.
    pub fn new(params: MovingAverageParams) -> Result<Self, StrategyError> {
        if params.fast_window == 0 || params.slow_window == 0 {
            return Err(StrategyError::InvalidParameters(
                "Moving average windows must be greater than zero".to_string(),
            ));
        }
        if params.fast_window >= params.slow_window {
            return Err(StrategyError::InvalidParameters(
                "Fast window must be less than slow window".to_string(),
            ));
        }
        validate_stoploss(params.stoploss_threshold)?;

        let ma_fast = Sma::new(params.fast_window)
            .map_err(|e| StrategyError::IndicatorError(format!("{e:?}")))?;
        let ma_slow = Sma::new(params.slow_window)
            .map_err(|e| StrategyError::IndicatorError(format!("{e:?}")))?;

        Ok(Self {
            fast_window: params.fast_window,
            slow_window: params.slow_window,
            minimum_spread: MinimumSpread::new(params.minimum_spread)?,
            stoploss_threshold: params.stoploss_threshold,
            ma_fast,
            ma_slow,
        })
    }

    pub fn fast_window(&self) -> usize {
        self.fast_window
    }

    pub fn slow_window(&self) -> usize {
        self.slow_window
    }
}

/// Mean of the trailing `period` values, fed through a fresh copy of `prototype`.
fn trailing_mean(prototype: &Sma, values: &[f64], period: usize) -> f64 {
    let mut sma = prototype.clone();
    sma.reset();
    values[values.len() - period..]
        .iter()
        .fold(0.0, |_, &v| sma.next(v))
}

impl Strategy for MovingAverageStrategy {
    fn name(&self) -> &'static str {
        "MovingAverage"
    }

    fn params(&self) -> Diagnostics {
        Diagnostics::new()
            .with("fastWindow", self.fast_window)
            .with("slowWindow", self.slow_window)
            .with("minimumSpread", self.minimum_spread.value())
            .with("stoplossThreshold", self.stoploss_threshold)
    }

    fn min_candles(&self) -> usize {
        self.slow_window
    }

    fn decide(&self, window: &[Candle], position: &PositionView) -> StrategyAnalysis {
        if window.len() < self.slow_window {
            return StrategyAnalysis::hold(
                Diagnostics::new()
                    .with("fast", 0.0)
                    .with("slow", 0.0)
                    .with("reason", INSUFFICIENT_DATA),
            );
        }

        let closes = closes(window);
        let fast = trailing_mean(&self.ma_fast, &closes, self.fast_window);
        let slow = trailing_mean(&self.ma_slow, &closes, self.slow_window);
        let current_price = closes[closes.len() - 1];
        let possible_profit = position.unrealized_profit_pct(current_price);
        let has_sufficient_spread = self.minimum_spread.is_sufficient(fast, slow);

        let mut diagnostics = position_diagnostics(
            Diagnostics::new()
                .with("fast", fast)
                .with("slow", slow)
                .with("hasSufficientSpread", has_sufficient_spread)
                .with("minimumSpread", self.minimum_spread.value())
                .with("actualSpread", MinimumSpread::actual(fast, slow)),
            current_price,
            position,
            self.stoploss_threshold,
        );

        if stoploss_hit(position, possible_profit, self.stoploss_threshold) {
            diagnostics.set("reason", STOPLOSS_TRIGGERED);
            return StrategyAnalysis::new(Decision::Sell, diagnostics);
        }

        let (decision, reason) = if fast < slow {
            match (position.is_positioned, has_sufficient_spread) {
                (false, true) => (Decision::Buy, "fast_below_slow_buy_low"),
                (false, false) => (Decision::Hold, "fast_below_slow_insufficient_spread_wait"),
                (true, _) => (Decision::Hold, "fast_below_slow_positioned_holding"),
            }
        } else if fast > slow {
            if !position.is_positioned {
                (Decision::Hold, "fast_above_slow_wait_for_dip")
            } else if possible_profit >= position.minimum_profit_threshold {
                (Decision::Sell, "fast_above_slow_sell_high_with_profit")
            } else {
                (Decision::Hold, "fast_above_slow_hold_insufficient_profit")
            }
        } else {
            (Decision::Hold, "fast_equals_slow_neutral")
        };

        tracing::debug!(fast, slow, %decision, reason, "MovingAverage evaluated");
        diagnostics.set("reason", reason);
        StrategyAnalysis::new(decision, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(c, c, c, c, 1.0, (i as i64 + 1) * 60_000).unwrap())
            .collect()
    }

    fn strategy(fast: usize, slow: usize, spread: f64, stoploss: f64) -> MovingAverageStrategy {
        MovingAverageStrategy::new(MovingAverageParams {
            fast_window: fast,
            slow_window: slow,
            minimum_spread: spread,
            stoploss_threshold: stoploss,
        })
        .unwrap()
    }

    #[test]
    fn rejects_invalid_windows() {
        let mut params = MovingAverageParams::default();
        params.fast_window = 40;
        assert!(MovingAverageStrategy::new(params.clone()).is_err());
        params.fast_window = 0;
        assert!(MovingAverageStrategy::new(params.clone()).is_err());
        params.fast_window = 7;
        params.minimum_spread = 150.0;
        assert!(MovingAverageStrategy::new(params.clone()).is_err());
        params.minimum_spread = 0.1;
        params.stoploss_threshold = -1.0;
        assert!(MovingAverageStrategy::new(params).is_err());
    }

    #[test]
    fn short_window_holds_with_insufficient_data() {
        let s = strategy(3, 5, 0.1, 0.0);
        let analysis = s.decide(&window(&[10.0, 9.0, 8.0, 8.0]), &PositionView::flat(0.0));
        assert_eq!(analysis.decision, Decision::Hold);
        assert_eq!(analysis.reason(), Some("insufficient_data"));
        assert_eq!(analysis.diagnostics.get_f64("slow"), Some(0.0));
    }

    #[test]
    fn buys_the_dip_when_flat() {
        let s = strategy(3, 5, 0.1, 0.0);
        let analysis = s.decide(&window(&[10.0, 9.0, 8.0, 8.0, 8.0]), &PositionView::flat(0.0));
        assert_eq!(analysis.decision, Decision::Buy);
        assert_eq!(analysis.reason(), Some("fast_below_slow_buy_low"));
        assert!((analysis.diagnostics.get_f64("fast").unwrap() - 8.0).abs() < 1e-9);
        assert!((analysis.diagnostics.get_f64("slow").unwrap() - 8.6).abs() < 1e-9);
    }

    #[test]
    fn waits_when_spread_is_too_narrow() {
        let s = strategy(3, 5, 50.0, 0.0);
        let analysis = s.decide(&window(&[10.0, 9.0, 8.0, 8.0, 8.0]), &PositionView::flat(0.0));
        assert_eq!(analysis.decision, Decision::Hold);
        assert_eq!(analysis.reason(), Some("fast_below_slow_insufficient_spread_wait"));
    }

    #[test]
    fn sells_high_with_profit() {
        let s = strategy(3, 5, 0.1, 0.0);
        let analysis = s.decide(
            &window(&[8.0, 9.0, 10.0, 10.0, 10.0]),
            &PositionView::positioned(8.0, 0.0),
        );
        assert_eq!(analysis.decision, Decision::Sell);
        assert_eq!(analysis.reason(), Some("fast_above_slow_sell_high_with_profit"));
        assert!((analysis.diagnostics.get_f64("possibleProfit").unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn holds_when_profit_below_threshold() {
        let s = strategy(3, 5, 0.1, 0.0);
        let analysis = s.decide(
            &window(&[8.0, 9.0, 10.0, 10.0, 10.0]),
            &PositionView::positioned(9.9, 5.0),
        );
        assert_eq!(analysis.decision, Decision::Hold);
        assert_eq!(analysis.reason(), Some("fast_above_slow_hold_insufficient_profit"));
    }

    #[test]
    fn remaining_table_rows() {
        let s = strategy(3, 5, 0.1, 0.0);
        let rising = window(&[8.0, 9.0, 10.0, 10.0, 10.0]);
        let falling = window(&[10.0, 9.0, 8.0, 8.0, 8.0]);
        let flat_market = window(&[5.0; 5]);

        assert_eq!(
            s.decide(&rising, &PositionView::flat(0.0)).reason(),
            Some("fast_above_slow_wait_for_dip")
        );
        assert_eq!(
            s.decide(&falling, &PositionView::positioned(8.0, 0.0)).reason(),
            Some("fast_below_slow_positioned_holding")
        );
        assert_eq!(
            s.decide(&flat_market, &PositionView::flat(0.0)).reason(),
            Some("fast_equals_slow_neutral")
        );
    }

    #[test]
    fn stoploss_overrides_the_table() {
        let s = strategy(3, 5, 0.1, 5.0);
        // fast < slow while positioned would otherwise hold.
        let analysis = s.decide(
            &window(&[10.0, 9.0, 8.0, 8.0, 8.0]),
            &PositionView::positioned(10.0, 0.0),
        );
        assert_eq!(analysis.decision, Decision::Sell);
        assert_eq!(analysis.reason(), Some("stoploss_triggered"));
    }

    #[test]
    fn decide_is_deterministic() {
        let s = strategy(3, 5, 0.1, 0.0);
        let w = window(&[10.0, 9.0, 8.0, 8.0, 8.0]);
        let position = PositionView::flat(0.0);
        assert_eq!(s.decide(&w, &position), s.decide(&w, &position));
    }
}
