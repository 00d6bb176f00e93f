use crate::analysis::{
    closes, position_diagnostics, stoploss_hit, validate_stoploss, Diagnostics, StrategyAnalysis,
    INSUFFICIENT_DATA, STOPLOSS_TRIGGERED,
};
use crate::error::StrategyError;
use crate::Strategy;
use configuration::RsiParams;
use core_types::{Candle, Decision, PositionView};
use std::fmt;

/// Where an RSI value sits relative to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiSignal {
    Oversold,
    Overbought,
    Neutral,
}

impl RsiSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsiSignal::Oversold => "OVERSOLD",
            RsiSignal::Overbought => "OVERBOUGHT",
            RsiSignal::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for RsiSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative Strength Index strategy with Wilder's smoothing.
#[derive(Debug, Clone)]
pub struct RsiStrategy {
    period: usize,
    oversold: f64,
    overbought: f64,
    stoploss_threshold: f64,
}

impl RsiStrategy {
    pub fn new(params: RsiParams) -> Result<Self, StrategyError> {
        if params.period == 0 {
            return Err(StrategyError::InvalidParameters(
                "RSI period must be greater than zero".to_string(),
            ));
        }
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(params.oversold) || !in_range(params.overbought) {
            return Err(StrategyError::InvalidParameters(format!(
                "RSI thresholds must be within [0, 100] (got {} / {})",
                params.oversold, params.overbought
            )));
        }
        if params.oversold >= params.overbought {
            return Err(StrategyError::InvalidParameters(
                "Oversold threshold must be below overbought threshold".to_string(),
            ));
        }
        validate_stoploss(params.stoploss_threshold)?;

        Ok(Self {
            period: params.period,
            oversold: params.oversold,
            overbought: params.overbought,
            stoploss_threshold: params.stoploss_threshold,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Computes the RSI over `closes`, which must hold at least `period + 1` values.
    ///
    /// The first `period` changes seed simple averages of gains and losses; every
    /// later change is folded in with `avg = (avg * (period - 1) + value) / period`.
    /// Returns `None` when the seeding changes contain no movement at all.
    pub fn calculate(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() < self.period + 1 {
            return None;
        }
        let period = self.period as f64;
        let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let (seed, rest) = changes.split_at(self.period);

        let mut avg_gain = seed.iter().filter(|c| **c > 0.0).sum::<f64>() / period;
        let mut avg_loss = seed.iter().filter(|c| **c < 0.0).map(|c| -c).sum::<f64>() / period;
        if avg_gain == 0.0 && avg_loss == 0.0 {
            return None;
        }

        for &change in rest {
            let (gain, loss) = if change > 0.0 { (change, 0.0) } else { (0.0, -change) };
            avg_gain = (avg_gain * (period - 1.0) + gain) / period;
            avg_loss = (avg_loss * (period - 1.0) + loss) / period;
        }

        if avg_loss == 0.0 {
            return Some(100.0);
        }
        let rs = avg_gain / avg_loss;
        Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
    }

    pub fn classify(&self, rsi: f64) -> RsiSignal {
        if rsi < self.oversold {
            RsiSignal::Oversold
        } else if rsi > self.overbought {
            RsiSignal::Overbought
        } else {
            RsiSignal::Neutral
        }
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &'static str {
        "RSI"
    }

    fn params(&self) -> Diagnostics {
        Diagnostics::new()
            .with("period", self.period)
            .with("oversoldThreshold", self.oversold)
            .with("overboughtThreshold", self.overbought)
            .with("stoplossThreshold", self.stoploss_threshold)
    }

    fn min_candles(&self) -> usize {
        self.period + 1
    }

    fn decide(&self, window: &[Candle], position: &PositionView) -> StrategyAnalysis {
        let neutral = || {
            Diagnostics::new()
                .with("rsi", 0.0)
                .with("signal", RsiSignal::Neutral.as_str())
        };
        if window.len() < self.period + 1 {
            return StrategyAnalysis::hold(neutral().with("reason", INSUFFICIENT_DATA));
        }

        let closes = closes(window);
        let Some(rsi) = self.calculate(&closes) else {
            tracing::debug!(period = self.period, "RSI undefined: no price movement in seed period");
            return StrategyAnalysis::hold(
                neutral()
                    .with("reason", "calculation_error")
                    .with("error", "no price changes detected in the data"),
            );
        };

        let signal = self.classify(rsi);
        let current_price = closes[closes.len() - 1];
        let possible_profit = position.unrealized_profit_pct(current_price);

        let mut diagnostics = position_diagnostics(
            Diagnostics::new()
                .with("rsi", rsi)
                .with("signal", signal.as_str())
                .with("period", self.period)
                .with("oversoldThreshold", self.oversold)
                .with("overboughtThreshold", self.overbought),
            current_price,
            position,
            self.stoploss_threshold,
        );

        if stoploss_hit(position, possible_profit, self.stoploss_threshold) {
            diagnostics.set("reason", STOPLOSS_TRIGGERED);
            return StrategyAnalysis::new(Decision::Sell, diagnostics);
        }

        let (decision, reason) = match (signal, position.is_positioned) {
            (RsiSignal::Oversold, false) => (Decision::Buy, "rsi_oversold_buy_signal"),
            (RsiSignal::Overbought, true) => {
                if possible_profit >= position.minimum_profit_threshold {
                    (Decision::Sell, "rsi_overbought_sell_with_profit")
                } else {
                    (Decision::Hold, "rsi_overbought_hold_insufficient_profit")
                }
            }
            (RsiSignal::Oversold, true) => (Decision::Hold, "rsi_oversold_positioned_holding"),
            (RsiSignal::Overbought, false) => (Decision::Hold, "rsi_overbought_wait_for_dip"),
            (RsiSignal::Neutral, false) => (Decision::Hold, "rsi_neutral_wait_for_signal"),
            (RsiSignal::Neutral, true) => (Decision::Hold, "rsi_neutral_positioned_holding"),
        };

        tracing::debug!(rsi, %signal, %decision, reason, "RSI evaluated");
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

    fn rsi14() -> RsiStrategy {
        RsiStrategy::new(RsiParams::default()).unwrap()
    }

    fn rising() -> Vec<f64> {
        (0..16).map(|i| 40.0 + i as f64).collect()
    }

    fn falling() -> Vec<f64> {
        (0..16).map(|i| 55.0 - i as f64).collect()
    }

    #[test]
    fn rejects_invalid_parameters() {
        let bad = [
            RsiParams { period: 0, ..RsiParams::default() },
            RsiParams { oversold: 80.0, ..RsiParams::default() },
            RsiParams { overbought: 120.0, ..RsiParams::default() },
            RsiParams { stoploss_threshold: f64::NAN, ..RsiParams::default() },
        ];
        for params in bad {
            assert!(RsiStrategy::new(params).is_err());
        }
    }

    #[test]
    fn needs_period_plus_one_candles() {
        let analysis = rsi14().decide(&window(&rising()[..14]), &PositionView::flat(0.0));
        assert_eq!(analysis.decision, Decision::Hold);
        assert_eq!(analysis.reason(), Some("insufficient_data"));
        assert_eq!(analysis.diagnostics.get_str("signal"), Some("NEUTRAL"));
    }

    #[test]
    fn wilder_smoothing_matches_hand_computation() {
        let s = RsiStrategy::new(RsiParams { period: 2, ..RsiParams::default() }).unwrap();
        // changes: +2, -1 | +1
        // seed: gain 1.0, loss 0.5; smoothed: gain 1.0, loss 0.25 -> RS 4 -> RSI 80
        let rsi = s.calculate(&[10.0, 12.0, 11.0, 12.0]).unwrap();
        assert!((rsi - 80.0).abs() < 1e-9);
    }

    #[test]
    fn only_gains_gives_rsi_100() {
        assert_eq!(rsi14().calculate(&rising()), Some(100.0));
        assert_eq!(rsi14().calculate(&falling()), Some(0.0));
    }

    #[test]
    fn flat_seed_period_is_a_calculation_error_hold() {
        let analysis = rsi14().decide(&window(&[50.0; 16]), &PositionView::flat(0.0));
        assert_eq!(analysis.decision, Decision::Hold);
        assert_eq!(analysis.reason(), Some("calculation_error"));
    }

    #[test]
    fn sells_overbought_with_profit() {
        let analysis = rsi14().decide(&window(&rising()), &PositionView::positioned(40.0, 1.0));
        assert_eq!(analysis.decision, Decision::Sell);
        assert_eq!(analysis.reason(), Some("rsi_overbought_sell_with_profit"));
        assert_eq!(analysis.diagnostics.get_f64("rsi"), Some(100.0));
        assert_eq!(analysis.diagnostics.get_str("signal"), Some("OVERBOUGHT"));
    }

    #[test]
    fn holds_overbought_without_enough_profit() {
        let analysis = rsi14().decide(&window(&rising()), &PositionView::positioned(54.0, 5.0));
        assert_eq!(analysis.decision, Decision::Hold);
        assert_eq!(analysis.reason(), Some("rsi_overbought_hold_insufficient_profit"));
    }

    #[test]
    fn buys_oversold_when_flat() {
        let analysis = rsi14().decide(&window(&falling()), &PositionView::flat(0.0));
        assert_eq!(analysis.decision, Decision::Buy);
        assert_eq!(analysis.reason(), Some("rsi_oversold_buy_signal"));
    }

    #[test]
    fn hold_reasons_per_combination() {
        let s = rsi14();
        let zigzag: Vec<f64> = (0..16).map(|i| if i % 2 == 0 { 50.0 } else { 51.0 }).collect();

        assert_eq!(
            s.decide(&window(&falling()), &PositionView::positioned(45.0, 0.0)).reason(),
            Some("rsi_oversold_positioned_holding")
        );
        assert_eq!(
            s.decide(&window(&rising()), &PositionView::flat(0.0)).reason(),
            Some("rsi_overbought_wait_for_dip")
        );
        assert_eq!(
            s.decide(&window(&zigzag), &PositionView::flat(0.0)).reason(),
            Some("rsi_neutral_wait_for_signal")
        );
        assert_eq!(
            s.decide(&window(&zigzag), &PositionView::positioned(50.0, 0.0)).reason(),
            Some("rsi_neutral_positioned_holding")
        );
    }

    #[test]
    fn stoploss_has_priority() {
        let s = RsiStrategy::new(RsiParams { stoploss_threshold: 10.0, ..RsiParams::default() })
            .unwrap();
        // Oversold while positioned would otherwise hold.
        let analysis = s.decide(&window(&falling()), &PositionView::positioned(55.0, 0.0));
        assert_eq!(analysis.decision, Decision::Sell);
        assert_eq!(analysis.reason(), Some("stoploss_triggered"));
    }
}
