use crate::error::{ExecutorError, FilterViolation};
use rust_decimal::prelude::{Decimal, FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Floating-point tolerance for step and tick comparisons.
pub const TOLERANCE: f64 = 1e-8;

/// Maximum number of decimals a formatted quantity carries.
const MAX_DECIMALS: u32 = 8;

/// Exchange trading rules for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFilter {
    symbol: String,
    min_quantity: f64,
    max_quantity: f64,
    step_size: f64,
    min_price: f64,
    max_price: f64,
    tick_size: f64,
    min_notional: f64,
}

/// `LOT_SIZE` group as published by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotSizeFilter {
    pub min_qty: f64,
    pub max_qty: f64,
    pub step_size: f64,
}

/// `PRICE_FILTER` group as published by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFilter {
    pub min_price: f64,
    pub max_price: f64,
    pub tick_size: f64,
}

/// Raw per-symbol metadata; every group is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeFilters {
    pub symbol: String,
    #[serde(default)]
    pub lot_size: Option<LotSizeFilter>,
    #[serde(default)]
    pub price_filter: Option<PriceFilter>,
    #[serde(default)]
    pub min_notional: Option<f64>,
}

impl SymbolFilter {
    /// A zero `step_size` or `tick_size` leaves that grid unrestricted.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        min_quantity: f64,
        max_quantity: f64,
        step_size: f64,
        min_price: f64,
        max_price: f64,
        tick_size: f64,
        min_notional: f64,
    ) -> Result<Self, ExecutorError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(ExecutorError::InvalidFilter("symbol cannot be empty".into()));
        }
        let all = [min_quantity, max_quantity, step_size, min_price, max_price, tick_size, min_notional];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(ExecutorError::InvalidFilter(format!("non-finite constraint for {symbol}")));
        }
        if min_quantity < 0.0 || max_quantity < 0.0 || step_size < 0.0 {
            return Err(ExecutorError::InvalidFilter(format!("invalid quantity constraints for {symbol}")));
        }
        if min_quantity > max_quantity {
            return Err(ExecutorError::InvalidFilter(format!(
                "minQuantity cannot be greater than maxQuantity for {symbol}"
            )));
        }
        if min_price < 0.0 || max_price < 0.0 || tick_size < 0.0 {
            return Err(ExecutorError::InvalidFilter(format!("invalid price constraints for {symbol}")));
        }
        if min_price > max_price {
            return Err(ExecutorError::InvalidFilter(format!(
                "minPrice cannot be greater than maxPrice for {symbol}"
            )));
        }
        if min_notional < 0.0 {
            return Err(ExecutorError::InvalidFilter(format!("invalid notional constraint for {symbol}")));
        }

        Ok(Self {
            symbol,
            min_quantity,
            max_quantity,
            step_size,
            min_price,
            max_price,
            tick_size,
            min_notional,
        })
    }

    /// Builds a filter from optional metadata groups, falling back to permissive
    /// defaults for any group the exchange did not send.
    ///
    /// A zero maximum is how exchanges disable a limit, so it becomes unbounded.
    pub fn from_exchange_filters(filters: &ExchangeFilters) -> Result<Self, ExecutorError> {
        let unbounded = |max: f64| if max == 0.0 { f64::MAX } else { max };
        let lot = filters.lot_size.unwrap_or(LotSizeFilter {
            min_qty: 0.0,
            max_qty: 999_999_999.0,
            step_size: 1.0,
        });
        let price = filters.price_filter.unwrap_or(PriceFilter {
            min_price: 0.0,
            max_price: 999_999_999.0,
            tick_size: 0.01,
        });
        Self::new(
            filters.symbol.clone(),
            lot.min_qty,
            unbounded(lot.max_qty),
            lot.step_size,
            price.min_price,
            unbounded(price.max_price),
            price.tick_size,
            filters.min_notional.unwrap_or(0.0),
        )
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn min_quantity(&self) -> f64 {
        self.min_quantity
    }

    pub fn max_quantity(&self) -> f64 {
        self.max_quantity
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn min_price(&self) -> f64 {
        self.min_price
    }

    pub fn max_price(&self) -> f64 {
        self.max_price
    }

    pub fn tick_size(&self) -> f64 {
        self.tick_size
    }

    pub fn min_notional(&self) -> f64 {
        self.min_notional
    }

    pub fn validate_quantity(&self, quantity: f64) -> Result<(), FilterViolation> {
        if quantity < self.min_quantity {
            return Err(FilterViolation::QuantityBelowMinimum {
                symbol: self.symbol.clone(),
                quantity,
                min: self.min_quantity,
            });
        }
        if quantity > self.max_quantity {
            return Err(FilterViolation::QuantityAboveMaximum {
                symbol: self.symbol.clone(),
                quantity,
                max: self.max_quantity,
            });
        }
        if !is_multiple_of(quantity, self.step_size) {
            return Err(FilterViolation::StepSize {
                symbol: self.symbol.clone(),
                quantity,
                step: self.step_size,
            });
        }
        Ok(())
    }

    pub fn validate_price(&self, price: f64) -> Result<(), FilterViolation> {
        if price < self.min_price {
            return Err(FilterViolation::PriceBelowMinimum {
                symbol: self.symbol.clone(),
                price,
                min: self.min_price,
            });
        }
        if price > self.max_price {
            return Err(FilterViolation::PriceAboveMaximum {
                symbol: self.symbol.clone(),
                price,
                max: self.max_price,
            });
        }
        if !is_multiple_of(price, self.tick_size) {
            return Err(FilterViolation::TickSize {
                symbol: self.symbol.clone(),
                price,
                tick: self.tick_size,
            });
        }
        Ok(())
    }

    /// `quantity * price >= min_notional`; always passes when no minimum is set.
    pub fn validate_notional(&self, quantity: f64, price: f64) -> Result<(), FilterViolation> {
        if self.min_notional <= 0.0 {
            return Ok(());
        }
        let notional = quantity * price;
        if notional < self.min_notional {
            return Err(FilterViolation::Notional {
                symbol: self.symbol.clone(),
                notional,
                min: self.min_notional,
            });
        }
        Ok(())
    }

    /// Moves `quantity` onto the step grid.
    ///
    /// Rounds down first; if that lands under the minimum, rounds up instead; if that
    /// is still out of bounds, falls back to the minimum. A result above the maximum
    /// is pulled down to the largest step that fits. Without a step size the quantity
    /// is only clamped to its bounds.
    pub fn adjust_quantity_to_step_size(&self, quantity: f64) -> f64 {
        let step = self.step_size;
        if step <= 0.0 {
            return quantity.clamp(self.min_quantity, self.max_quantity);
        }
        let steps = quantity / step;

        let mut adjusted = self.on_grid((steps + TOLERANCE).floor());
        if adjusted < self.min_quantity {
            adjusted = self.on_grid((steps - TOLERANCE).ceil());
            if adjusted < self.min_quantity || adjusted > self.max_quantity {
                adjusted = self.min_quantity;
            }
        }
        if adjusted > self.max_quantity {
            adjusted = self.on_grid((self.max_quantity / step + TOLERANCE).floor());
        }
        adjusted
    }

    /// Number of decimals implied by the step size, capped at eight.
    ///
    /// Counts the step's significant decimals whatever its magnitude, so a step of
    /// `1.5` gives one decimal and `10` gives none. An unrestricted step gives eight.
    pub fn quantity_decimals(&self) -> u32 {
        self.step_decimal()
            .map(|d| d.scale())
            .unwrap_or(MAX_DECIMALS)
            .min(MAX_DECIMALS)
    }

    /// Formats a quantity with exactly the step size's precision, ready for an order.
    pub fn format_quantity(&self, quantity: f64) -> String {
        format!("{:.*}", self.quantity_decimals() as usize, quantity)
    }

    /// The step size as an exact decimal, without binary floating-point noise.
    fn step_decimal(&self) -> Option<Decimal> {
        if self.step_size <= 0.0 {
            return None;
        }
        Decimal::from_f64(self.step_size).map(|d| d.round_dp(2 * MAX_DECIMALS).normalize())
    }

    /// `steps` whole steps, computed in decimal so `101 * 0.1` is exactly `10.1`.
    fn on_grid(&self, steps: f64) -> f64 {
        Decimal::from_f64(steps)
            .zip(self.step_decimal())
            .and_then(|(n, step)| n.checked_mul(step))
            .and_then(|d| d.to_f64())
            .unwrap_or(steps * self.step_size)
    }
}

/// Whether `value` is a whole number of `increment`s, within [`TOLERANCE`].
fn is_multiple_of(value: f64, increment: f64) -> bool {
    if increment <= 0.0 {
        return true;
    }
    let steps = value / increment;
    (steps - steps.round()).abs() <= TOLERANCE
}

impl fmt::Display for SymbolFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SymbolFilter{{{}: qty[{:.8}-{:.8}/{:.8}], price[{:.8}-{:.8}/{:.8}], notional:{:.2}}}",
            self.symbol,
            self.min_quantity,
            self.max_quantity,
            self.step_size,
            self.min_price,
            self.max_price,
            self.tick_size,
            self.min_notional
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc() -> SymbolFilter {
        SymbolFilter::new("BTCUSDT", 0.00001, 9000.0, 0.00001, 0.01, 1_000_000.0, 0.01, 5.0).unwrap()
    }

    #[test]
    fn construction_rejects_broken_constraints() {
        assert!(SymbolFilter::new("", 0.0, 1.0, 0.1, 0.0, 1.0, 0.1, 0.0).is_err());
        assert!(SymbolFilter::new("X", 0.0, 1.0, -0.1, 0.0, 1.0, 0.1, 0.0).is_err());
        assert!(SymbolFilter::new("X", 2.0, 1.0, 0.1, 0.0, 1.0, 0.1, 0.0).is_err());
        assert!(SymbolFilter::new("X", 0.0, 1.0, 0.1, 0.0, 1.0, -0.1, 0.0).is_err());
        assert!(SymbolFilter::new("X", 0.0, 1.0, 0.1, 0.0, 1.0, 0.1, -1.0).is_err());
    }

    #[test]
    fn step_size_uses_tolerance() {
        let f = SymbolFilter::new("X", 0.0, 100.0, 0.1, 0.0, 100.0, 0.01, 0.0).unwrap();
        // 0.3 / 0.1 is 2.9999999999999996 in binary floating point.
        assert!(f.validate_quantity(0.3).is_ok());
        assert!(f.validate_quantity(0.35).is_err());
        assert!(f.validate_price(19.99).is_ok());
        assert!(f.validate_price(19.995).is_err());
    }

    #[test]
    fn quantity_bounds_and_notional() {
        let f = btc();
        assert!(matches!(
            f.validate_quantity(0.000001),
            Err(FilterViolation::QuantityBelowMinimum { .. })
        ));
        assert!(matches!(
            f.validate_quantity(9001.0),
            Err(FilterViolation::QuantityAboveMaximum { .. })
        ));
        assert!(f.validate_notional(0.0001, 30_000.0).is_err());
        assert!(f.validate_notional(0.001, 30_000.0).is_ok());
    }

    #[test]
    fn adjustment_rounds_down_then_up_then_clamps() {
        let f = SymbolFilter::new("X", 1.0, 10.0, 0.5, 0.0, 100.0, 0.01, 0.0).unwrap();
        assert_eq!(f.adjust_quantity_to_step_size(3.7), 3.5);
        assert_eq!(f.adjust_quantity_to_step_size(0.8), 1.0);
        assert_eq!(f.adjust_quantity_to_step_size(12.3), 10.0);

        let odd = SymbolFilter::new("Y", 0.7, 0.9, 0.5, 0.0, 100.0, 0.01, 0.0).unwrap();
        // floor gives 0.5 < min, ceil gives 1.0 > max: falls back to the minimum.
        assert_eq!(odd.adjust_quantity_to_step_size(0.6), 0.7);
    }

    #[test]
    fn adjustment_stays_on_steps_above_one() {
        let one_and_half = SymbolFilter::new("X", 0.0, 1000.0, 1.5, 0.0, 1e6, 0.01, 0.0).unwrap();
        assert_eq!(one_and_half.adjust_quantity_to_step_size(5.0), 4.5);
        assert_eq!(one_and_half.quantity_decimals(), 1);
        assert_eq!(one_and_half.format_quantity(4.5), "4.5");

        let two_and_half = SymbolFilter::new("X", 0.0, 1000.0, 2.5, 0.0, 1e6, 0.01, 0.0).unwrap();
        assert_eq!(two_and_half.adjust_quantity_to_step_size(8.0), 7.5);
        assert!(two_and_half.validate_quantity(7.5).is_ok());

        let ten = SymbolFilter::new("X", 0.0, 1000.0, 10.0, 0.0, 1e6, 0.01, 0.0).unwrap();
        assert_eq!(ten.adjust_quantity_to_step_size(37.0), 30.0);
        assert_eq!(ten.quantity_decimals(), 0);
    }

    #[test]
    fn zero_step_and_tick_are_unrestricted() {
        let f = SymbolFilter::new("X", 0.5, 100.0, 0.0, 0.0, 1e6, 0.0, 0.0).unwrap();
        assert!(f.validate_quantity(1.23456789).is_ok());
        assert!(f.validate_price(101.123).is_ok());
        assert_eq!(f.adjust_quantity_to_step_size(0.1), 0.5);
        assert_eq!(f.quantity_decimals(), 8);
    }

    #[test]
    fn zero_maximums_become_unbounded() {
        let f = SymbolFilter::from_exchange_filters(&ExchangeFilters {
            symbol: "ODDUSDT".into(),
            lot_size: Some(LotSizeFilter {
                min_qty: 0.0,
                max_qty: 0.0,
                step_size: 0.0,
            }),
            price_filter: Some(PriceFilter {
                min_price: 0.0,
                max_price: 0.0,
                tick_size: 0.0,
            }),
            min_notional: None,
        })
        .unwrap();
        assert_eq!(f.max_quantity(), f64::MAX);
        assert_eq!(f.max_price(), f64::MAX);
        assert!(f.validate_price(64_000.5).is_ok());
        assert!(f.validate_quantity(3.3).is_ok());
    }

    #[test]
    fn decimals_follow_step_size() {
        let with_step = |step| SymbolFilter::new("X", 0.0, 1e9, step, 0.0, 1e9, 0.01, 0.0).unwrap();
        assert_eq!(with_step(1.0).quantity_decimals(), 0);
        assert_eq!(with_step(0.1).quantity_decimals(), 1);
        assert_eq!(with_step(0.001).quantity_decimals(), 3);
        assert_eq!(with_step(0.00001).quantity_decimals(), 5);
        assert_eq!(with_step(0.000000001).quantity_decimals(), 8);
        assert_eq!(with_step(0.1).format_quantity(10.100000000000001), "10.1");
    }

    #[test]
    fn missing_groups_use_permissive_defaults() {
        let f = SymbolFilter::from_exchange_filters(&ExchangeFilters {
            symbol: "DOGEUSDT".into(),
            ..ExchangeFilters::default()
        })
        .unwrap();
        assert_eq!(f.step_size(), 1.0);
        assert_eq!(f.tick_size(), 0.01);
        assert_eq!(f.max_quantity(), 999_999_999.0);
        assert_eq!(f.min_notional(), 0.0);
    }
}
