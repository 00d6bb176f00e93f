use crate::error::ExecutorError;
use crate::exchange::ExchangeInfo;
use crate::filter::SymbolFilter;
use serde::Serialize;

/// Outcome of validating one proposed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderValidationResult {
    pub is_valid: bool,
    pub original_quantity: f64,
    pub adjusted_quantity: f64,
    /// The adjusted quantity at the step size's precision, ready for the order payload.
    pub formatted_quantity: String,
    pub errors: Vec<String>,
    /// Non-fatal notes, e.g. a quantity that was moved onto the step grid.
    pub warnings: Vec<String>,
    pub filter: Option<SymbolFilter>,
}

impl OrderValidationResult {
    pub fn was_adjusted(&self) -> bool {
        self.adjusted_quantity != self.original_quantity
    }

    /// Converts a rejected result into an error carrying the full error list.
    pub fn ensure_valid(self, symbol: &str) -> Result<Self, ExecutorError> {
        if self.is_valid {
            Ok(self)
        } else {
            Err(ExecutorError::OrderRejected {
                symbol: symbol.to_string(),
                errors: self.errors,
            })
        }
    }
}

/// Checks proposed orders against a symbol's exchange rules.
///
/// Never touches the network: the filter is supplied by the caller, either directly or
/// through an [`ExchangeInfo`] cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderValidator;

impl OrderValidator {
    pub fn new() -> Self {
        Self
    }

    /// Looks up the symbol's filter and validates against it.
    ///
    /// Missing metadata is a failed validation, not an error.
    pub fn validate_symbol(
        &self,
        exchange: &dyn ExchangeInfo,
        symbol: &str,
        quantity: f64,
        price: f64,
    ) -> OrderValidationResult {
        match exchange.symbol_filter(symbol) {
            Ok(filter) => self.validate(&filter, quantity, price),
            Err(e) => {
                tracing::warn!(symbol, error = %e, "No exchange metadata, rejecting order");
                OrderValidationResult {
                    is_valid: false,
                    original_quantity: quantity,
                    adjusted_quantity: quantity,
                    formatted_quantity: format!("{quantity:.6}"),
                    errors: vec![format!("Failed to get exchange info for {symbol}: {e}")],
                    warnings: Vec::new(),
                    filter: None,
                }
            }
        }
    }

    /// Validates `quantity` and `price` against `filter`.
    ///
    /// A quantity that breaks the lot-size rules is moved onto the step grid and
    /// re-checked together with the notional; the move is reported as a warning. Price
    /// is never corrected, only reported.
    pub fn validate(&self, filter: &SymbolFilter, quantity: f64, price: f64) -> OrderValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut adjusted_quantity = quantity;

        let quantity_check = filter.validate_quantity(quantity);
        let price_check = filter.validate_price(price);
        let notional_check = filter.validate_notional(quantity, price);

        let mut is_valid = match &quantity_check {
            Ok(()) => true,
            Err(violation) => {
                adjusted_quantity = filter.adjust_quantity_to_step_size(quantity);
                let adjusted_check = filter.validate_quantity(adjusted_quantity);
                let adjusted_notional = filter.validate_notional(adjusted_quantity, price);

                match (adjusted_check, adjusted_notional) {
                    (Ok(()), Ok(())) => {
                        warnings.push(format!(
                            "Quantity adjusted from {quantity:.8} to {adjusted_quantity:.8} to comply with step size {:.8}",
                            filter.step_size()
                        ));
                        true
                    }
                    (adjusted_check, adjusted_notional) => {
                        errors.push(violation.to_string());
                        if let Err(e) = adjusted_check {
                            errors.push(format!("Even after adjustment: {e}"));
                        }
                        if let Err(e) = adjusted_notional {
                            errors.push(format!("Adjusted quantity notional error: {e}"));
                        }
                        false
                    }
                }
            }
        };

        if let Err(e) = price_check {
            errors.push(e.to_string());
            is_valid = false;
        }
        // The original notional only matters when the quantity was left untouched.
        if let (Ok(()), Err(e)) = (&quantity_check, notional_check) {
            errors.push(e.to_string());
            is_valid = false;
        }

        let result = OrderValidationResult {
            is_valid,
            original_quantity: quantity,
            adjusted_quantity,
            formatted_quantity: filter.format_quantity(adjusted_quantity),
            errors,
            warnings,
            filter: Some(filter.clone()),
        };

        for warning in &result.warnings {
            tracing::warn!(symbol = filter.symbol(), "{warning}");
        }
        if !result.is_valid {
            tracing::debug!(symbol = filter.symbol(), errors = ?result.errors, "Order failed validation");
        }
        result
    }
}
