use crate::error::AnalyticsError;
use chrono::{DateTime, Duration, Utc};
use core_types::OrderSide;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One simulated round trip. Opened on an entry signal, closed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestTrade {
    id: Uuid,
    symbol: String,
    side: OrderSide,
    entry_price: f64,
    entry_time: DateTime<Utc>,
    exit_price: Option<f64>,
    exit_time: Option<DateTime<Utc>>,
    quantity: f64,
    profit_loss: Option<f64>,
    entry_reason: String,
}

impl BacktestTrade {
    pub fn open(
        symbol: impl Into<String>,
        side: OrderSide,
        entry_price: f64,
        quantity: f64,
        entry_time: DateTime<Utc>,
        entry_reason: impl Into<String>,
    ) -> Result<Self, AnalyticsError> {
        if !entry_price.is_finite() || entry_price <= 0.0 {
            return Err(AnalyticsError::InvalidTrade(format!(
                "entry price must be positive (got {entry_price})"
            )));
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(AnalyticsError::InvalidTrade(format!(
                "quantity must be positive (got {quantity})"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            side,
            entry_price,
            entry_time,
            exit_price: None,
            exit_time: None,
            quantity,
            profit_loss: None,
            entry_reason: entry_reason.into(),
        })
    }

    /// Closes the trade and returns the realized P&L.
    pub fn close(&mut self, exit_price: f64, exit_time: DateTime<Utc>) -> Result<f64, AnalyticsError> {
        if !self.is_open() {
            return Err(AnalyticsError::TradeAlreadyClosed(self.id.to_string()));
        }
        if !exit_price.is_finite() || exit_price < 0.0 {
            return Err(AnalyticsError::InvalidTrade(format!(
                "exit price must be non-negative (got {exit_price})"
            )));
        }

        let pnl = match self.side {
            OrderSide::Buy => (exit_price - self.entry_price) * self.quantity,
            OrderSide::Sell => (self.entry_price - exit_price) * self.quantity,
        };
        self.exit_price = Some(exit_price);
        self.exit_time = Some(exit_time);
        self.profit_loss = Some(pnl);
        Ok(pnl)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn entry_time(&self) -> DateTime<Utc> {
        self.entry_time
    }

    pub fn exit_price(&self) -> Option<f64> {
        self.exit_price
    }

    pub fn exit_time(&self) -> Option<DateTime<Utc>> {
        self.exit_time
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn profit_loss(&self) -> Option<f64> {
        self.profit_loss
    }

    pub fn entry_reason(&self) -> &str {
        &self.entry_reason
    }

    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    pub fn is_winning(&self) -> bool {
        self.profit_loss.is_some_and(|p| p > 0.0)
    }

    pub fn is_losing(&self) -> bool {
        self.profit_loss.is_some_and(|p| p < 0.0)
    }

    pub fn holding_period(&self) -> Option<Duration> {
        self.exit_time.map(|exit| exit - self.entry_time)
    }
}
