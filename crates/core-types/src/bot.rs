use crate::enums::{BotStatus, StrategyId};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Static settings a bot is created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotSettings {
    pub symbol: String,
    pub strategy_id: StrategyId,
    /// Target order quantity when `use_fixed_quantity` is set.
    pub quantity: f64,
    pub interval_seconds: u64,
    pub initial_capital: f64,
    /// Quote-currency amount spent per trade when quantity is not fixed.
    pub trade_amount: f64,
    pub currency: String,
    /// Trading fee in percent (0.1 means 0.1%).
    pub trading_fees: f64,
    /// Minimum unrealized profit, in percent, before a strategy may exit.
    pub minimum_profit_threshold: f64,
    pub use_fixed_quantity: bool,
}

/// The bot's position state, as the strategies are allowed to see it.
///
/// This is a `Copy` snapshot with no mutators, so an evaluator cannot change the
/// bot even by accident.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionView {
    pub is_positioned: bool,
    /// Entry price of the open position, `0.0` when flat.
    pub entry_price: f64,
    pub minimum_profit_threshold: f64,
}

impl PositionView {
    pub fn flat(minimum_profit_threshold: f64) -> Self {
        Self {
            is_positioned: false,
            entry_price: 0.0,
            minimum_profit_threshold,
        }
    }

    pub fn positioned(entry_price: f64, minimum_profit_threshold: f64) -> Self {
        Self {
            is_positioned: true,
            entry_price,
            minimum_profit_threshold,
        }
    }

    /// Unrealized profit in percent at `current_price`; `0.0` when there is no entry price.
    pub fn unrealized_profit_pct(&self, current_price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (current_price - self.entry_price) / self.entry_price * 100.0
    }
}

/// A trading bot: its configuration, lifecycle status and position state.
///
/// Position state only changes through [`TradingBot::enter_position`] and
/// [`TradingBot::exit_position`]; both refuse transitions that do not make sense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingBot {
    id: Uuid,
    settings: BotSettings,
    status: BotStatus,
    is_positioned: bool,
    entry_price: f64,
    /// Quantity actually held after buy fees, `0.0` when flat.
    actual_quantity_held: f64,
    created_at: DateTime<Utc>,
}

impl TradingBot {
    /// Creates a stopped, flat bot after validating its settings.
    pub fn new(settings: BotSettings) -> Result<Self, CoreError> {
        if settings.symbol.trim().is_empty() {
            return Err(CoreError::InvalidInput("symbol".into(), "cannot be empty".into()));
        }
        if settings.interval_seconds == 0 {
            return Err(CoreError::InvalidInput(
                "interval_seconds".into(),
                "must be greater than zero".into(),
            ));
        }
        if !(0.0..100.0).contains(&settings.trading_fees) {
            return Err(CoreError::InvalidInput(
                "trading_fees".into(),
                format!("must be within [0, 100) percent (got {})", settings.trading_fees),
            ));
        }
        if !settings.minimum_profit_threshold.is_finite() {
            return Err(CoreError::InvalidInput(
                "minimum_profit_threshold".into(),
                "must be a finite percentage".into(),
            ));
        }
        if settings.quantity < 0.0 || settings.trade_amount < 0.0 || settings.initial_capital < 0.0 {
            return Err(CoreError::InvalidInput(
                "quantity/trade_amount/initial_capital".into(),
                "cannot be negative".into(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            settings,
            status: BotStatus::Stopped,
            is_positioned: false,
            entry_price: 0.0,
            actual_quantity_held: 0.0,
            created_at: Utc::now(),
        })
    }

    pub fn start(&mut self) -> Result<(), CoreError> {
        if self.status != BotStatus::Stopped {
            return Err(CoreError::InvalidTransition(format!(
                "bot is not in stopped status, current status: {}",
                self.status
            )));
        }
        self.status = BotStatus::Running;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), CoreError> {
        if self.status == BotStatus::Stopped {
            return Err(CoreError::InvalidTransition("bot is already stopped".into()));
        }
        self.status = BotStatus::Stopped;
        Ok(())
    }

    /// Opens a position at `entry_price`.
    pub fn enter_position(&mut self, entry_price: f64) -> Result<(), CoreError> {
        if self.is_positioned {
            return Err(CoreError::InvalidTransition(format!(
                "bot is already positioned for {}",
                self.settings.symbol
            )));
        }
        if !entry_price.is_finite() || entry_price <= 0.0 {
            return Err(CoreError::InvalidInput(
                "entry_price".into(),
                format!("must be positive (got {entry_price})"),
            ));
        }
        self.is_positioned = true;
        self.entry_price = entry_price;
        Ok(())
    }

    /// Closes the open position and clears the entry price and held quantity.
    pub fn exit_position(&mut self) -> Result<(), CoreError> {
        if !self.is_positioned {
            return Err(CoreError::InvalidTransition(format!(
                "bot has no open position for {}",
                self.settings.symbol
            )));
        }
        self.is_positioned = false;
        self.entry_price = 0.0;
        self.actual_quantity_held = 0.0;
        Ok(())
    }

    /// Copies the position state of `other` (same bot) while keeping this bot's status.
    pub fn adopt_position(&mut self, other: &TradingBot) -> Result<(), CoreError> {
        if other.id != self.id {
            return Err(CoreError::InvalidTransition(format!(
                "cannot adopt the position of bot {} into bot {}",
                other.id, self.id
            )));
        }
        self.is_positioned = other.is_positioned;
        self.entry_price = other.entry_price;
        self.actual_quantity_held = other.actual_quantity_held;
        Ok(())
    }

    /// Records the quantity received after buy fees. Only meaningful while positioned.
    pub fn record_quantity_held(&mut self, quantity: f64) -> Result<(), CoreError> {
        if !self.is_positioned {
            return Err(CoreError::InvalidTransition(
                "cannot record a held quantity while flat".into(),
            ));
        }
        self.actual_quantity_held = quantity;
        Ok(())
    }

    /// Read-only snapshot for strategy evaluation.
    pub fn view(&self) -> PositionView {
        PositionView {
            is_positioned: self.is_positioned,
            entry_price: self.entry_price,
            minimum_profit_threshold: self.settings.minimum_profit_threshold,
        }
    }

    /// Quantity to request on a buy at `price`: the fixed quantity, or the trade amount
    /// converted at the current price.
    pub fn order_quantity(&self, price: f64) -> f64 {
        if self.settings.use_fixed_quantity || price <= 0.0 {
            self.settings.quantity
        } else {
            self.settings.trade_amount / price
        }
    }

    /// Quantity available to sell, net of the buy-side fee.
    pub fn quantity_for_sell(&self) -> f64 {
        if self.actual_quantity_held > 0.0 {
            return self.actual_quantity_held;
        }
        self.settings.quantity * (1.0 - self.settings.trading_fees / 100.0)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    pub fn symbol(&self) -> &str {
        &self.settings.symbol
    }

    pub fn status(&self) -> BotStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == BotStatus::Running
    }

    pub fn is_positioned(&self) -> bool {
        self.is_positioned
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn actual_quantity_held(&self) -> f64 {
        self.actual_quantity_held
    }

    pub fn trading_fees(&self) -> f64 {
        self.settings.trading_fees
    }

    pub fn minimum_profit_threshold(&self) -> f64 {
        self.settings.minimum_profit_threshold
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BotSettings {
        BotSettings {
            symbol: "SOLBRL".into(),
            strategy_id: StrategyId::MovingAverage,
            quantity: 2.0,
            interval_seconds: 60,
            initial_capital: 10_000.0,
            trade_amount: 1_000.0,
            currency: "BRL".into(),
            trading_fees: 0.1,
            minimum_profit_threshold: 1.5,
            use_fixed_quantity: false,
        }
    }

    #[test]
    fn new_bot_is_stopped_and_flat() {
        let bot = TradingBot::new(settings()).unwrap();
        assert_eq!(bot.status(), BotStatus::Stopped);
        assert!(!bot.is_positioned());
        assert_eq!(bot.entry_price(), 0.0);
    }

    #[test]
    fn start_only_from_stopped() {
        let mut bot = TradingBot::new(settings()).unwrap();
        bot.start().unwrap();
        assert!(bot.start().is_err());
        bot.stop().unwrap();
        assert!(bot.stop().is_err());
    }

    #[test]
    fn adopting_a_position_keeps_the_status() {
        let mut stored = TradingBot::new(settings()).unwrap();
        let mut working = stored.clone();
        working.start().unwrap();
        working.enter_position(120.0).unwrap();
        working.record_quantity_held(8.25).unwrap();

        stored.adopt_position(&working).unwrap();
        assert_eq!(stored.status(), BotStatus::Stopped);
        assert!(stored.is_positioned());
        assert_eq!(stored.entry_price(), 120.0);
        assert_eq!(stored.actual_quantity_held(), 8.25);

        let other = TradingBot::new(settings()).unwrap();
        assert!(stored.adopt_position(&other).is_err());
    }

    #[test]
    fn position_transitions_are_guarded() {
        let mut bot = TradingBot::new(settings()).unwrap();
        assert!(bot.exit_position().is_err());

        bot.enter_position(120.0).unwrap();
        assert!(bot.enter_position(121.0).is_err());
        assert_eq!(bot.entry_price(), 120.0);

        bot.record_quantity_held(8.25).unwrap();
        bot.exit_position().unwrap();
        assert_eq!(bot.entry_price(), 0.0);
        assert_eq!(bot.actual_quantity_held(), 0.0);
    }

    #[test]
    fn view_reflects_position_and_threshold() {
        let mut bot = TradingBot::new(settings()).unwrap();
        assert_eq!(bot.view(), PositionView::flat(1.5));
        bot.enter_position(50.0).unwrap();
        let view = bot.view();
        assert!(view.is_positioned);
        assert!((view.unrealized_profit_pct(55.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn unrealized_profit_is_zero_without_entry() {
        assert_eq!(PositionView::flat(0.0).unrealized_profit_pct(123.0), 0.0);
    }

    #[test]
    fn quantities_follow_sizing_mode() {
        let mut s = settings();
        let bot = TradingBot::new(s.clone()).unwrap();
        assert!((bot.order_quantity(250.0) - 4.0).abs() < 1e-12);
        assert!((bot.quantity_for_sell() - 2.0 * 0.999).abs() < 1e-12);

        s.use_fixed_quantity = true;
        let bot = TradingBot::new(s).unwrap();
        assert_eq!(bot.order_quantity(250.0), 2.0);
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut s = settings();
        s.symbol = " ".into();
        assert!(TradingBot::new(s).is_err());

        let mut s = settings();
        s.trading_fees = -0.1;
        assert!(TradingBot::new(s).is_err());

        let mut s = settings();
        s.interval_seconds = 0;
        assert!(TradingBot::new(s).is_err());
    }
}
