use crate::enums::Decision;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A record of one evaluated decision, written on every live cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingDecisionLog {
    pub id: Uuid,
    pub bot_id: Uuid,
    pub decision: Decision,
    pub strategy_name: String,
    /// The strategy's diagnostics map, verbatim.
    pub analysis: Map<String, Value>,
    pub current_price: f64,
    /// Unrealized profit in percent at the time of the decision.
    pub possible_profit: f64,
    pub window_len: usize,
    pub timestamp: DateTime<Utc>,
}

impl TradingDecisionLog {
    pub fn new(
        bot_id: Uuid,
        decision: Decision,
        strategy_name: impl Into<String>,
        analysis: Map<String, Value>,
        current_price: f64,
        window_len: usize,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let possible_profit = analysis
            .get("possibleProfit")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        Self {
            id: Uuid::new_v4(),
            bot_id,
            decision,
            strategy_name: strategy_name.into(),
            analysis,
            current_price,
            possible_profit,
            window_len,
            timestamp,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        self.analysis.get("reason").and_then(Value::as_str)
    }
}
