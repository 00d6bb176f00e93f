use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("Order placement failed: {0}")]
    Order(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Bot state error: {0}")]
    Bot(#[from] core_types::CoreError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Order validation error: {0}")]
    Executor(#[from] executor::ExecutorError),

    #[error("Bot with id '{0}' not found.")]
    BotNotFound(Uuid),

    #[error("Serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
