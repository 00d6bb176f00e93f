use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Analytics calculation error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Bot state error: {0}")]
    Bot(#[from] core_types::CoreError),

    #[error("Failed to read candle file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse candle data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid candle sequence: {0}")]
    InvalidSequence(String),

    #[error("Simulator cannot {action} while {state}")]
    InvalidState { action: &'static str, state: String },

    #[error("Position state out of sync: simulator positioned = {simulator}, bot positioned = {bot}")]
    PositionMismatch { simulator: bool, bot: bool },

    #[error("Unsupported candle interval: {0}")]
    InvalidInterval(String),

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),

    #[error("Historical data for the requested range is incomplete or missing.")]
    DataUnavailable,
}

impl From<indicatif::style::TemplateError> for BacktestError {
    fn from(error: indicatif::style::TemplateError) -> Self {
        BacktestError::ProgressBarTemplate(error.to_string())
    }
}
