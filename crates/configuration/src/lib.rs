use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    BacktestSettings, BreakoutParams, Config, LiveSettings, LoggingSettings, MovingAverageParams,
    RsiParams, StrategyConfig,
};

/// Prefix for environment overrides, e.g. `CRYPGO__BACKTEST__TRADING_FEES=0.075`.
pub const ENV_PREFIX: &str = "CRYPGO";

/// Loads the application configuration.
///
/// Sources are layered in order: the TOML file at `path` (defaults to `config.toml`
/// and is optional), then `CRYPGO__`-prefixed environment variables. Every section has
/// defaults, so an empty environment still yields a usable `Config`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let (file, required) = match path {
        Some(p) => (p, true),
        None => (Path::new("config.toml"), false),
    };

    let builder = config::Config::builder()
        .add_source(config::File::from(file).required(required))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(strategy = %config.strategy.id(), symbol = %config.backtest.symbol, "Configuration loaded");
    Ok(config)
}

/// Parses a configuration from a TOML string. Environment variables are not consulted.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}
