//! # Crypgo Live Engine
//!
//! Runs a bot against a live market, one decision cycle per polling interval.
//!
//! ## Architectural Principles
//!
//! - **Ports, not vendors:** the engine never talks to an exchange or a database
//!   directly. Market data, order placement and persistence all go through the
//!   async traits in [`ports`], so a paper run and a real run share one code path.
//! - **Validate before sending:** every order passes the [`executor::OrderValidator`]
//!   first. A rejected order is logged and skipped, and the bot keeps its state.
//! - **State follows fills:** the bot only transitions after the gateway accepted
//!   the order, and it is persisted immediately afterwards.
//!
//! ## Public API
//!
//! - `TradingCycle`: one fetch, decide, validate, execute pass.
//! - `run_bot`: the polling loop with a `watch` stop signal.
//! - `start_bot` / `stop_bot`: status changes on stored bots.
//! - `memory`: in-memory collaborators for paper runs and tests.

pub mod cycle;
pub mod error;
pub mod memory;
pub mod ports;
pub mod runner;

pub use cycle::{CycleOutcome, CyclePorts, TradingCycle, MAX_WINDOW};
pub use error::EngineError;
pub use memory::{InMemoryBotRepository, InMemoryDecisionLog, InMemoryMarketData, PlacedOrder, RecordingOrderGateway};
pub use ports::{BotRepository, DecisionLogRepository, MarketDataSource, OrderGateway, OrderReceipt};
pub use runner::{run_bot, start_bot, stop_bot};
